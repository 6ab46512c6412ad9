use std::io::{IsTerminal, Write};
use std::path::Path;

use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use serde::Serialize;

use crate::pipeline::{AssessmentResult, BatchSummary, EntityOutcome};
use crate::scoring::{PopulationStats, SchedulingDecision};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score with three decimals ("0.680")
pub fn format_score(score: f64) -> String {
    format!("{:.3}", score)
}

fn paint_band(name: &str, decision: SchedulingDecision, use_colors: bool) -> String {
    if !use_colors {
        return name.to_string();
    }
    match decision {
        SchedulingDecision::Clear => name.green().to_string(),
        SchedulingDecision::Monitor => name.yellow().to_string(),
        SchedulingDecision::Ground => name.red().bold().to_string(),
    }
}

/// Format outcomes as an aligned table: Index, Band, Score, Aircraft, Decision
/// Failed rows show "ERROR" in the band column and the reason as decision.
/// No headers (minimal format, like `--format tsv` but aligned)
pub fn format_table(outcomes: &[EntityOutcome], use_colors: bool) -> String {
    if outcomes.is_empty() {
        return "No aircraft to assess.".to_string();
    }

    let band_width = outcomes
        .iter()
        .map(|o| match o {
            EntityOutcome::Assessed(r) => r.band.name.chars().count(),
            EntityOutcome::Failed { .. } => "ERROR".len(),
        })
        .max()
        .unwrap_or(0);
    let id_width = outcomes
        .iter()
        .map(|o| o.entity_id().chars().count())
        .max()
        .unwrap_or(0);

    outcomes
        .iter()
        .enumerate()
        .map(|(idx, outcome)| {
            let index_str = format!("{:>3}.", idx + 1);
            let index_str = if use_colors {
                index_str.dimmed().to_string()
            } else {
                index_str
            };

            match outcome {
                EntityOutcome::Assessed(result) => {
                    // Pad before painting so escape codes don't break alignment
                    let band = format!("{:<width$}", result.band.name, width = band_width);
                    format!(
                        "{} {}  {}  {:<id_width$}  {}",
                        index_str,
                        paint_band(&band, result.band.decision, use_colors),
                        format_score(result.score.value()),
                        result.entity_id,
                        result.band.decision,
                        id_width = id_width
                    )
                }
                EntityOutcome::Failed { entity_id, error } => {
                    let band = format!("{:<width$}", "ERROR", width = band_width);
                    let band = if use_colors {
                        band.magenta().to_string()
                    } else {
                        band
                    };
                    format!(
                        "{} {}  {:>5}  {:<id_width$}  {}",
                        index_str,
                        band,
                        "-",
                        entity_id,
                        error,
                        id_width = id_width
                    )
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format outcomes as tab-separated values for scripting
/// Columns: entity_id, status, score, band, decision (no headers, no colors)
pub fn format_tsv(outcomes: &[EntityOutcome]) -> String {
    outcomes
        .iter()
        .map(|outcome| match outcome {
            EntityOutcome::Assessed(r) => format!(
                "{}\tok\t{}\t{}\t{}",
                r.entity_id,
                format_score(r.score.value()),
                r.band.name,
                r.band.decision.as_str()
            ),
            EntityOutcome::Failed { entity_id, error } => {
                format!("{}\terror\t\t\t{}", entity_id, error)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format the per-feature contributions behind one score (verbose mode)
pub fn format_breakdown(result: &AssessmentResult) -> String {
    let mut lines = vec![format!(
        "{}: {} ({}, {})",
        result.entity_id,
        format_score(result.score.value()),
        result.band.name,
        result.band.decision
    )];
    for c in &result.contributions {
        lines.push(format!(
            "  {:<28} normalized {:.3}  weight {:<6}  share {:.3}",
            c.feature, c.normalized, c.weight, c.share
        ));
    }
    lines.join("\n")
}

/// Format the per-band counts of a batch
pub fn format_summary(summary: &BatchSummary) -> String {
    let bands = summary
        .bands
        .iter()
        .map(|b| format!("{} {}", b.band, b.count))
        .collect::<Vec<_>>()
        .join(", ");
    let mean = summary
        .mean_score
        .map(format_score)
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} aircraft: {} assessed, {} failed | {} | mean score {}",
        summary.total, summary.assessed, summary.failed, bands, mean
    )
}

/// JSON report envelope handed to downstream schedulers.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub generated_at: DateTime<Utc>,
    pub summary: &'a BatchSummary,
    pub outcomes: &'a [EntityOutcome],
}

pub fn format_json(outcomes: &[EntityOutcome], summary: &BatchSummary) -> Result<String> {
    let report = Report {
        generated_at: Utc::now(),
        summary,
        outcomes,
    };
    serde_json::to_string_pretty(&report).context("Failed to serialize report")
}

/// Format population statistics as YAML, ready to paste under `population:`
pub fn format_population(stats: &PopulationStats) -> Result<String> {
    serde_saphyr::to_string(stats).context("Failed to serialize population statistics")
}

/// Write a report to `path` atomically
///
/// The file is either fully written or left untouched.
pub fn write_report(path: &Path, contents: &str) -> Result<()> {
    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;

    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    if !contents.ends_with('\n') {
        file.write_all(b"\n")
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    file.commit()
        .with_context(|| format!("Failed to save report at {}", path.display()))?;
    Ok(())
}
