use super::error::ScoringError;
use super::types::{RiskBand, RiskScore, SchedulingDecision};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One entry of the band configuration: scores up to and including
/// `upper_bound` fall into this band.
///
/// Example YAML:
/// ```yaml
/// bands:
///   - { name: LOW, upper_bound: 0.33, decision: clear }
///   - { name: MEDIUM, upper_bound: 0.66, decision: monitor }
///   - { name: HIGH, upper_bound: 1.0, decision: ground }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BandThreshold {
    pub name: String,
    pub upper_bound: f64,
    pub decision: SchedulingDecision,
}

impl BandThreshold {
    pub fn new(name: impl Into<String>, upper_bound: f64, decision: SchedulingDecision) -> Self {
        Self {
            name: name.into(),
            upper_bound,
            decision,
        }
    }
}

/// Validated, ascending band thresholds.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    bounds: Vec<f64>,
    bands: Vec<RiskBand>,
}

impl BandTable {
    /// Validate thresholds once at configuration load.
    ///
    /// Bounds must be finite and strictly ascending, the last one must reach
    /// 1.0, and names must be non-empty and unique.
    pub fn new(thresholds: Vec<BandThreshold>) -> Result<Self, ScoringError> {
        check_thresholds(&thresholds).map_err(|reason| ScoringError::InvalidBandConfiguration {
            reason,
        })?;

        let bounds = thresholds.iter().map(|t| t.upper_bound).collect();
        let bands = thresholds
            .into_iter()
            .enumerate()
            .map(|(rank, t)| RiskBand {
                name: t.name,
                rank,
                decision: t.decision,
            })
            .collect();
        Ok(Self { bounds, bands })
    }

    pub fn bands(&self) -> impl Iterator<Item = &RiskBand> {
        self.bands.iter()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

fn check_thresholds(thresholds: &[BandThreshold]) -> Result<(), String> {
    let Some(last) = thresholds.last() else {
        return Err("at least one band is required".to_string());
    };

    let mut seen = HashSet::new();
    let mut previous: Option<f64> = None;
    for (i, t) in thresholds.iter().enumerate() {
        if t.name.trim().is_empty() {
            return Err(format!("band {} has an empty name", i));
        }
        if !seen.insert(t.name.as_str()) {
            return Err(format!("band name '{}' is used more than once", t.name));
        }
        if !t.upper_bound.is_finite() {
            return Err(format!("band '{}' has a non-finite upper bound", t.name));
        }
        if let Some(prev) = previous {
            if t.upper_bound <= prev {
                return Err(format!(
                    "upper bounds must be strictly ascending: '{}' ({}) follows {}",
                    t.name, t.upper_bound, prev
                ));
            }
        }
        previous = Some(t.upper_bound);
    }

    if last.upper_bound < 1.0 {
        return Err(format!(
            "last band '{}' ends at {}, scores up to 1.0 must be covered",
            last.name, last.upper_bound
        ));
    }
    Ok(())
}

/// Return the first band whose upper bound is `>= score`.
///
/// A score exactly on a threshold belongs to the lower band.
pub fn classify<'a>(score: RiskScore, table: &'a BandTable) -> &'a RiskBand {
    let value = score.value();
    // Scores never exceed 1.0 and the last bound is at least 1.0
    let index = table
        .bounds
        .iter()
        .position(|upper| *upper >= value)
        .unwrap_or(table.bands.len() - 1);
    &table.bands[index]
}
