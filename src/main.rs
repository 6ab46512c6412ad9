use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fleet_risk::config::Config;
use fleet_risk::pipeline::{assess_concurrent, BatchSummary, RiskModel};
use fleet_risk::scoring::PopulationStats;

const EXIT_SUCCESS: i32 = 0;
const EXIT_DATA: i32 = 2;
const EXIT_PARTIAL: i32 = 3;
const EXIT_CONFIG: i32 = 4;

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum OutputFormat {
    /// Aligned, colored when stdout is a terminal
    #[default]
    Table,
    /// Tab-separated, for scripting
    Tsv,
    /// Full report with normalized features and contributions
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Score every aircraft in a CSV and print its risk band
    Assess {
        /// CSV with one row per aircraft
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Number of parallel scoring workers (defaults to available cores)
        #[arg(short, long)]
        jobs: Option<usize>,
    },
    /// Print min/max per feature computed from a CSV, as YAML
    Stats {
        /// CSV with one row per aircraft
        input: PathBuf,
    },
    /// Validate the configuration and print the effective scoring setup
    Check,
}

impl Commands {
    /// `stats` only reads the ingest section, so scoring errors must not block it
    fn uses_scoring(&self) -> bool {
        !matches!(self, Commands::Stats { .. })
    }
}

#[derive(Parser, Debug)]
#[command(name = "fleet-risk")]
#[command(about = "Aircraft maintenance risk scoring CLI", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging and per-feature score breakdowns
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/fleet-risk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let start_time = Instant::now();

    let config = match fleet_risk::config::load_config(cli.config.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };

    let level = if cli.verbose {
        Some("debug")
    } else {
        config.log_level.as_deref()
    };
    if let Err(e) = fleet_risk::telemetry::init(level) {
        eprintln!("Config error: {}", e);
        std::process::exit(EXIT_CONFIG);
    }

    // Validate before touching any data
    if cli.command.uses_scoring() {
        validate_or_exit(&config);
    }

    let code = match cli.command {
        Commands::Check => run_check(&config),
        Commands::Stats { input } => run_stats(&config, &input),
        Commands::Assess {
            input,
            format,
            output,
            jobs,
        } => run_assess(&config, &input, format, output, jobs, cli.verbose).await,
    };

    if cli.verbose {
        eprintln!(
            "Done in {}",
            humantime::format_duration(std::time::Duration::from_millis(
                start_time.elapsed().as_millis() as u64
            ))
        );
    }

    std::process::exit(code);
}

fn validate_or_exit(config: &Config) {
    let mut errors = Vec::new();
    if let Err(e) = fleet_risk::scoring::validate_scoring(&config.scoring) {
        errors.extend(e);
    }
    if let Some(population) = &config.population {
        if let Err(e) = fleet_risk::scoring::validate_population(population) {
            errors.extend(e);
        }
    }

    if !errors.is_empty() {
        eprintln!("Scoring config errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        std::process::exit(EXIT_CONFIG);
    }
}

fn run_check(config: &Config) -> i32 {
    match serde_saphyr::to_string(&config.scoring) {
        Ok(yaml) => {
            println!("Configuration OK");
            println!("{}", yaml.trim_end());
            if config.population.is_none() {
                println!("population: computed from input");
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to render configuration: {}", e);
            EXIT_CONFIG
        }
    }
}

fn run_stats(config: &Config, input: &Path) -> i32 {
    let records = match fleet_risk::ingest::load_feature_records(input, &config.ingest) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Input error: {}", e);
            return EXIT_DATA;
        }
    };

    let stats = PopulationStats::from_population(records.iter().map(|r| &r.features));
    match fleet_risk::output::format_population(&stats) {
        Ok(yaml) => {
            println!("{}", yaml.trim_end());
            EXIT_SUCCESS
        }
        Err(e) => {
            eprintln!("{:#}", e);
            EXIT_DATA
        }
    }
}

async fn run_assess(
    config: &Config,
    input: &Path,
    format: OutputFormat,
    output: Option<PathBuf>,
    jobs: Option<usize>,
    verbose: bool,
) -> i32 {
    let records = match fleet_risk::ingest::load_feature_records(input, &config.ingest) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Input error: {}", e);
            return EXIT_DATA;
        }
    };
    tracing::info!(aircraft = records.len(), path = %input.display(), "loaded feature records");

    // Externally supplied snapshot wins over the input population
    let stats = match &config.population {
        Some(population) => match PopulationStats::new(population.clone()) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Config error: {}", e);
                return EXIT_CONFIG;
            }
        },
        None => PopulationStats::from_population(records.iter().map(|r| &r.features)),
    };

    let model = match RiskModel::from_config(&config.scoring, stats) {
        Ok(m) => Arc::new(m),
        Err(e) => {
            eprintln!("Config error: {}", e);
            return EXIT_CONFIG;
        }
    };
    tracing::info!(
        weighted = model.weights().len(),
        with_stats = model.stats().len(),
        bands = model.bands().len(),
        "risk model ready"
    );

    let parallelism = jobs.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });

    let outcomes = match assess_concurrent(records, Arc::clone(&model), parallelism).await {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Assessment failed: {:#}", e);
            return EXIT_DATA;
        }
    };
    let summary = BatchSummary::from_outcomes(&outcomes, model.bands());

    let rendered = match format {
        OutputFormat::Table => {
            let use_colors = output.is_none() && fleet_risk::output::should_use_colors();
            let mut text = fleet_risk::output::format_table(&outcomes, use_colors);
            if verbose {
                for result in outcomes.iter().filter_map(|o| o.result()) {
                    text.push_str("\n\n");
                    text.push_str(&fleet_risk::output::format_breakdown(result));
                }
            }
            text
        }
        OutputFormat::Tsv => fleet_risk::output::format_tsv(&outcomes),
        OutputFormat::Json => match fleet_risk::output::format_json(&outcomes, &summary) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("{:#}", e);
                return EXIT_DATA;
            }
        },
    };

    match output {
        Some(path) => {
            if let Err(e) = fleet_risk::output::write_report(&path, &rendered) {
                eprintln!("{:#}", e);
                return EXIT_DATA;
            }
            eprintln!("Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    eprintln!("{}", fleet_risk::output::format_summary(&summary));

    if summary.failed > 0 {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}
