//! Turnout trainer CLI
//!
//! Runs one of the participant-count pipelines and prints its scores.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use turnout_core::Metric;
use turnout_trainer::{CliOverrides, Pipeline, PipelineSpec, TrainerConfig};

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Preset {
    /// Driving-school sessions (Date, Instructor, Time, Session_Type)
    Sessions,
    /// Student participation (Time, Weather)
    Participation,
}

impl Preset {
    fn spec(self) -> PipelineSpec {
        match self {
            Preset::Sessions => PipelineSpec::sessions(),
            Preset::Participation => PipelineSpec::participation(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "turnout-train")]
#[command(author = "Turnout Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and score participant-count random forests", long_about = None)]
struct Args {
    /// Pipeline to run
    #[arg(value_enum)]
    pipeline: Preset,

    /// Input CSV dataset path (overrides config and TURNOUT_DATASET)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the train/evaluation split
    #[arg(long, conflicts_with = "unseeded")]
    seed: Option<u64>,

    /// Shuffle the split from OS entropy
    #[arg(long)]
    unseeded: bool,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,

    /// Number of trees
    #[arg(long)]
    trees: Option<usize>,

    /// Maximum tree depth
    #[arg(long)]
    max_depth: Option<usize>,

    /// Metric to report (r2, mae, mse); repeatable
    #[arg(long = "metric")]
    metrics: Vec<String>,

    /// Compute the out-of-bag R²
    #[arg(long)]
    oob: bool,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            dataset: self.input.clone(),
            seed: self.seed,
            unseeded: self.unseeded,
            test_fraction: self.test_fraction,
            n_trees: self.trees,
            max_depth: self.max_depth,
            metrics: self.metrics.clone(),
            oob_score: self.oob,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => TrainerConfig::from_file(path).context("Failed to load configuration")?,
        None => TrainerConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid TURNOUT_* environment variable")?;
    config.apply_overrides(&args.overrides());

    // Setup logging on stderr; RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_directive(args.verbose)))
        .with_context(|| format!("Invalid log level '{}'", config.logging.level))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Turnout Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("═══════════════════════════════════════════");
    if let Some(path) = &args.config {
        info!("Configuration: {}", path.display());
    }

    config.validate().context("Invalid configuration")?;

    let mut spec = args.pipeline.spec();
    config
        .apply_to(&mut spec)
        .context("Failed to apply configuration")?;

    let dataset_path = config
        .dataset_path()
        .map(PathBuf::from)
        .context("No dataset given; pass --input, set [dataset] path or TURNOUT_DATASET")?;

    info!("Pipeline: {}", spec.name);
    info!("  Dataset: {}", dataset_path.display());
    info!("  Test fraction: {}", spec.test_fraction);
    match spec.seed {
        Some(seed) => info!("  Split seed: {}", seed),
        None => info!("  Split seed: <entropy>"),
    }
    info!("  Trees: {}", spec.forest.n_trees);
    match spec.forest.max_depth {
        Some(depth) => info!("  Max depth: {}", depth),
        None => info!("  Max depth: unbounded"),
    }
    info!(
        "  Metrics: {}",
        spec.metrics
            .iter()
            .map(Metric::key)
            .collect::<Vec<_>>()
            .join(", ")
    );

    info!("═══════════════════════════════════════════");
    let report = Pipeline::new(spec)
        .run(&dataset_path)
        .with_context(|| format!("Pipeline failed on {}", dataset_path.display()))?;

    info!("Feature importances:");
    for (feature, importance) in &report.feature_importances {
        info!("  {}: {:.4}", feature, importance);
    }
    if let Some(oob) = report.oob_score {
        info!("Out-of-bag R2: {:.4}", oob);
    }
    info!("✓ Pipeline completed successfully");

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        for line in report.score_lines() {
            println!("{}", line);
        }
    }

    Ok(())
}
