//! Turnout Trainer - participant-count regression pipelines
//!
//! Loads a CSV dataset, removes duplicates, converts wall-clock times,
//! label-encodes a categorical column, splits, fits a random forest and
//! scores it on the held-out rows.

pub mod cart;
pub mod cleaner;
pub mod config;
pub mod deterministic;
pub mod encoder;
pub mod evaluator;
pub mod features;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod trainer;

use std::path::Path;

pub use cleaner::{clean, convert_time, drop_duplicates, TimeColumn, TimeUnit};
pub use config::{CliOverrides, TrainerConfig};
pub use encoder::{EncodingTable, LabelEncoder};
pub use evaluator::{evaluate, evaluate_all, EvaluationReport};
pub use features::select_features;
pub use loader::{load_csv, read_csv};
pub use pipeline::{MetricScore, Pipeline, PipelineReport, PipelineSpec};
pub use splitter::{train_test_split, Split};
pub use trainer::{ForestConfig, ForestTrainer};

/// Run a named preset (`sessions` or `participation`) on a CSV file
pub fn run_preset(name: &str, path: &Path) -> turnout_core::Result<PipelineReport> {
    Pipeline::new(PipelineSpec::preset(name)?).run(path)
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
