//! Error types shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading, cleaning, training or evaluating
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Dataset file does not exist
    #[error("Dataset not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// Malformed CSV or schema problem
    #[error("Parse error: {0}")]
    Parse(String),

    /// A time-of-day cell did not match `HH:MM`
    #[error("Invalid time {value:?} in column '{column}' at row {row}: expected HH:MM")]
    TimeParse {
        column: String,
        row: usize,
        value: String,
    },

    /// Shape or type mismatch when fitting a model
    #[error("Training error: {0}")]
    Training(String),

    /// Referenced column is absent from the dataset
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Value was not seen when the encoding table was fitted
    #[error("Unknown category {value:?} in column '{column}'")]
    UnknownCategory { column: String, value: String },

    /// Classification metric requested for a regression model
    #[error("Metric '{0}' scores classifiers; regression models accept r2, mae or mse")]
    MetricTaskMismatch(String),

    /// Metric inputs are empty or misaligned
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
