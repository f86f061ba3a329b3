//! Regression metrics
//!
//! Only regression scores are offered. Asking for a classification score
//! such as accuracy is reported as [`PipelineError::MetricTaskMismatch`]
//! rather than silently mapped to something else.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{PipelineError, Result};

/// Scalar score comparing predictions against true targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    #[serde(rename = "r2")]
    R2,
    #[serde(rename = "mae")]
    MeanAbsoluteError,
    #[serde(rename = "mse")]
    MeanSquaredError,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::MeanAbsoluteError,
        Metric::MeanSquaredError,
        Metric::R2,
    ];

    /// Short identifier used in configs and on the command line
    pub fn key(&self) -> &'static str {
        match self {
            Metric::R2 => "r2",
            Metric::MeanAbsoluteError => "mae",
            Metric::MeanSquaredError => "mse",
        }
    }

    /// Human-readable name used in reports
    pub fn label(&self) -> &'static str {
        match self {
            Metric::R2 => "R2 Score",
            Metric::MeanAbsoluteError => "Mean Absolute Error",
            Metric::MeanSquaredError => "Mean Squared Error",
        }
    }

    pub fn compute(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
        match self {
            Metric::R2 => r2_score(y_true, y_pred),
            Metric::MeanAbsoluteError => mean_absolute_error(y_true, y_pred),
            Metric::MeanSquaredError => mean_squared_error(y_true, y_pred),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r2" | "r2_score" | "r_squared" => Ok(Metric::R2),
            "mae" | "mean_absolute_error" => Ok(Metric::MeanAbsoluteError),
            "mse" | "mean_squared_error" => Ok(Metric::MeanSquaredError),
            "accuracy" | "accuracy_score" | "precision" | "recall" | "f1" => {
                Err(PipelineError::MetricTaskMismatch(s.trim().to_string()))
            }
            other => Err(PipelineError::Config(format!("Unknown metric: {}", other))),
        }
    }
}

fn check_inputs(y_true: &[f64], y_pred: &[f64]) -> Result<()> {
    if y_true.len() != y_pred.len() {
        return Err(PipelineError::Evaluation(format!(
            "{} targets but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.is_empty() {
        return Err(PipelineError::Evaluation("Nothing to evaluate".to_string()));
    }
    Ok(())
}

/// Mean of `|y - ŷ|`
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    Ok(sum / y_true.len() as f64)
}

/// Mean of `(y - ŷ)²`
pub fn mean_squared_error(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    Ok(sum / y_true.len() as f64)
}

/// Coefficient of determination.
///
/// Constant targets score 1.0 when predicted exactly and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64> {
    check_inputs(y_true, y_pred)?;

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).powi(2)).sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}
