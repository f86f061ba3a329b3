//! Held-out evaluation of a fitted forest

use serde::{Deserialize, Serialize};

use turnout_core::{
    mean_absolute_error, mean_squared_error, r2_score, Dataset, Metric, RandomForest, Result,
};

/// Every regression metric for one evaluation subset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub mae: f64,
    pub mse: f64,
    pub r2: f64,
}

impl EvaluationReport {
    pub fn score(&self, metric: Metric) -> f64 {
        match metric {
            Metric::MeanAbsoluteError => self.mae,
            Metric::MeanSquaredError => self.mse,
            Metric::R2 => self.r2,
        }
    }
}

/// Score precomputed predictions with every metric
pub fn score_predictions(y_true: &[f64], y_pred: &[f64]) -> Result<EvaluationReport> {
    Ok(EvaluationReport {
        mae: mean_absolute_error(y_true, y_pred)?,
        mse: mean_squared_error(y_true, y_pred)?,
        r2: r2_score(y_true, y_pred)?,
    })
}

/// Predict `x_test` and compute a single metric
pub fn evaluate(
    model: &RandomForest,
    x_test: &Dataset,
    y_test: &[f64],
    metric: Metric,
) -> Result<f64> {
    let predictions = model.predict_dataset(x_test)?;
    let score = metric.compute(y_test, &predictions)?;
    tracing::debug!("{} on {} rows: {}", metric.label(), y_test.len(), score);
    Ok(score)
}

/// Predict `x_test` once and compute every metric
pub fn evaluate_all(
    model: &RandomForest,
    x_test: &Dataset,
    y_test: &[f64],
) -> Result<EvaluationReport> {
    let predictions = model.predict_dataset(x_test)?;
    score_predictions(y_test, &predictions)
}
