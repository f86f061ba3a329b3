//! Fitted random-forest regressor
//!
//! Holds the trees produced by the trainer and averages their predictions.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, Result};
use crate::table::Dataset;
use crate::tree::Tree;

/// Random forest regression model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForest {
    trees: Vec<Tree>,
    feature_names: Vec<String>,
    feature_importances: Vec<f64>,
    oob_score: Option<f64>,
}

impl RandomForest {
    pub fn new(
        trees: Vec<Tree>,
        feature_names: Vec<String>,
        feature_importances: Vec<f64>,
        oob_score: Option<f64>,
    ) -> Self {
        Self {
            trees,
            feature_names,
            feature_importances,
            oob_score,
        }
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Feature columns the model was fitted on, in matrix order
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Impurity-based importances, normalized to sum to 1
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    /// Out-of-bag R², when requested at training time
    pub fn oob_score(&self) -> Option<f64> {
        self.oob_score
    }

    /// Predict a single feature vector (mean over trees)
    pub fn predict_one(&self, features: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }

        let sum: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        sum / self.trees.len() as f64
    }

    /// Predict a batch of feature vectors
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.par_iter().map(|row| self.predict_one(row)).collect()
    }

    /// Predict every row of a feature table.
    ///
    /// The table must carry exactly the fitted feature columns, in order.
    pub fn predict_dataset(&self, features: &Dataset) -> Result<Vec<f64>> {
        if features.columns() != self.feature_names.as_slice() {
            return Err(PipelineError::Training(format!(
                "Feature columns {:?} do not match fitted columns {:?}",
                features.columns(),
                self.feature_names
            )));
        }

        let matrix = features.to_matrix()?;
        Ok(self.predict(&matrix))
    }

    /// Feature names with importances, most important first
    pub fn feature_importance_ranking(&self) -> Vec<(&str, f64)> {
        let mut ranking: Vec<(&str, f64)> = self
            .feature_names
            .iter()
            .zip(self.feature_importances.iter())
            .map(|(n, &i)| (n.as_str(), i))
            .collect();

        ranking.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranking
    }
}
