//! Random forest trainer
//!
//! Grows bootstrap-aggregated CART regression trees in parallel. Tree `i`
//! draws all of its randomness from `seed + i`, so a seeded forest is
//! identical no matter how rayon schedules the work.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use turnout_core::{r2_score, Dataset, PipelineError, RandomForest, Result};

use crate::cart::{BuiltTree, CartBuilder, TreeConfig};
use crate::deterministic::{resolve_seed, tree_seed};

/// Random forest hyperparameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// `None` grows every tree until its leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split; `None` considers all of them
    pub max_features: Option<usize>,
    /// Train each tree on a bootstrap sample rather than every row
    pub bootstrap: bool,
    /// Compute an out-of-bag R² (requires `bootstrap`)
    pub oob_score: bool,
    /// `None` draws a fresh seed per fit
    pub seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            bootstrap: true,
            oob_score: false,
            seed: None,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        let problem = if self.n_trees == 0 {
            Some("n_trees must be at least 1")
        } else if self.min_samples_leaf == 0 {
            Some("min_samples_leaf must be at least 1")
        } else if self.min_samples_split < 2 {
            Some("min_samples_split must be at least 2")
        } else if self.max_features == Some(0) {
            Some("max_features must be at least 1")
        } else if self.max_depth == Some(0) {
            Some("max_depth must be at least 1")
        } else {
            None
        };

        match problem {
            Some(msg) => Err(PipelineError::Training(msg.to_string())),
            None => Ok(()),
        }
    }

    fn tree_config(&self) -> TreeConfig {
        TreeConfig {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            min_samples_leaf: self.min_samples_leaf,
            max_features: self.max_features,
        }
    }
}

/// Random forest trainer
pub struct ForestTrainer {
    config: ForestConfig,
}

impl ForestTrainer {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Fit a forest on a numeric feature table and aligned targets
    pub fn fit(&self, x: &Dataset, y: &[f64]) -> Result<RandomForest> {
        self.config.validate()?;

        if x.len() != y.len() {
            return Err(PipelineError::Training(format!(
                "Feature table has {} rows but target has {}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(PipelineError::Training("Training set is empty".to_string()));
        }
        if x.width() == 0 {
            return Err(PipelineError::Training("No feature columns".to_string()));
        }
        if let Some(row) = y.iter().position(|v| !v.is_finite()) {
            return Err(PipelineError::Training(format!(
                "Target row {} is not finite",
                row
            )));
        }

        let features = x.to_matrix()?;
        let n_samples = features.len();
        let base_seed = resolve_seed(self.config.seed);

        tracing::info!(
            "Training {} trees on {} samples with {} features",
            self.config.n_trees,
            n_samples,
            x.width()
        );
        tracing::debug!("Forest base seed: {}", base_seed);

        let builder = CartBuilder::new(&features, y, self.config.tree_config());
        let fitted: Vec<(BuiltTree, Vec<usize>)> = (0..self.config.n_trees)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = StdRng::seed_from_u64(tree_seed(base_seed, tree_idx));
                let samples: Vec<usize> = if self.config.bootstrap {
                    (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect()
                } else {
                    (0..n_samples).collect()
                };
                let built = builder.build(&samples, &mut rng);
                (built, samples)
            })
            .collect();

        let importances = aggregate_importances(&fitted, x.width());

        let oob_score = if self.config.oob_score {
            if self.config.bootstrap {
                out_of_bag_r2(&fitted, &features, y)
            } else {
                tracing::warn!("Out-of-bag score requested without bootstrap; skipping");
                None
            }
        } else {
            None
        };

        let trees = fitted.into_iter().map(|(built, _)| built.tree).collect();
        Ok(RandomForest::new(
            trees,
            x.columns().to_vec(),
            importances,
            oob_score,
        ))
    }
}

/// Per-tree importances normalized to 1, averaged, then renormalized
fn aggregate_importances(fitted: &[(BuiltTree, Vec<usize>)], n_features: usize) -> Vec<f64> {
    let mut totals = vec![0.0; n_features];

    for (built, _) in fitted {
        let sum: f64 = built.importances.iter().sum();
        if sum > 0.0 {
            for (total, imp) in totals.iter_mut().zip(&built.importances) {
                *total += imp / sum;
            }
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        for total in &mut totals {
            *total /= sum;
        }
    }

    totals
}

/// R² of each row predicted only by trees that never saw it
fn out_of_bag_r2(
    fitted: &[(BuiltTree, Vec<usize>)],
    features: &[Vec<f64>],
    targets: &[f64],
) -> Option<f64> {
    let n = targets.len();
    let mut sums = vec![0.0; n];
    let mut counts = vec![0usize; n];

    for (built, samples) in fitted {
        let mut in_bag = vec![false; n];
        for &idx in samples {
            in_bag[idx] = true;
        }
        for (row, _) in in_bag.iter().enumerate().filter(|(_, &seen)| !seen) {
            sums[row] += built.tree.evaluate(&features[row]);
            counts[row] += 1;
        }
    }

    let (y_true, y_pred): (Vec<f64>, Vec<f64>) = (0..n)
        .filter(|&row| counts[row] > 0)
        .map(|row| (targets[row], sums[row] / counts[row] as f64))
        .unzip();

    if y_true.len() < n {
        tracing::warn!(
            "{} of {} rows were in every bootstrap sample; OOB score uses the rest",
            n - y_true.len(),
            n
        );
    }

    r2_score(&y_true, &y_pred).ok()
}
