//! Train/evaluation splitting
//!
//! Rows are shuffled and the first `round(test_fraction * n)` go to the
//! evaluation subset. With `seed = None` the shuffle is drawn from OS
//! entropy, so repeated runs see different splits; pass a seed for
//! reproducible ones.

use rand::seq::SliceRandom;

use turnout_core::{Dataset, PipelineError, Result};

use crate::deterministic::rng_from_seed;

/// Held-out fraction used by both pipelines
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Row-aligned training and evaluation subsets
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Dataset,
    pub x_test: Dataset,
    pub y_train: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Number of evaluation rows for `n` rows
pub fn test_size(n: usize, test_fraction: f64) -> usize {
    ((n as f64 * test_fraction).round() as usize).min(n)
}

/// Shuffle rows and partition them into training and evaluation subsets
pub fn train_test_split(
    x: &Dataset,
    y: &[f64],
    test_fraction: f64,
    seed: Option<u64>,
) -> Result<Split> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::Config(format!(
            "Test fraction must be in (0, 1), got {}",
            test_fraction
        )));
    }
    if x.len() != y.len() {
        return Err(PipelineError::Training(format!(
            "Feature table has {} rows but target has {}",
            x.len(),
            y.len()
        )));
    }

    let mut indices: Vec<usize> = (0..x.len()).collect();
    let mut rng = rng_from_seed(seed);
    indices.shuffle(&mut rng);

    let n_test = test_size(x.len(), test_fraction);
    let (test_idx, train_idx) = indices.split_at(n_test);

    let split = Split {
        x_train: x.select_rows(train_idx),
        x_test: x.select_rows(test_idx),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    };

    tracing::debug!(
        "Dataset split: {} training, {} evaluation (seed {:?})",
        split.x_train.len(),
        split.x_test.len(),
        seed
    );

    Ok(split)
}
