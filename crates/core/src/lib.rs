//! Turnout Core
//!
//! Shared types for the participant-count regression pipelines.
//!
//! Modules:
//! - `table`: In-memory tabular dataset and scalar cell values
//! - `tree`: Flat-array regression trees
//! - `forest`: Fitted random-forest regressor
//! - `metrics`: Regression metrics (R², MAE, MSE)
//! - `errors`: Error taxonomy shared by every pipeline stage

pub mod errors;
pub mod forest;
pub mod metrics;
pub mod table;
pub mod tree;

pub use errors::{PipelineError, Result};
pub use forest::RandomForest;
pub use metrics::{mean_absolute_error, mean_squared_error, r2_score, Metric};
pub use table::{Dataset, Value};
pub use tree::{Node, Tree};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
