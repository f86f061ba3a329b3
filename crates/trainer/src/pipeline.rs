//! End-to-end pipelines
//!
//! A [`PipelineSpec`] names the columns and hyperparameters of one dataset;
//! [`Pipeline::run`] drives it through load, clean, encode, select, split,
//! train and evaluate exactly once and returns a [`PipelineReport`].

use serde::{Deserialize, Serialize};
use std::path::Path;

use turnout_core::{Dataset, Metric, PipelineError, Result};

use crate::cleaner::{clean, TimeColumn, TimeUnit};
use crate::encoder::{EncodingTable, LabelEncoder};
use crate::evaluator::evaluate_all;
use crate::features::select_features;
use crate::loader::load_csv;
use crate::splitter::{train_test_split, DEFAULT_TEST_FRACTION};
use crate::trainer::{ForestConfig, ForestTrainer};

/// Seed used for the split when none is configured
pub const DEFAULT_SPLIT_SEED: u64 = 42;

/// Column layout and hyperparameters of one pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub name: String,
    /// Numeric column to predict
    pub target: String,
    /// Identifier columns excluded from the features
    pub drop_columns: Vec<String>,
    /// Column label-encoded before training
    pub categorical: String,
    pub time: Option<TimeColumn>,
    pub test_fraction: f64,
    /// Split seed; `None` shuffles from OS entropy
    pub seed: Option<u64>,
    /// Forest hyperparameters; an unset forest seed follows `seed`
    pub forest: ForestConfig,
    pub metrics: Vec<Metric>,
}

impl PipelineSpec {
    /// Driving-school sessions: `Participants, Date, Instructor, Time, Session_Type`
    pub fn sessions() -> Self {
        Self {
            name: "sessions".to_string(),
            target: "Participants".to_string(),
            drop_columns: vec!["Date".to_string(), "Instructor".to_string()],
            categorical: "Session_Type".to_string(),
            time: Some(TimeColumn::new("Time", TimeUnit::MinutesSinceMidnight, false)),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: Some(DEFAULT_SPLIT_SEED),
            forest: ForestConfig {
                max_depth: Some(15),
                seed: Some(100),
                ..ForestConfig::default()
            },
            metrics: vec![Metric::R2],
        }
    }

    /// Student participation: `Participants, Time, Weather`
    pub fn participation() -> Self {
        Self {
            name: "participation".to_string(),
            target: "Participants".to_string(),
            drop_columns: Vec::new(),
            categorical: "Weather".to_string(),
            time: Some(TimeColumn::new("Time", TimeUnit::HourOfDay, true)),
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: Some(DEFAULT_SPLIT_SEED),
            forest: ForestConfig::default(),
            metrics: Metric::ALL.to_vec(),
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "sessions" => Ok(Self::sessions()),
            "participation" => Ok(Self::participation()),
            other => Err(PipelineError::Config(format!(
                "Unknown pipeline '{}', expected 'sessions' or 'participation'",
                other
            ))),
        }
    }

    /// Forest configuration with the seed fallback applied
    pub fn effective_forest(&self) -> ForestConfig {
        ForestConfig {
            seed: self.forest.seed.or(self.seed),
            ..self.forest.clone()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "Test fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        if self.metrics.is_empty() {
            return Err(PipelineError::Config("No metrics selected".to_string()));
        }
        if self.categorical == self.target {
            return Err(PipelineError::Config(format!(
                "Column '{}' cannot be both target and categorical feature",
                self.target
            )));
        }
        self.forest.validate()
    }
}

/// One reported metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub value: f64,
}

/// Outcome of a single pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub pipeline: String,
    pub rows_loaded: usize,
    pub rows_after_cleaning: usize,
    pub duplicates_removed: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    pub encoding: EncodingTable,
    pub scores: Vec<MetricScore>,
    /// `(feature, importance)`, most important first
    pub feature_importances: Vec<(String, f64)>,
    pub oob_score: Option<f64>,
}

impl PipelineReport {
    pub fn score(&self, metric: Metric) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.metric == metric)
            .map(|s| s.value)
    }

    /// One `<label>: <value>` line per reported metric
    pub fn score_lines(&self) -> Vec<String> {
        self.scores
            .iter()
            .map(|s| format!("{}: {}", s.metric.label(), s.value))
            .collect()
    }
}

/// Runs a [`PipelineSpec`]
pub struct Pipeline {
    spec: PipelineSpec,
}

impl Pipeline {
    pub fn new(spec: PipelineSpec) -> Self {
        Self { spec }
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Load the CSV at `path` and run every stage on it
    pub fn run<P: AsRef<Path>>(&self, path: P) -> Result<PipelineReport> {
        let dataset = load_csv(path)?;
        self.run_dataset(&dataset)
    }

    /// Run every stage after loading
    pub fn run_dataset(&self, dataset: &Dataset) -> Result<PipelineReport> {
        let spec = &self.spec;
        spec.validate()?;
        tracing::info!("Running '{}' pipeline on {} rows", spec.name, dataset.len());

        let cleaned = clean(dataset, spec.time.as_ref())?;
        let duplicates_removed = dataset.len() - cleaned.len();
        tracing::info!(
            "Cleaned dataset: {} rows ({} duplicates removed)",
            cleaned.len(),
            duplicates_removed
        );

        let (encoded, encoding) = LabelEncoder::fit_transform(&cleaned, &spec.categorical)?;
        tracing::info!(
            "Encoded '{}' into {} categories",
            spec.categorical,
            encoding.len()
        );

        let (x, y) = select_features(&encoded, &spec.target, &spec.drop_columns)?;
        tracing::debug!("Features: {:?}", x.columns());

        let split = train_test_split(&x, &y, spec.test_fraction, spec.seed)?;
        tracing::info!(
            "Split: {} training rows, {} evaluation rows",
            split.x_train.len(),
            split.x_test.len()
        );

        let model = ForestTrainer::new(spec.effective_forest()).fit(&split.x_train, &split.y_train)?;
        let evaluation = evaluate_all(&model, &split.x_test, &split.y_test)?;

        let scores = spec
            .metrics
            .iter()
            .map(|&metric| MetricScore {
                metric,
                value: evaluation.score(metric),
            })
            .collect();

        let feature_importances = model
            .feature_importance_ranking()
            .into_iter()
            .map(|(name, importance)| (name.to_string(), importance))
            .collect();

        Ok(PipelineReport {
            pipeline: spec.name.clone(),
            rows_loaded: dataset.len(),
            rows_after_cleaning: cleaned.len(),
            duplicates_removed,
            train_rows: split.x_train.len(),
            test_rows: split.x_test.len(),
            encoding,
            scores,
            feature_importances,
            oob_score: model.oob_score(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use turnout_core::Value;

    fn participation_rows(n: usize) -> Dataset {
        let weather = ["Sunny", "Rainy", "Cloudy"];
        let rows = (0..n)
            .map(|i| {
                let hour = 8 + (i % 10);
                let w = weather[i % 3];
                let participants = 10 + hour * 2 + if w == "Rainy" { 0 } else { 5 } + i % 2;
                vec![
                    Value::Int(participants as i64),
                    Value::from(format!("{:02}:{:02}", hour, (i * 7) % 60).as_str()),
                    Value::from(w),
                ]
            })
            .collect();
        Dataset::from_rows(
            vec!["Participants".into(), "Time".into(), "Weather".into()],
            rows,
        )
        .unwrap()
    }

    #[test]
    fn test_presets() {
        let sessions = PipelineSpec::preset("sessions").unwrap();
        assert_eq!(sessions.forest.max_depth, Some(15));
        assert_eq!(sessions.effective_forest().seed, Some(100));
        assert_eq!(sessions.metrics, vec![Metric::R2]);
        assert!(!sessions.time.as_ref().unwrap().required);

        let participation = PipelineSpec::preset("participation").unwrap();
        assert_eq!(participation.effective_forest().seed, Some(DEFAULT_SPLIT_SEED));
        assert_eq!(participation.metrics.len(), 3);
        assert!(participation.time.as_ref().unwrap().required);

        assert!(matches!(
            PipelineSpec::preset("housing"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_run_participation() {
        let mut spec = PipelineSpec::participation();
        spec.forest.n_trees = 20;
        let report = Pipeline::new(spec).run_dataset(&participation_rows(60)).unwrap();

        assert_eq!(report.rows_loaded, 60);
        assert_eq!(report.train_rows + report.test_rows, report.rows_after_cleaning);
        assert_eq!(report.test_rows, 12);
        assert_eq!(report.encoding.len(), 3);
        assert_eq!(report.scores.len(), 3);
        assert!(report.score(Metric::MeanAbsoluteError).unwrap() >= 0.0);
        assert_eq!(report.feature_importances.len(), 2);

        let lines = report.score_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Mean Absolute Error: "));
        assert!(lines[1].starts_with("Mean Squared Error: "));
        assert!(lines[2].starts_with("R2 Score: "));
        let mse = report.score(Metric::MeanSquaredError).unwrap();
        assert_eq!(lines[1], format!("Mean Squared Error: {}", mse));
    }

    #[test]
    fn test_seeded_runs_match() {
        let mut spec = PipelineSpec::participation();
        spec.forest.n_trees = 10;
        let data = participation_rows(40);
        let a = Pipeline::new(spec.clone()).run_dataset(&data).unwrap();
        let b = Pipeline::new(spec).run_dataset(&data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_spec() {
        let mut spec = PipelineSpec::participation();
        spec.metrics.clear();
        assert!(matches!(
            Pipeline::new(spec).run_dataset(&participation_rows(10)),
            Err(PipelineError::Config(_))
        ));

        let mut spec = PipelineSpec::participation();
        spec.test_fraction = 1.5;
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_missing_required_time_column() {
        let data = Dataset::from_rows(
            vec!["Participants".into(), "Weather".into()],
            vec![vec![Value::Int(3), "Sunny".into()]],
        )
        .unwrap();
        let err = Pipeline::new(PipelineSpec::participation())
            .run_dataset(&data)
            .unwrap_err();
        assert!(matches!(err, PipelineError::ColumnNotFound(c) if c == "Time"));
    }
}
