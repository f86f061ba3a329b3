//! Trainer configuration
//!
//! Settings come from three layers, each overriding the previous one:
//! a TOML file, `TURNOUT_*` environment variables, then command-line flags
//! ([`CliOverrides`]).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use turnout_core::{Metric, PipelineError, Result};

use crate::pipeline::{PipelineSpec, DEFAULT_SPLIT_SEED};
use crate::splitter::DEFAULT_TEST_FRACTION;

/// Log levels accepted by `[logging] level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Complete trainer configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    pub dataset: DatasetConfig,
    pub split: SplitConfig,
    pub forest: ForestOverrides,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV file to train on
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    pub test_fraction: f64,
    pub seed: Option<u64>,
    /// Ignore `seed` and shuffle from OS entropy
    pub unseeded: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            seed: Some(DEFAULT_SPLIT_SEED),
            unseeded: false,
        }
    }
}

impl SplitConfig {
    /// Seed handed to the splitter
    pub fn effective_seed(&self) -> Option<u64> {
        if self.unseeded {
            None
        } else {
            self.seed
        }
    }
}

/// Forest settings; unset fields keep the pipeline preset's value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestOverrides {
    pub n_trees: Option<usize>,
    pub max_depth: Option<usize>,
    pub min_samples_split: Option<usize>,
    pub min_samples_leaf: Option<usize>,
    pub max_features: Option<usize>,
    pub bootstrap: Option<bool>,
    pub oob_score: Option<bool>,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Metric names; empty keeps the preset's metrics
    pub metrics: Vec<String>,
}

impl EvaluationConfig {
    pub fn parsed(&self) -> Result<Vec<Metric>> {
        self.metrics.iter().map(|m| m.parse()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Command-line settings, applied last
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub dataset: Option<PathBuf>,
    pub seed: Option<u64>,
    pub unseeded: bool,
    pub test_fraction: Option<f64>,
    pub n_trees: Option<usize>,
    pub max_depth: Option<usize>,
    pub metrics: Vec<String>,
    pub oob_score: bool,
}

impl TrainerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from: {}", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: TrainerConfig = toml::from_str(&content)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Apply `TURNOUT_*` environment overrides
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("TURNOUT_DATASET") {
            self.dataset.path = Some(PathBuf::from(val));
        }

        if let Some(val) = lookup("TURNOUT_SEED") {
            if val.eq_ignore_ascii_case("none") {
                self.split.unseeded = true;
            } else {
                self.split.seed = Some(parse_env("TURNOUT_SEED", &val)?);
                self.split.unseeded = false;
            }
        }

        if let Some(val) = lookup("TURNOUT_TEST_FRACTION") {
            self.split.test_fraction = parse_env("TURNOUT_TEST_FRACTION", &val)?;
        }

        if let Some(val) = lookup("TURNOUT_LOG_LEVEL") {
            self.logging.level = val;
        }

        Ok(())
    }

    /// Apply command-line flags over file and environment settings
    pub fn apply_overrides(&mut self, cli: &CliOverrides) {
        if let Some(path) = &cli.dataset {
            self.dataset.path = Some(path.clone());
        }
        if let Some(seed) = cli.seed {
            self.split.seed = Some(seed);
            self.split.unseeded = false;
        }
        if cli.unseeded {
            self.split.unseeded = true;
        }
        if let Some(fraction) = cli.test_fraction {
            self.split.test_fraction = fraction;
        }
        if let Some(trees) = cli.n_trees {
            self.forest.n_trees = Some(trees);
        }
        if let Some(depth) = cli.max_depth {
            self.forest.max_depth = Some(depth);
        }
        if !cli.metrics.is_empty() {
            self.evaluation.metrics = cli.metrics.clone();
        }
        if cli.oob_score {
            self.forest.oob_score = Some(true);
        }
    }

    /// Log filter directive; `verbose` forces debug output
    pub fn log_directive(&self, verbose: bool) -> String {
        if verbose {
            "debug".to_string()
        } else {
            self.logging.level.to_ascii_lowercase()
        }
    }

    /// Check the configuration, returning non-fatal warnings
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut warnings = Vec::new();

        let fraction = self.split.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(PipelineError::Config(format!(
                "split.test_fraction must be in (0, 1), got {}",
                fraction
            )));
        }
        if fraction > 0.5 {
            warnings.push(format!(
                "split.test_fraction {} holds out more rows than it trains on",
                fraction
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(PipelineError::Config(format!(
                "Unknown log level '{}'",
                self.logging.level
            )));
        }

        self.evaluation.parsed()?;

        if self.split.unseeded {
            warnings.push("Split is unseeded; scores will vary between runs".to_string());
        }
        if self.forest.n_trees.is_some_and(|n| n < 10) {
            warnings.push("Fewer than 10 trees gives noisy predictions".to_string());
        }
        if self.forest.oob_score == Some(true) && self.forest.bootstrap == Some(false) {
            warnings.push("forest.oob_score has no effect without bootstrap".to_string());
        }

        for warning in &warnings {
            warn!("{}", warning);
        }

        Ok(warnings)
    }

    /// Overlay these settings on a pipeline preset
    pub fn apply_to(&self, spec: &mut PipelineSpec) -> Result<()> {
        spec.test_fraction = self.split.test_fraction;
        spec.seed = self.split.effective_seed();

        let forest = &mut spec.forest;
        let o = &self.forest;
        if let Some(n) = o.n_trees {
            forest.n_trees = n;
        }
        if o.max_depth.is_some() {
            forest.max_depth = o.max_depth;
        }
        if let Some(n) = o.min_samples_split {
            forest.min_samples_split = n;
        }
        if let Some(n) = o.min_samples_leaf {
            forest.min_samples_leaf = n;
        }
        if o.max_features.is_some() {
            forest.max_features = o.max_features;
        }
        if let Some(b) = o.bootstrap {
            forest.bootstrap = b;
        }
        if let Some(b) = o.oob_score {
            forest.oob_score = b;
        }
        if o.seed.is_some() {
            forest.seed = o.seed;
        }

        let metrics = self.evaluation.parsed()?;
        if !metrics.is_empty() {
            spec.metrics = metrics;
        }

        Ok(())
    }

    pub fn dataset_path(&self) -> Option<&Path> {
        self.dataset.path.as_deref()
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, val: &str) -> Result<T> {
    val.trim()
        .parse()
        .map_err(|_| PipelineError::Config(format!("Invalid value for {}: {:?}", key, val)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = TrainerConfig::default();
        assert_eq!(config.split.test_fraction, 0.2);
        assert_eq!(config.split.effective_seed(), Some(42));
        assert_eq!(config.logging.level, "info");
        assert!(config.dataset_path().is_none());
        assert!(config.validate().unwrap().is_empty());
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[dataset]
path = "data/participation.csv"

[split]
test_fraction = 0.25
seed = 7

[forest]
n_trees = 50
oob_score = true

[evaluation]
metrics = ["mae", "r2"]
"#
        )
        .unwrap();

        let config = TrainerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.dataset_path(), Some(Path::new("data/participation.csv")));
        assert_eq!(config.split.test_fraction, 0.25);
        assert_eq!(config.split.seed, Some(7));
        assert_eq!(config.forest.n_trees, Some(50));
        assert_eq!(config.logging.level, "info");

        let mut spec = PipelineSpec::sessions();
        config.apply_to(&mut spec).unwrap();
        assert_eq!(spec.test_fraction, 0.25);
        assert_eq!(spec.seed, Some(7));
        assert_eq!(spec.forest.n_trees, 50);
        assert!(spec.forest.oob_score);
        // preset values survive where nothing overrides them
        assert_eq!(spec.forest.max_depth, Some(15));
        assert_eq!(spec.forest.seed, Some(100));
        assert_eq!(spec.metrics, vec![Metric::MeanAbsoluteError, Metric::R2]);
    }

    #[test]
    fn test_malformed_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[split]\ntest_fraction = \"lots\"").unwrap();
        assert!(matches!(
            TrainerConfig::from_file(file.path()),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            TrainerConfig::from_file("/nonexistent/turnout.toml"),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("TURNOUT_DATASET", "/tmp/sessions.csv"),
            ("TURNOUT_SEED", "9"),
            ("TURNOUT_TEST_FRACTION", "0.3"),
            ("TURNOUT_LOG_LEVEL", "debug"),
        ]
        .into_iter()
        .collect();

        let mut config = TrainerConfig::default();
        config
            .apply_env_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.dataset_path(), Some(Path::new("/tmp/sessions.csv")));
        assert_eq!(config.split.effective_seed(), Some(9));
        assert_eq!(config.split.test_fraction, 0.3);
        assert_eq!(config.logging.level, "debug");

        config
            .apply_env_from(|key| (key == "TURNOUT_SEED").then(|| "none".to_string()))
            .unwrap();
        assert_eq!(config.split.effective_seed(), None);

        let bad = config.apply_env_from(|key| (key == "TURNOUT_TEST_FRACTION").then(|| "x".to_string()));
        assert!(matches!(bad, Err(PipelineError::Config(_))));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[split]\nseed = 7\n\n[evaluation]\nmetrics = [\"r2\"]").unwrap();

        let mut config = TrainerConfig::from_file(file.path()).unwrap();
        config
            .apply_env_from(|key| match key {
                "TURNOUT_SEED" => Some("none".to_string()),
                "TURNOUT_DATASET" => Some("/env/data.csv".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.split.effective_seed(), None);

        config.apply_overrides(&CliOverrides {
            dataset: Some(PathBuf::from("cli.csv")),
            seed: Some(5),
            test_fraction: Some(0.25),
            n_trees: Some(12),
            metrics: vec!["mae".to_string(), "mse".to_string()],
            oob_score: true,
            ..CliOverrides::default()
        });

        assert_eq!(config.dataset_path(), Some(Path::new("cli.csv")));
        assert_eq!(config.split.effective_seed(), Some(5));
        assert_eq!(config.split.test_fraction, 0.25);
        assert_eq!(config.forest.n_trees, Some(12));
        assert_eq!(config.forest.oob_score, Some(true));
        assert_eq!(
            config.evaluation.parsed().unwrap(),
            vec![Metric::MeanAbsoluteError, Metric::MeanSquaredError]
        );

        config.apply_overrides(&CliOverrides {
            unseeded: true,
            ..CliOverrides::default()
        });
        assert_eq!(config.split.effective_seed(), None);
        // untouched flags leave earlier layers alone
        assert_eq!(config.dataset_path(), Some(Path::new("cli.csv")));
    }

    #[test]
    fn test_cli_metric_accuracy_rejected() {
        let mut config = TrainerConfig::default();
        config.apply_overrides(&CliOverrides {
            metrics: vec!["accuracy".to_string()],
            ..CliOverrides::default()
        });
        assert!(matches!(
            config.validate(),
            Err(PipelineError::MetricTaskMismatch(_))
        ));
    }

    #[test]
    fn test_log_directive() {
        let mut config = TrainerConfig::default();
        assert_eq!(config.log_directive(false), "info");
        assert_eq!(config.log_directive(true), "debug");
        config.logging.level = "WARN".to_string();
        assert_eq!(config.log_directive(false), "warn");
    }

    #[test]
    fn test_validation() {
        let mut config = TrainerConfig::default();
        config.split.test_fraction = 0.6;
        config.split.unseeded = true;
        assert_eq!(config.validate().unwrap().len(), 2);

        config.split.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = TrainerConfig::default();
        config.evaluation.metrics = vec!["accuracy".to_string()];
        assert!(matches!(
            config.validate(),
            Err(PipelineError::MetricTaskMismatch(_))
        ));
    }
}
