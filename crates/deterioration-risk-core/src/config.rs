//! Estimator configuration.
//!
//! Every field has a default matching the reference pipeline, so an empty
//! JSON object or TOML document is a valid configuration.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration for training, scoring and projection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Seed for every pseudo-random stream in the pipeline
    pub seed: u64,
    /// Train on the prediction batch when no model exists yet
    pub auto_train_on_predict: bool,
    pub features: FeatureParams,
    pub labels: LabelParams,
    pub split: SplitParams,
    pub forest: ForestParams,
    pub projection: ProjectionParams,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            auto_train_on_predict: false,
            features: FeatureParams::default(),
            labels: LabelParams::default(),
            split: SplitParams::default(),
            forest: ForestParams::default(),
            projection: ProjectionParams::default(),
        }
    }
}

/// Feature Builder defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeatureParams {
    /// Age used when the age band has no number
    pub default_age: u32,
    /// Lower bound (inclusive) of simulated wait times
    pub simulated_wait_min: u32,
    /// Upper bound (exclusive) of simulated wait times
    pub simulated_wait_max: u32,
    /// Date wait times are measured against when a record has a request date
    pub reference_date: Option<NaiveDate>,
}

impl Default for FeatureParams {
    fn default() -> Self {
        Self {
            default_age: 40,
            simulated_wait_min: 1,
            simulated_wait_max: 120,
            reference_date: None,
        }
    }
}

/// Label Synthesizer parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LabelParams {
    /// Standard deviation of the Gaussian noise added to each base probability
    pub noise_std: f64,
}

impl Default for LabelParams {
    fn default() -> Self {
        Self { noise_std: 0.1 }
    }
}

/// Train/test split parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SplitParams {
    /// Share of records held out for evaluation
    pub test_fraction: f64,
}

impl Default for SplitParams {
    fn default() -> Self {
        Self { test_fraction: 0.2 }
    }
}

/// Random forest hyperparameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features tried per split; `None` means floor(sqrt(n_features))
    pub max_features: Option<usize>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 10,
            min_samples_split: 20,
            min_samples_leaf: 10,
            max_features: None,
        }
    }
}

/// Aggregator thresholds, rates and costs.
///
/// Rates are whole percentages so projected counts floor exactly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectionParams {
    /// Probabilities strictly above this are high band
    pub high_threshold: f64,
    /// Probabilities strictly above this (and not high) are medium band
    pub medium_threshold: f64,
    pub high_30d_pct: u64,
    pub medium_60d_pct: u64,
    pub low_90d_pct: u64,
    pub hospitalization_pct: u64,
    /// Cost per projected deterioration
    pub unit_cost: u64,
    /// Length of the specialty ranking
    pub top_n: usize,
    pub fallback: FallbackRates,
}

impl Default for ProjectionParams {
    fn default() -> Self {
        Self {
            high_threshold: 0.7,
            medium_threshold: 0.4,
            high_30d_pct: 90,
            medium_60d_pct: 50,
            low_90d_pct: 10,
            hospitalization_pct: 30,
            unit_cost: 5000,
            top_n: 10,
            fallback: FallbackRates::default(),
        }
    }
}

/// Rule-based projection rates, used when the classifier is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FallbackRates {
    pub critical_30d_pct: u64,
    pub critical_60d_pct: u64,
    pub medium_60d_pct: u64,
    pub low_90d_pct: u64,
}

impl Default for FallbackRates {
    fn default() -> Self {
        Self {
            critical_30d_pct: 80,
            critical_60d_pct: 50,
            medium_60d_pct: 20,
            low_90d_pct: 5,
        }
    }
}

impl EstimatorConfig {
    /// Parse a JSON configuration and validate it.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML configuration and validate it.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file, picking the parser from the extension.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("toml") => Self::from_toml_str(&text),
            other => Err(ConfigError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        let features = &self.features;
        if features.simulated_wait_min >= features.simulated_wait_max {
            return Err(invalid(
                "features.simulated_wait_min",
                format!(
                    "{} must be below simulated_wait_max ({})",
                    features.simulated_wait_min, features.simulated_wait_max
                ),
            ));
        }

        if !(self.labels.noise_std >= 0.0 && self.labels.noise_std.is_finite()) {
            return Err(invalid(
                "labels.noise_std",
                format!("{} is not a finite non-negative number", self.labels.noise_std),
            ));
        }

        let test_fraction = self.split.test_fraction;
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(invalid(
                "split.test_fraction",
                format!("{} is outside (0, 1)", test_fraction),
            ));
        }

        let forest = &self.forest;
        if forest.n_trees == 0 {
            return Err(invalid("forest.n_trees", "must be at least 1".into()));
        }
        if forest.max_depth == 0 {
            return Err(invalid("forest.max_depth", "must be at least 1".into()));
        }
        if forest.min_samples_leaf == 0 {
            return Err(invalid("forest.min_samples_leaf", "must be at least 1".into()));
        }
        if forest.min_samples_split < 2 {
            return Err(invalid("forest.min_samples_split", "must be at least 2".into()));
        }
        if forest.max_features == Some(0) {
            return Err(invalid("forest.max_features", "must be at least 1".into()));
        }

        let projection = &self.projection;
        if !(0.0..=1.0).contains(&projection.medium_threshold)
            || !(0.0..=1.0).contains(&projection.high_threshold)
            || projection.medium_threshold > projection.high_threshold
        {
            return Err(invalid(
                "projection.high_threshold",
                format!(
                    "thresholds must satisfy 0 <= medium ({}) <= high ({}) <= 1",
                    projection.medium_threshold, projection.high_threshold
                ),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_pipeline() {
        let config = EstimatorConfig::default();
        assert_eq!(config.seed, 42);
        assert!(!config.auto_train_on_predict);
        assert_eq!(config.features.default_age, 40);
        assert_eq!(config.forest.n_trees, 100);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.forest.min_samples_split, 20);
        assert_eq!(config.forest.min_samples_leaf, 10);
        assert_eq!(config.projection.unit_cost, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EstimatorConfig::from_json_str(
            r#"{"auto_train_on_predict": true, "forest": {"n_trees": 25}}"#,
        )
        .unwrap();

        assert!(config.auto_train_on_predict);
        assert_eq!(config.forest.n_trees, 25);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.projection.top_n, 10);
    }

    #[test]
    fn test_toml_config() {
        let config = EstimatorConfig::from_toml_str(
            r#"
            seed = 7

            [features]
            reference_date = "2024-06-30"

            [projection]
            unit_cost = 7500
            "#,
        )
        .unwrap();

        assert_eq!(config.seed, 7);
        assert_eq!(
            config.features.reference_date,
            NaiveDate::from_ymd_opt(2024, 6, 30)
        );
        assert_eq!(config.projection.unit_cost, 7500);
        assert_eq!(config.projection.high_30d_pct, 90);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = EstimatorConfig::from_json_str(r#"{"split": {"test_fraction": 1.5}}"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "split.test_fraction", .. }));

        let err = EstimatorConfig::from_json_str(
            r#"{"projection": {"high_threshold": 0.3, "medium_threshold": 0.6}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));

        let err = EstimatorConfig::from_json_str(r#"{"forest": {"n_trees": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "forest.n_trees", .. }));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("estimator.toml");
        let mut file = std::fs::File::create(&toml_path).unwrap();
        writeln!(file, "auto_train_on_predict = true").unwrap();
        let config = EstimatorConfig::load(&toml_path).unwrap();
        assert!(config.auto_train_on_predict);

        let json_path = dir.path().join("estimator.json");
        std::fs::write(&json_path, r#"{"seed": 9}"#).unwrap();
        assert_eq!(EstimatorConfig::load(&json_path).unwrap().seed, 9);

        let yaml_path = dir.path().join("estimator.yaml");
        std::fs::write(&yaml_path, "seed: 9").unwrap();
        assert!(matches!(
            EstimatorConfig::load(&yaml_path),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }
}
