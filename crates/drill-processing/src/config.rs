//! Configuration types for the drilling data processor.
//!
//! Options can be set with the builder or parsed from a string-keyed option
//! map (for example a JSON object). Strategy and method names are resolved to
//! closed enums at parse time, so an unsupported value is rejected here rather
//! than inside a stage.

use crate::schema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Strategy for imputing missing numeric values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationStrategy {
    /// Use the mean of non-null values
    Mean,
    /// Use the median of non-null values
    #[default]
    Median,
    /// Use the most frequent non-null value
    MostFrequent,
    /// Use a constant zero
    Zero,
}

impl ImputationStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::MostFrequent => "most_frequent",
            Self::Zero => "zero",
        }
    }
}

impl FromStr for ImputationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "most_frequent" | "mode" => Ok(Self::MostFrequent),
            "zero" | "constant" => Ok(Self::Zero),
            _ => Err(ConfigError::UnsupportedValue {
                key: keys::IMPUTATION_STRATEGY.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for ImputationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method used to flag outlying rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Isolation forest anomaly scores
    #[default]
    IsolationForest,
    /// Interquartile range fences on every numeric column
    Iqr,
    /// Standard score threshold on every numeric column
    ZScore,
}

impl OutlierMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsolationForest => "isolation_forest",
            Self::Iqr => "iqr",
            Self::ZScore => "zscore",
        }
    }
}

impl FromStr for OutlierMethod {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "isolation_forest" => Ok(Self::IsolationForest),
            "iqr" => Ok(Self::Iqr),
            "zscore" | "z_score" => Ok(Self::ZScore),
            _ => Err(ConfigError::UnsupportedValue {
                key: keys::OUTLIER_METHOD.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized option keys.
pub mod keys {
    pub const IMPUTATION_STRATEGY: &str = "imputation_strategy";
    pub const REMOVE_OUTLIERS: &str = "remove_outliers";
    pub const OUTLIER_METHOD: &str = "outlier_method";
    pub const ADD_FORMATION_FEATURES: &str = "add_formation_features";
    pub const CONTAMINATION: &str = "contamination";
    pub const N_ESTIMATORS: &str = "n_estimators";
    pub const MAX_SAMPLES: &str = "max_samples";
    pub const RANDOM_SEED: &str = "random_seed";
    pub const IQR_MULTIPLIER: &str = "iqr_multiplier";
    pub const ZSCORE_THRESHOLD: &str = "zscore_threshold";
    pub const MIN_ROWS: &str = "min_rows";
    pub const REQUIRED_COLUMNS: &str = "required_columns";
}

/// Settings consumed by the outlier stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierSettings {
    pub method: OutlierMethod,
    /// Fraction of rows flagged by the isolation forest.
    pub contamination: f64,
    pub n_estimators: usize,
    pub max_samples: usize,
    pub random_seed: u64,
    pub iqr_multiplier: f64,
    pub zscore_threshold: f64,
}

impl Default for OutlierSettings {
    fn default() -> Self {
        Self {
            method: OutlierMethod::default(),
            contamination: 0.05,
            n_estimators: 100,
            max_samples: 256,
            random_seed: 42,
            iqr_multiplier: 1.5,
            zscore_threshold: 3.0,
        }
    }
}

/// Settings consumed by the feature stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSettings {
    pub add_formation_features: bool,
}

impl Default for FeatureSettings {
    fn default() -> Self {
        Self {
            add_formation_features: true,
        }
    }
}

/// Configuration for [`DrillingProcessor`](crate::DrillingProcessor).
///
/// # Example
///
/// ```rust,ignore
/// use drill_processing::config::{OutlierMethod, ProcessorConfig};
///
/// let config = ProcessorConfig::builder()
///     .outlier_method(OutlierMethod::Iqr)
///     .add_formation_features(false)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// Default: Median
    pub imputation_strategy: ImputationStrategy,

    /// Whether the outlier stage removes flagged rows.
    /// Default: true
    pub remove_outliers: bool,

    /// Outlier detection settings, including the method.
    pub outliers: OutlierSettings,

    /// Feature engineering toggles.
    pub features: FeatureSettings,

    /// Minimum number of rows accepted by the validator.
    /// Default: 10
    pub min_rows: usize,

    /// Columns that must be present and numeric.
    /// Default: depth, pressure, temperature, flow_rate
    pub required_columns: Vec<String>,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            imputation_strategy: ImputationStrategy::default(),
            remove_outliers: true,
            outliers: OutlierSettings::default(),
            features: FeatureSettings::default(),
            min_rows: 10,
            required_columns: schema::default_required_columns(),
        }
    }
}

impl ProcessorConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ProcessorConfigBuilder {
        ProcessorConfigBuilder::default()
    }

    /// Build a configuration from a string-keyed option map.
    ///
    /// Unrecognized keys are ignored and missing keys keep their defaults.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Some(value) = options.get(keys::IMPUTATION_STRATEGY) {
            builder = builder.imputation_strategy(expect_str(keys::IMPUTATION_STRATEGY, value)?.parse()?);
        }
        if let Some(value) = options.get(keys::REMOVE_OUTLIERS) {
            builder = builder.remove_outliers(expect_bool(keys::REMOVE_OUTLIERS, value)?);
        }
        if let Some(value) = options.get(keys::OUTLIER_METHOD) {
            builder = builder.outlier_method(expect_str(keys::OUTLIER_METHOD, value)?.parse()?);
        }
        if let Some(value) = options.get(keys::ADD_FORMATION_FEATURES) {
            builder = builder.add_formation_features(expect_bool(keys::ADD_FORMATION_FEATURES, value)?);
        }
        if let Some(value) = options.get(keys::CONTAMINATION) {
            builder = builder.contamination(expect_f64(keys::CONTAMINATION, value)?);
        }
        if let Some(value) = options.get(keys::N_ESTIMATORS) {
            builder = builder.n_estimators(expect_usize(keys::N_ESTIMATORS, value)?);
        }
        if let Some(value) = options.get(keys::MAX_SAMPLES) {
            builder = builder.max_samples(expect_usize(keys::MAX_SAMPLES, value)?);
        }
        if let Some(value) = options.get(keys::RANDOM_SEED) {
            builder = builder.random_seed(expect_usize(keys::RANDOM_SEED, value)? as u64);
        }
        if let Some(value) = options.get(keys::IQR_MULTIPLIER) {
            builder = builder.iqr_multiplier(expect_f64(keys::IQR_MULTIPLIER, value)?);
        }
        if let Some(value) = options.get(keys::ZSCORE_THRESHOLD) {
            builder = builder.zscore_threshold(expect_f64(keys::ZSCORE_THRESHOLD, value)?);
        }
        if let Some(value) = options.get(keys::MIN_ROWS) {
            builder = builder.min_rows(expect_usize(keys::MIN_ROWS, value)?);
        }
        if let Some(value) = options.get(keys::REQUIRED_COLUMNS) {
            let columns = value
                .as_array()
                .and_then(|items| {
                    items
                        .iter()
                        .map(|item| item.as_str().map(str::to_string))
                        .collect::<Option<Vec<_>>>()
                })
                .ok_or_else(|| ConfigError::InvalidType {
                    key: keys::REQUIRED_COLUMNS.to_string(),
                    expected: "array of strings",
                })?;
            builder = builder.required_columns(columns);
        }

        builder.build()
    }

    /// Parse a JSON object of options.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| ConfigError::Malformed(e.to_string()))?;
        match value {
            Value::Object(options) => Self::from_options(&options),
            _ => Err(ConfigError::Malformed(
                "configuration must be a JSON object".to_string(),
            )),
        }
    }

    /// Read and parse a JSON options file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Malformed(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&contents)
    }

    /// Outlier method currently selected.
    pub fn outlier_method(&self) -> OutlierMethod {
        self.outliers.method
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let o = &self.outliers;
        if !(o.contamination > 0.0 && o.contamination <= 0.5) {
            return Err(ConfigError::OutOfRange {
                key: keys::CONTAMINATION.to_string(),
                value: o.contamination.to_string(),
                reason: "must be in (0.0, 0.5]",
            });
        }
        if o.n_estimators == 0 {
            return Err(ConfigError::OutOfRange {
                key: keys::N_ESTIMATORS.to_string(),
                value: o.n_estimators.to_string(),
                reason: "must be at least 1",
            });
        }
        if o.max_samples < 2 {
            return Err(ConfigError::OutOfRange {
                key: keys::MAX_SAMPLES.to_string(),
                value: o.max_samples.to_string(),
                reason: "must be at least 2",
            });
        }
        if !(o.iqr_multiplier > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: keys::IQR_MULTIPLIER.to_string(),
                value: o.iqr_multiplier.to_string(),
                reason: "must be positive",
            });
        }
        if !(o.zscore_threshold > 0.0) {
            return Err(ConfigError::OutOfRange {
                key: keys::ZSCORE_THRESHOLD.to_string(),
                value: o.zscore_threshold.to_string(),
                reason: "must be positive",
            });
        }
        if self.min_rows == 0 {
            return Err(ConfigError::OutOfRange {
                key: keys::MIN_ROWS.to_string(),
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }
        Ok(())
    }
}

fn expect_str<'a>(key: &str, value: &'a Value) -> Result<&'a str, ConfigError> {
    value.as_str().ok_or_else(|| ConfigError::InvalidType {
        key: key.to_string(),
        expected: "string",
    })
}

fn expect_bool(key: &str, value: &Value) -> Result<bool, ConfigError> {
    value.as_bool().ok_or_else(|| ConfigError::InvalidType {
        key: key.to_string(),
        expected: "boolean",
    })
}

fn expect_f64(key: &str, value: &Value) -> Result<f64, ConfigError> {
    value.as_f64().ok_or_else(|| ConfigError::InvalidType {
        key: key.to_string(),
        expected: "number",
    })
}

fn expect_usize(key: &str, value: &Value) -> Result<usize, ConfigError> {
    value
        .as_u64()
        .map(|v| v as usize)
        .ok_or_else(|| ConfigError::InvalidType {
            key: key.to_string(),
            expected: "non-negative integer",
        })
}

/// Errors raised while parsing or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unsupported value '{value}' for option '{key}'")]
    UnsupportedValue { key: String, value: String },

    #[error("Option '{key}' must be a {expected}")]
    InvalidType { key: String, expected: &'static str },

    #[error("Invalid value {value} for option '{key}': {reason}")]
    OutOfRange {
        key: String,
        value: String,
        reason: &'static str,
    },

    #[error("Malformed configuration: {0}")]
    Malformed(String),
}

/// Builder for [`ProcessorConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct ProcessorConfigBuilder {
    imputation_strategy: Option<ImputationStrategy>,
    remove_outliers: Option<bool>,
    outlier_method: Option<OutlierMethod>,
    add_formation_features: Option<bool>,
    contamination: Option<f64>,
    n_estimators: Option<usize>,
    max_samples: Option<usize>,
    random_seed: Option<u64>,
    iqr_multiplier: Option<f64>,
    zscore_threshold: Option<f64>,
    min_rows: Option<usize>,
    required_columns: Option<Vec<String>>,
}

impl ProcessorConfigBuilder {
    pub fn imputation_strategy(mut self, strategy: ImputationStrategy) -> Self {
        self.imputation_strategy = Some(strategy);
        self
    }

    /// Enable or disable removal of flagged outlier rows.
    pub fn remove_outliers(mut self, remove: bool) -> Self {
        self.remove_outliers = Some(remove);
        self
    }

    pub fn outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = Some(method);
        self
    }

    /// Enable or disable the formation-metric columns.
    pub fn add_formation_features(mut self, add: bool) -> Self {
        self.add_formation_features = Some(add);
        self
    }

    /// Set the fraction of rows the isolation forest flags.
    ///
    /// # Arguments
    /// * `fraction` - Value in (0.0, 0.5]
    pub fn contamination(mut self, fraction: f64) -> Self {
        self.contamination = Some(fraction);
        self
    }

    /// Set the number of isolation trees.
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.n_estimators = Some(n);
        self
    }

    /// Set the sub-sample size used to grow each isolation tree.
    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = Some(n);
        self
    }

    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    pub fn iqr_multiplier(mut self, k: f64) -> Self {
        self.iqr_multiplier = Some(k);
        self
    }

    pub fn zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = Some(threshold);
        self
    }

    /// Set the minimum row count accepted by the validator.
    pub fn min_rows(mut self, rows: usize) -> Self {
        self.min_rows = Some(rows);
        self
    }

    /// Replace the set of columns the validator requires.
    pub fn required_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `ProcessorConfig` or an error if validation fails.
    pub fn build(self) -> Result<ProcessorConfig, ConfigError> {
        let defaults = OutlierSettings::default();
        let config = ProcessorConfig {
            imputation_strategy: self.imputation_strategy.unwrap_or_default(),
            remove_outliers: self.remove_outliers.unwrap_or(true),
            outliers: OutlierSettings {
                method: self.outlier_method.unwrap_or_default(),
                contamination: self.contamination.unwrap_or(defaults.contamination),
                n_estimators: self.n_estimators.unwrap_or(defaults.n_estimators),
                max_samples: self.max_samples.unwrap_or(defaults.max_samples),
                random_seed: self.random_seed.unwrap_or(defaults.random_seed),
                iqr_multiplier: self.iqr_multiplier.unwrap_or(defaults.iqr_multiplier),
                zscore_threshold: self.zscore_threshold.unwrap_or(defaults.zscore_threshold),
            },
            features: FeatureSettings {
                add_formation_features: self.add_formation_features.unwrap_or(true),
            },
            min_rows: self.min_rows.unwrap_or(10),
            required_columns: self
                .required_columns
                .unwrap_or_else(schema::default_required_columns),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_default_config() {
        let config = ProcessorConfig::default();
        assert_eq!(config.imputation_strategy, ImputationStrategy::Median);
        assert!(config.remove_outliers);
        assert_eq!(config.outlier_method(), OutlierMethod::IsolationForest);
        assert!(config.features.add_formation_features);
        assert_eq!(config.min_rows, 10);
        assert_eq!(config.required_columns.len(), 4);
    }

    #[test]
    fn test_empty_options_use_defaults() {
        let config = ProcessorConfig::from_options(&Map::new()).unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[test]
    fn test_options_are_parsed() {
        let config = ProcessorConfig::from_options(&options(json!({
            "imputation_strategy": "mean",
            "remove_outliers": false,
            "outlier_method": "z_score",
            "add_formation_features": false,
            "contamination": 0.1,
            "min_rows": 3,
            "required_columns": ["depth"]
        })))
        .unwrap();

        assert_eq!(config.imputation_strategy, ImputationStrategy::Mean);
        assert!(!config.remove_outliers);
        assert_eq!(config.outlier_method(), OutlierMethod::ZScore);
        assert!(!config.features.add_formation_features);
        assert_eq!(config.outliers.contamination, 0.1);
        assert_eq!(config.min_rows, 3);
        assert_eq!(config.required_columns, vec!["depth".to_string()]);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = ProcessorConfig::from_options(&options(json!({
            "colour": "blue",
            "imputation_strategy": "mode"
        })))
        .unwrap();
        assert_eq!(config.imputation_strategy, ImputationStrategy::MostFrequent);
    }

    #[test]
    fn test_unsupported_value_is_rejected() {
        let err = ProcessorConfig::from_options(&options(json!({
            "outlier_method": "dbscan"
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedValue { ref key, ref value }
                if key == "outlier_method" && value == "dbscan"
        ));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let err = ProcessorConfig::from_options(&options(json!({
            "remove_outliers": "yes"
        })))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidType { .. }));
    }

    #[test]
    fn test_contamination_out_of_range() {
        let result = ProcessorConfig::builder().contamination(0.9).build();
        assert!(matches!(result, Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_from_json_str_requires_object() {
        assert!(matches!(
            ProcessorConfig::from_json_str("[1, 2]"),
            Err(ConfigError::Malformed(_))
        ));
        let config = ProcessorConfig::from_json_str(r#"{"outlier_method": "iqr"}"#).unwrap();
        assert_eq!(config.outlier_method(), OutlierMethod::Iqr);
    }

    #[test]
    fn test_strategy_round_trip_names() {
        for strategy in [
            ImputationStrategy::Mean,
            ImputationStrategy::Median,
            ImputationStrategy::MostFrequent,
            ImputationStrategy::Zero,
        ] {
            assert_eq!(strategy.as_str().parse::<ImputationStrategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_config_serialization() {
        let config = ProcessorConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"isolation_forest\""));
        let deserialized: ProcessorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
