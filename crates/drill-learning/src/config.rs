//! Configuration for the classifier pipeline.
//!
//! # Example
//!
//! ```
//! use drill_learning::ModelPipelineConfig;
//!
//! let config = ModelPipelineConfig::builder()
//!     .n_estimators(200)
//!     .max_depth(12)
//!     .random_seed(7)
//!     .build()
//!     .expect("valid config");
//! assert_eq!(config.n_estimators, 200);
//! ```

use crate::error::LearningError;
use serde::{Deserialize, Serialize};

/// Random forest settings used by [`ModelPipeline`](crate::ModelPipeline).
///
/// Use [`ModelPipelineConfig::builder()`] to construct a configuration.
///
/// # Validation
///
/// The builder validates on [`build()`](ModelPipelineConfigBuilder::build):
/// - `n_estimators` must be at least 1
/// - `max_depth`, when set, must be at least 1
/// - `min_samples_split` must be at least 2
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPipelineConfig {
    /// Number of trees in the forest (default: 100).
    pub n_estimators: usize,

    /// Maximum tree depth (default: unlimited).
    pub max_depth: Option<usize>,

    /// Minimum samples required to split a node (default: 2).
    pub min_samples_split: usize,

    /// Draw a bootstrap sample for each tree (default: true).
    pub bootstrap: bool,

    /// Random seed for reproducibility (default: 42).
    pub random_seed: u64,
}

impl Default for ModelPipelineConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: None,
            min_samples_split: 2,
            bootstrap: true,
            random_seed: 42,
        }
    }
}

impl ModelPipelineConfig {
    /// Create a new builder for `ModelPipelineConfig`.
    #[must_use]
    pub fn builder() -> ModelPipelineConfigBuilder {
        ModelPipelineConfigBuilder::default()
    }
}

/// Builder for [`ModelPipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct ModelPipelineConfigBuilder {
    config: ModelPipelineConfig,
}

impl ModelPipelineConfigBuilder {
    /// Set the number of trees (default: 100).
    #[must_use]
    pub fn n_estimators(mut self, n: usize) -> Self {
        self.config.n_estimators = n;
        self
    }

    /// Limit the depth of every tree.
    #[must_use]
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Set the minimum samples required to split a node (default: 2).
    #[must_use]
    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.config.min_samples_split = n;
        self
    }

    /// Enable or disable bootstrap sampling (default: true).
    #[must_use]
    pub fn bootstrap(mut self, bootstrap: bool) -> Self {
        self.config.bootstrap = bootstrap;
        self
    }

    /// Set the random seed (default: 42).
    #[must_use]
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = seed;
        self
    }

    /// Build the configuration, validating all settings.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::InvalidConfig`] if a value is out of range.
    pub fn build(self) -> Result<ModelPipelineConfig, LearningError> {
        if self.config.n_estimators == 0 {
            return Err(LearningError::InvalidConfig(
                "n_estimators must be at least 1".to_string(),
            ));
        }

        if self.config.max_depth == Some(0) {
            return Err(LearningError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }

        if self.config.min_samples_split < 2 {
            return Err(LearningError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }

        Ok(self.config)
    }
}
