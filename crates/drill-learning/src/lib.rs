//! drill-learning: classification pipeline for processed drilling data.
//!
//! Builds a scikit-style pipeline that preprocesses named columns of a
//! Polars `DataFrame` and classifies rows with a random forest. It is a
//! companion to `drill-processing`, which it does not depend on: feed it
//! the processed frame and pick the feature columns.
//!
//! # Features
//!
//! - **Numeric transformer**: median imputation, then standard scaling
//! - **Categorical transformer**: constant `"missing"` imputation, then
//!   one-hot encoding that ignores categories unseen during fit
//! - **Classifier**: random forest with Gini splits, bootstrap sampling and
//!   `sqrt(n_features)` candidate features per split, seeded for
//!   reproducibility
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use drill_learning::{ModelPipeline, ModelPipelineConfig, build_ml_pipeline};
//!
//! // Default forest settings
//! let mut pipeline = build_ml_pipeline(&["depth", "pressure", "rop"], &["formation"]);
//! pipeline.fit(&processed, "lithology")?;
//! let labels: Vec<String> = pipeline.predict(&new_data)?;
//!
//! // Custom forest settings
//! let config = ModelPipelineConfig::builder()
//!     .n_estimators(300)
//!     .max_depth(10)
//!     .build()?;
//! let pipeline = ModelPipeline::new(&["depth", "pressure"], &["formation"], config);
//! ```

pub mod config;
pub mod error;
pub mod forest;
pub mod pipeline;
pub mod preprocess;

pub use config::{ModelPipelineConfig, ModelPipelineConfigBuilder};
pub use error::{LearningError, Result};
pub use forest::{DecisionTree, RandomForestClassifier};
pub use pipeline::{ModelPipeline, build_ml_pipeline};
pub use preprocess::{MedianImputer, OneHotEncoder, Preprocessor, StandardScaler};
