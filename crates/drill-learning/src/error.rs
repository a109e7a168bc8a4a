//! Error types for the drill-learning crate.
//!
//! This module defines [`LearningError`], the main error type used throughout
//! the crate. All public API functions return `Result<T, LearningError>`.
//!
//! # Example
//!
//! ```
//! use drill_learning::{LearningError, ModelPipelineConfig};
//!
//! fn configure() -> Result<ModelPipelineConfig, LearningError> {
//!     // Errors are automatically propagated with ?
//!     let config = ModelPipelineConfig::builder().n_estimators(50).build()?;
//!     Ok(config)
//! }
//! # configure().unwrap();
//! ```

use thiserror::Error;

/// The main error type for drill-learning operations.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LearningError {
    /// Invalid configuration provided to the pipeline.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid data provided for fitting or prediction.
    ///
    /// Common causes:
    /// - The DataFrame has no rows
    /// - The target column contains null values
    /// - No feature columns were configured
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A configured feature column is not present in the DataFrame.
    #[error("Feature column '{0}' not found")]
    FeatureNotFound(String),

    /// The target column was not found in the DataFrame.
    ///
    /// Column names are case-sensitive.
    #[error("Target column '{0}' not found")]
    TargetNotFound(String),

    /// `predict` was called before `fit`.
    #[error("Pipeline has not been fitted")]
    NotFitted,

    /// Polars error while reading columns.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

/// Result type alias for learning operations.
pub type Result<T> = std::result::Result<T, LearningError>;
