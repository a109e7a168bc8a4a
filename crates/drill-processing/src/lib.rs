//! Drilling Data Processing Library
//!
//! Turns raw drilling measurement tables into analysis-ready datasets with
//! Polars.
//!
//! # Overview
//!
//! A [`DrillingProcessor`] loads a dataset, validates its structure and runs
//! a fixed sequence of stages:
//!
//! - **Clean**: missing value imputation and exact duplicate removal
//! - **Handle outliers**: isolation forest, IQR or z-score row filtering
//! - **Engineer features**: pressure/temperature ratios, flow efficiency,
//!   depth gradients and mechanical drilling features
//! - **Check quality**: completeness, duplicates, per-column statistics and
//!   remaining issues, collected in a [`QualityReport`]
//!
//! Each stage is a trait ([`Cleaner`], [`OutlierDetector`],
//! [`FeatureEngineer`], [`QualityChecker`]) so alternative implementations
//! can be injected through the builder. Progress and failures are reported
//! through an injected [`ProcessingLogger`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use drill_processing::{DrillingProcessor, ProcessorConfig};
//!
//! let mut processor = DrillingProcessor::new(ProcessorConfig::default())?;
//! processor.load("well_17.parquet")?;
//!
//! let processed = processor.run()?;
//! println!("{} rows, {} columns", processed.height(), processed.width());
//!
//! if let Some(report) = processor.quality_report() {
//!     println!("Quality score: {:.2}", report.score);
//! }
//! ```
//!
//! # Configuration
//!
//! Use [`ProcessorConfig`] to customize processing behavior:
//!
//! ```rust,ignore
//! use drill_processing::config::*;
//!
//! let config = ProcessorConfig::builder()
//!     .imputation_strategy(ImputationStrategy::Mean)
//!     .outlier_method(OutlierMethod::Iqr)
//!     .iqr_multiplier(2.0)
//!     .add_formation_features(false)
//!     .build()?;
//! ```
//!
//! Configurations can also be read from JSON option maps with
//! [`ProcessorConfig::from_options`] or [`ProcessorConfig::from_file`].
//! Unsupported values are rejected when the configuration is parsed.

pub mod cleaner;
pub mod config;
pub mod error;
pub mod features;
pub mod imputers;
pub mod logging;
pub mod outliers;
pub mod pipeline;
pub mod quality;
pub mod schema;
pub mod stages;
pub mod types;
pub mod utils;
pub mod validation;

// Re-exports for convenient access
pub use cleaner::DataCleaner;
pub use config::{
    ConfigError, FeatureSettings, ImputationStrategy, OutlierMethod, OutlierSettings,
    ProcessorConfig, ProcessorConfigBuilder,
};
pub use error::{ProcessingError, Result as ProcessingResult, StageError};
pub use features::DrillingFeatureEngineer;
pub use imputers::StatisticalImputer;
pub use logging::{ClosureLogger, LogEvent, LogLevel, MemoryLogger, ProcessingLogger, TracingLogger};
pub use outliers::{IsolationForest, StatisticalOutlierDetector};
pub use pipeline::{DrillingProcessor, DrillingProcessorBuilder, FileFormat, ProcessorState};
pub use quality::DataQualityChecker;
pub use stages::{Cleaner, FeatureEngineer, OutlierDetector, QualityChecker, Stage};
pub use types::{IssueKind, NumericSummary, QualityIssue, QualityReport};
pub use validation::DataValidator;
