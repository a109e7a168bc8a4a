//! Error types for the drilling data processor.
//!
//! Every failure the orchestrator reports is a [`ProcessingError`]. Errors are
//! serializable as `{ code, stage, message }` so callers can forward them to other
//! processes or front ends unchanged.

use crate::config::ConfigError;
use crate::stages::Stage;
use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// Boxed error produced by a stage implementation.
pub type StageError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the processing pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// The source could not be read, has an unsupported format, or is empty.
    #[error("Failed to load data: {0}")]
    DataLoad(String),

    /// Structural validation of the dataset failed.
    #[error("Dataset validation failed: {0}")]
    Validation(String),

    /// A step was invoked without data, out of order, or after a failure.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A stage implementation failed. The original error is kept as the source.
    #[error("Stage '{stage}' failed: {source}")]
    StageExecution {
        stage: Stage,
        #[source]
        source: StageError,
    },

    /// Configuration contained an unsupported value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProcessingError {
    /// Wrap a stage implementation failure, tagging it with the stage name.
    pub fn stage_failed(stage: Stage, source: impl Into<StageError>) -> Self {
        ProcessingError::StageExecution {
            stage,
            source: source.into(),
        }
    }

    /// Get a stable error code for programmatic handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DataLoad(_) => "DATA_LOAD_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Precondition(_) => "PRECONDITION_ERROR",
            Self::StageExecution { .. } => "STAGE_EXECUTION_ERROR",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    /// The stage that produced this error, if it came from a stage.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::StageExecution { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Check if this error was raised by a precondition check.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

/// Errors are serialized as a struct with `code`, `stage` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 3)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("stage", &self.stage())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for processing operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::DataLoad("empty".to_string()).error_code(),
            "DATA_LOAD_ERROR"
        );
        assert_eq!(
            ProcessingError::Precondition("no data".to_string()).error_code(),
            "PRECONDITION_ERROR"
        );
    }

    #[test]
    fn test_stage_failed_keeps_source() {
        let inner = anyhow::anyhow!("detector crashed");
        let error = ProcessingError::stage_failed(Stage::HandleOutliers, inner);

        assert_eq!(error.stage(), Some(Stage::HandleOutliers));
        assert_eq!(error.error_code(), "STAGE_EXECUTION_ERROR");
        assert!(error.to_string().contains("handle_outliers"));
        assert_eq!(error.source().unwrap().to_string(), "detector crashed");
    }

    #[test]
    fn test_stage_is_none_for_other_errors() {
        assert!(ProcessingError::Validation("x".to_string()).stage().is_none());
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::stage_failed(Stage::Clean, anyhow::anyhow!("boom"));
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("STAGE_EXECUTION_ERROR"));
        assert!(json.contains("\"clean\""));
        assert!(json.contains("boom"));
    }

    #[test]
    fn test_config_error_conversion() {
        let error: ProcessingError = ConfigError::UnsupportedValue {
            key: "outlier_method".to_string(),
            value: "dbscan".to_string(),
        }
        .into();
        assert_eq!(error.error_code(), "INVALID_CONFIG");
        assert!(error.to_string().contains("dbscan"));
    }
}
