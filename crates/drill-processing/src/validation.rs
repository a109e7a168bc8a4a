//! Structural validation of a loaded dataset.

use crate::config::ProcessorConfig;
use crate::utils::is_numeric_dtype;
use polars::prelude::*;

/// Checks a dataset against structural requirements before processing.
///
/// Validation never fails with an error: it reports `(is_valid, message)` and
/// leaves the decision to the caller.
#[derive(Debug, Clone)]
pub struct DataValidator {
    required_columns: Vec<String>,
    min_rows: usize,
}

impl DataValidator {
    pub fn new(required_columns: Vec<String>, min_rows: usize) -> Self {
        Self {
            required_columns,
            min_rows,
        }
    }

    pub fn from_config(config: &ProcessorConfig) -> Self {
        Self::new(config.required_columns.clone(), config.min_rows)
    }

    pub fn required_columns(&self) -> &[String] {
        &self.required_columns
    }

    pub fn min_rows(&self) -> usize {
        self.min_rows
    }

    /// Validate the dataset structure.
    ///
    /// Checks, in order: required columns are present, required columns are
    /// numeric, and the row count reaches the minimum.
    pub fn validate(&self, df: &DataFrame) -> (bool, String) {
        let missing: Vec<&str> = self
            .required_columns
            .iter()
            .filter(|name| df.column(name.as_str()).is_err())
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            return (
                false,
                format!("Missing required columns: {}", missing.join(", ")),
            );
        }

        let non_numeric: Vec<String> = self
            .required_columns
            .iter()
            .filter_map(|name| {
                let column = df.column(name.as_str()).ok()?;
                (!is_numeric_dtype(column.dtype())).then(|| format!("{} ({})", name, column.dtype()))
            })
            .collect();
        if !non_numeric.is_empty() {
            return (
                false,
                format!("Required columns must be numeric: {}", non_numeric.join(", ")),
            );
        }

        if df.height() < self.min_rows {
            return (
                false,
                format!(
                    "Insufficient rows: {} (minimum {})",
                    df.height(),
                    self.min_rows
                ),
            );
        }

        (
            true,
            format!(
                "Dataset valid: {} rows, {} columns",
                df.height(),
                df.width()
            ),
        )
    }
}

impl Default for DataValidator {
    fn default() -> Self {
        Self::from_config(&ProcessorConfig::default())
    }
}
