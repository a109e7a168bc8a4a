//! Imputation module for handling missing values.
//!
//! Statistical imputation (mean, median, most frequent, zero) for numeric
//! columns and mode imputation for text and boolean columns.

mod statistical;

pub use statistical::{MISSING_CATEGORY, StatisticalImputer};
