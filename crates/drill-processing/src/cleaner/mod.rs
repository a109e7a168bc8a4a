//! Data cleaning stage.
//!
//! This module provides:
//! - Missing value imputation for every column with nulls
//! - Exact duplicate row removal (first occurrence kept, order preserved)

use crate::config::ImputationStrategy;
use crate::imputers::StatisticalImputer;
use crate::stages::Cleaner;
use crate::utils::{DtypeCategory, get_dtype_category, nan_count};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::{debug, info, warn};

/// Default [`Cleaner`] for drilling datasets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DataCleaner;

impl DataCleaner {
    /// Impute missing values in every column that has them.
    ///
    /// Numeric columns use `strategy`, and NaN cells count as missing; text
    /// and boolean columns use their mode. Columns of other types are left
    /// untouched.
    pub fn impute_missing(&self, mut df: DataFrame, strategy: ImputationStrategy) -> Result<DataFrame> {
        let columns_with_missing: Vec<(String, DataType)> = df
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0 || nan_count(col.as_materialized_series()) > 0)
            .map(|col| (col.name().to_string(), col.dtype().clone()))
            .collect();

        if columns_with_missing.is_empty() {
            debug!("No missing values found");
            return Ok(df);
        }

        let mut total_filled = 0;
        for (col_name, dtype) in &columns_with_missing {
            let filled = match get_dtype_category(dtype) {
                DtypeCategory::Numeric => StatisticalImputer::impute_numeric(&mut df, col_name, strategy),
                DtypeCategory::Text => StatisticalImputer::impute_text(&mut df, col_name),
                DtypeCategory::Boolean => StatisticalImputer::impute_bool(&mut df, col_name),
                DtypeCategory::Other => {
                    warn!("Leaving missing values in '{}' ({}): unsupported type", col_name, dtype);
                    Ok(0)
                }
            }
            .with_context(|| format!("imputing column '{}'", col_name))?;
            total_filled += filled;
        }

        info!(
            "Imputed {} missing values across {} columns ({})",
            total_filled,
            columns_with_missing.len(),
            strategy
        );
        Ok(df)
    }

    /// Remove exact duplicate rows, keeping the first occurrence in order.
    pub fn remove_duplicates(&self, df: DataFrame) -> Result<DataFrame> {
        let before = df.height();
        let df = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        let removed = before - df.height();

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            info!("Removed {} duplicate rows ({:.1}%)", removed, pct);
        } else {
            debug!("No duplicate rows found");
        }
        Ok(df)
    }
}

impl Cleaner for DataCleaner {
    fn clean(&self, df: DataFrame, strategy: ImputationStrategy) -> Result<DataFrame> {
        let df = self.impute_missing(df, strategy)?;
        self.remove_duplicates(df)
    }
}
