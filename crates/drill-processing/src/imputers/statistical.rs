//! Statistical imputation methods.
//!
//! Provides mean, median, most-frequent and constant fills for numeric
//! columns, and mode fills for text and boolean columns.

use crate::config::ImputationStrategy;
use crate::utils::{
    fill_bool_nulls, fill_numeric_nulls, fill_string_nulls, finite_values, mean_std, nan_count,
    numeric_mode, quantile_sorted, string_mode, to_f64_values,
};
use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::debug;

/// Fill value for text columns that have no non-null values at all.
pub const MISSING_CATEGORY: &str = "missing";

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Compute the fill value for a numeric series under `strategy`.
    ///
    /// Statistics use finite values only. Returns zero when the series has
    /// none.
    pub fn numeric_fill_value(series: &Series, strategy: ImputationStrategy) -> Result<f64> {
        let values = to_f64_values(series)?;
        let value = match strategy {
            ImputationStrategy::Mean => mean_std(&values).map(|(mean, _)| mean),
            ImputationStrategy::Median => {
                let mut sorted = finite_values(&values);
                sorted.sort_by(f64::total_cmp);
                quantile_sorted(&sorted, 0.5)
            }
            ImputationStrategy::MostFrequent => {
                let finite: Vec<Option<f64>> =
                    finite_values(&values).into_iter().map(Some).collect();
                numeric_mode(&finite)
            }
            ImputationStrategy::Zero => Some(0.0),
        };
        Ok(value.unwrap_or(0.0))
    }

    /// Impute a numeric column in place. NaN cells count as missing.
    /// Returns the number of filled cells.
    pub fn impute_numeric(
        df: &mut DataFrame,
        col_name: &str,
        strategy: ImputationStrategy,
    ) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count() + nan_count(&series);
        if missing == 0 {
            return Ok(0);
        }

        let fill_value = Self::numeric_fill_value(&series, strategy)?;
        let filled = fill_numeric_nulls(&series, fill_value)
            .with_context(|| format!("filling '{}' with {}", col_name, strategy))?;
        df.replace(col_name, filled)?;

        debug!(
            "Filled {} values in '{}' with {}: {:.4}",
            missing, col_name, strategy, fill_value
        );
        Ok(missing)
    }

    /// Impute a text column in place with its mode.
    pub fn impute_text(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            return Ok(0);
        }

        let fill_value = string_mode(&series).unwrap_or_else(|| MISSING_CATEGORY.to_string());
        let filled = fill_string_nulls(&series, &fill_value)?;
        df.replace(col_name, filled)?;

        debug!("Filled {} values in '{}' with mode '{}'", missing, col_name, fill_value);
        Ok(missing)
    }

    /// Impute a boolean column in place with its most frequent value.
    pub fn impute_bool(df: &mut DataFrame, col_name: &str) -> Result<usize> {
        let series = df.column(col_name)?.as_materialized_series().clone();
        let missing = series.null_count();
        if missing == 0 {
            return Ok(0);
        }

        let bools = series.bool()?;
        let trues = bools.into_iter().filter(|v| *v == Some(true)).count();
        let falses = bools.into_iter().filter(|v| *v == Some(false)).count();
        let filled = fill_bool_nulls(&series, trues > falses)?;
        df.replace(col_name, filled)?;

        Ok(missing)
    }
}
