//! Data quality check stage.
//!
//! Summarizes completeness, duplicates and per-column statistics of the
//! processed dataset and lists the issues that remain. The dataset is never
//! modified.

use crate::schema::NON_NEGATIVE_COLUMNS;
use crate::stages::QualityChecker;
use crate::types::{IssueKind, NumericSummary, QualityIssue, QualityReport};
use crate::utils::{
    DtypeCategory, finite_values, get_dtype_category, mean_std, nan_count, to_f64_values,
};
use anyhow::Result;
use chrono::Utc;
use polars::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

/// Score deducted per issue of each kind.
const MISSING_PENALTY: f64 = 0.02;
const CONSTANT_PENALTY: f64 = 0.02;
const NEGATIVE_PENALTY: f64 = 0.05;

/// Default [`QualityChecker`].
#[derive(Debug, Default, Clone, Copy)]
pub struct DataQualityChecker;

impl DataQualityChecker {
    /// Summary of a numeric column. NaN counts as missing; min, max, mean
    /// and std cover finite values only.
    fn numeric_summary(name: &str, series: &Series) -> Result<(NumericSummary, Vec<f64>)> {
        let values = to_f64_values(series)?;
        let present: Vec<f64> = values
            .iter()
            .flatten()
            .copied()
            .filter(|v| !v.is_nan())
            .collect();
        let finite = finite_values(&values);
        let stats = mean_std(&values);

        let summary = NumericSummary {
            column: name.to_string(),
            count: present.len(),
            missing: values.len() - present.len(),
            min: finite.iter().copied().reduce(f64::min),
            max: finite.iter().copied().reduce(f64::max),
            mean: stats.map(|(mean, _)| mean),
            std: stats.map(|(_, std)| std),
        };
        Ok((summary, present))
    }

    fn count_duplicates(df: &DataFrame) -> Result<usize> {
        if df.height() == 0 {
            return Ok(0);
        }
        let unique = df.unique_stable(None, UniqueKeepStrategy::First, None)?;
        Ok(df.height() - unique.height())
    }

    fn score(completeness: f64, duplicate_ratio: f64, issues: &[QualityIssue]) -> f64 {
        let penalty: f64 = issues
            .iter()
            .map(|issue| match issue.kind {
                IssueKind::MissingValues => MISSING_PENALTY,
                IssueKind::ConstantColumn => CONSTANT_PENALTY,
                IssueKind::NegativeValues => NEGATIVE_PENALTY,
            })
            .sum();
        (completeness - duplicate_ratio - penalty).clamp(0.0, 1.0)
    }
}

impl QualityChecker for DataQualityChecker {
    fn check(&self, df: &DataFrame) -> Result<QualityReport> {
        let row_count = df.height();
        let column_count = df.width();

        let mut missing_by_column = BTreeMap::new();
        let mut numeric_summaries = Vec::new();
        let mut issues = Vec::new();

        for column in df.get_columns() {
            let name = column.name().as_str();
            let nulls = column.null_count() + nan_count(column.as_materialized_series());
            if nulls > 0 {
                missing_by_column.insert(name.to_string(), nulls);
                issues.push(QualityIssue {
                    column: name.to_string(),
                    kind: IssueKind::MissingValues,
                    message: format!("{} of {} values are missing", nulls, row_count),
                });
            }

            if get_dtype_category(column.dtype()) != DtypeCategory::Numeric {
                continue;
            }

            let (summary, present) =
                Self::numeric_summary(name, column.as_materialized_series())?;

            if present.len() > 1 && present.iter().all(|v| *v == present[0]) {
                issues.push(QualityIssue {
                    column: name.to_string(),
                    kind: IssueKind::ConstantColumn,
                    message: format!("All values equal {}", present[0]),
                });
            }

            if NON_NEGATIVE_COLUMNS.contains(&name) {
                let negatives = present.iter().filter(|v| **v < 0.0).count();
                if negatives > 0 {
                    issues.push(QualityIssue {
                        column: name.to_string(),
                        kind: IssueKind::NegativeValues,
                        message: format!("{} negative values in a non-negative measurement", negatives),
                    });
                }
            }

            numeric_summaries.push(summary);
        }

        let total_missing: usize = missing_by_column.values().sum();
        let total_cells = row_count * column_count;
        let completeness = if total_cells == 0 {
            0.0
        } else {
            1.0 - total_missing as f64 / total_cells as f64
        };

        let duplicate_rows = Self::count_duplicates(df)?;
        let duplicate_ratio = if row_count == 0 {
            0.0
        } else {
            duplicate_rows as f64 / row_count as f64
        };

        let score = Self::score(completeness, duplicate_ratio, &issues);
        debug!(
            "Quality check: completeness {:.3}, {} duplicates, {} issues, score {:.3}",
            completeness,
            duplicate_rows,
            issues.len(),
            score
        );

        Ok(QualityReport {
            generated_at: Utc::now().to_rfc3339(),
            row_count,
            column_count,
            total_missing,
            missing_by_column,
            duplicate_rows,
            completeness,
            numeric_summaries,
            issues,
            score,
        })
    }
}
