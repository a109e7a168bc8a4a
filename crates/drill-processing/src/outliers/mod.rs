//! Outlier detection stage.
//!
//! Produces a per-row exclusion mask over all numeric columns using the
//! configured [`OutlierMethod`]. Removing the flagged rows is the processor's
//! job, not the detector's.

mod isolation_forest;

pub use isolation_forest::IsolationForest;

use crate::config::{OutlierMethod, OutlierSettings};
use crate::stages::OutlierDetector;
use crate::utils::{finite_values, mean_std, numeric_column_names, quantile_sorted, to_f64_values};
use anyhow::Result;
use ndarray::Array2;
use polars::prelude::*;
use tracing::debug;

/// Default [`OutlierDetector`] supporting isolation forest, IQR and z-score.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticalOutlierDetector;

impl StatisticalOutlierDetector {
    /// Flag the `floor(rows * contamination)` rows with the highest
    /// isolation-forest anomaly scores.
    pub fn isolation_forest_mask(&self, df: &DataFrame, settings: &OutlierSettings) -> Result<Vec<bool>> {
        let n_rows = df.height();
        let n_flagged = (n_rows as f64 * settings.contamination).floor() as usize;
        let data = numeric_matrix(df)?;
        if n_flagged == 0 || data.ncols() == 0 || n_rows < 2 {
            return Ok(vec![false; n_rows]);
        }

        let forest = IsolationForest::fit(
            &data,
            settings.n_estimators,
            settings.max_samples,
            settings.random_seed,
        );
        let scores = forest.score(&data);

        let mut order: Vec<usize> = (0..n_rows).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut mask = vec![false; n_rows];
        for &row in order.iter().take(n_flagged) {
            mask[row] = true;
        }
        debug!(
            "Isolation forest flagged {} of {} rows (contamination {})",
            n_flagged, n_rows, settings.contamination
        );
        Ok(mask)
    }

    /// Flag rows with any numeric value outside `[Q1 - k*IQR, Q3 + k*IQR]`.
    /// Quartiles come from the finite values, so infinities are flagged.
    pub fn iqr_mask(&self, df: &DataFrame, multiplier: f64) -> Result<Vec<bool>> {
        let mut mask = vec![false; df.height()];
        for name in numeric_column_names(df) {
            let values = to_f64_values(df.column(&name)?.as_materialized_series())?;
            let mut sorted = finite_values(&values);
            sorted.sort_by(f64::total_cmp);

            let (Some(q1), Some(q3)) = (quantile_sorted(&sorted, 0.25), quantile_sorted(&sorted, 0.75))
            else {
                continue;
            };
            let iqr = q3 - q1;
            let lower = q1 - multiplier * iqr;
            let upper = q3 + multiplier * iqr;

            for (flag, value) in mask.iter_mut().zip(&values) {
                if let Some(v) = value
                    && (*v < lower || *v > upper)
                {
                    *flag = true;
                }
            }
        }
        Ok(mask)
    }

    /// Flag rows with any numeric value whose |z| exceeds `threshold`.
    /// Zero-variance columns never flag.
    pub fn zscore_mask(&self, df: &DataFrame, threshold: f64) -> Result<Vec<bool>> {
        let mut mask = vec![false; df.height()];
        for name in numeric_column_names(df) {
            let values = to_f64_values(df.column(&name)?.as_materialized_series())?;
            let Some((mean, std)) = mean_std(&values) else {
                continue;
            };
            if std == 0.0 {
                continue;
            }
            for (flag, value) in mask.iter_mut().zip(&values) {
                if let Some(v) = value
                    && ((v - mean) / std).abs() > threshold
                {
                    *flag = true;
                }
            }
        }
        Ok(mask)
    }
}

impl OutlierDetector for StatisticalOutlierDetector {
    fn detect(&self, df: &DataFrame, settings: &OutlierSettings) -> Result<BooleanChunked> {
        let mask = match settings.method {
            OutlierMethod::IsolationForest => self.isolation_forest_mask(df, settings)?,
            OutlierMethod::Iqr => self.iqr_mask(df, settings.iqr_multiplier)?,
            OutlierMethod::ZScore => self.zscore_mask(df, settings.zscore_threshold)?,
        };
        Ok(BooleanChunked::from_slice("outlier".into(), &mask))
    }
}

/// Dense matrix of all numeric columns. Nulls, NaN and infinities are
/// replaced by the mean of the column's finite values.
pub(crate) fn numeric_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let names = numeric_column_names(df);
    let mut data = Array2::zeros((df.height(), names.len()));
    for (j, name) in names.iter().enumerate() {
        let values = to_f64_values(df.column(name)?.as_materialized_series())?;
        let fill = mean_std(&values).map(|(mean, _)| mean).unwrap_or(0.0);
        for (i, value) in values.into_iter().enumerate() {
            data[[i, j]] = value.filter(|v| v.is_finite()).unwrap_or(fill);
        }
    }
    Ok(data)
}
