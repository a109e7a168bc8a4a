//! Column transformers applied before the classifier.
//!
//! - Numeric columns: median imputation, then standard scaling.
//! - Categorical columns: constant `"missing"` imputation, then one-hot
//!   encoding. Categories unseen during fit encode as all zeros.

use crate::error::{LearningError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Fill value for missing categorical entries.
pub const MISSING_CATEGORY: &str = "missing";

/// Replaces nulls (and non-finite values) with the column median seen at fit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: Vec<f64>,
}

impl MedianImputer {
    pub fn fit(columns: &[Vec<Option<f64>>]) -> Self {
        let medians = columns
            .iter()
            .map(|values| {
                let mut present: Vec<f64> =
                    values.iter().flatten().copied().filter(|v| v.is_finite()).collect();
                median(&mut present).unwrap_or(0.0)
            })
            .collect();
        Self { medians }
    }

    pub fn transform(&self, columns: &[Vec<Option<f64>>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .zip(&self.medians)
            .map(|(values, &fill)| {
                values
                    .iter()
                    .map(|v| v.filter(|x| x.is_finite()).unwrap_or(fill))
                    .collect()
            })
            .collect()
    }

    pub fn medians(&self) -> &[f64] {
        &self.medians
    }
}

/// Centers each column on its mean and divides by its population standard
/// deviation. Zero-variance columns are only centered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    means: Vec<f64>,
    scales: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(columns: &[Vec<f64>]) -> Self {
        let (means, scales): (Vec<f64>, Vec<f64>) = columns
            .iter()
            .map(|values| {
                if values.is_empty() {
                    return (0.0, 1.0);
                }
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std = var.sqrt();
                (mean, if std > 0.0 { std } else { 1.0 })
            })
            .unzip();
        Self { means, scales }
    }

    pub fn transform(&self, columns: &[Vec<f64>]) -> Vec<Vec<f64>> {
        columns
            .iter()
            .zip(self.means.iter().zip(&self.scales))
            .map(|(values, (mean, scale))| values.iter().map(|v| (v - mean) / scale).collect())
            .collect()
    }
}

/// One-hot encoder with sorted category lists per column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Vec<String>>,
}

impl OneHotEncoder {
    pub fn fit(columns: &[Vec<String>]) -> Self {
        let categories = columns
            .iter()
            .map(|values| {
                let mut cats: Vec<String> = values.to_vec();
                cats.sort();
                cats.dedup();
                cats
            })
            .collect();
        Self { categories }
    }

    /// Encoded columns, `categories[i].len()` per input column.
    pub fn transform(&self, columns: &[Vec<String>]) -> Vec<Vec<f64>> {
        let mut encoded = Vec::new();
        for (values, cats) in columns.iter().zip(&self.categories) {
            for cat in cats {
                encoded.push(
                    values
                        .iter()
                        .map(|v| if v == cat { 1.0 } else { 0.0 })
                        .collect(),
                );
            }
        }
        encoded
    }

    pub fn categories(&self) -> &[Vec<String>] {
        &self.categories
    }
}

/// Fitted numeric + categorical transformers over named columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    imputer: MedianImputer,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
}

impl Preprocessor {
    /// Fit all transformers on `df`.
    pub fn fit(
        df: &DataFrame,
        numeric_features: &[String],
        categorical_features: &[String],
    ) -> Result<Self> {
        let numeric = read_numeric(df, numeric_features)?;
        let imputer = MedianImputer::fit(&numeric);
        let scaler = StandardScaler::fit(&imputer.transform(&numeric));
        let encoder = OneHotEncoder::fit(&read_categorical(df, categorical_features)?);

        Ok(Self {
            numeric_features: numeric_features.to_vec(),
            categorical_features: categorical_features.to_vec(),
            imputer,
            scaler,
            encoder,
        })
    }

    /// Transform `df` into a dense `(rows, n_outputs)` matrix.
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        let numeric = read_numeric(df, &self.numeric_features)?;
        let scaled = self.scaler.transform(&self.imputer.transform(&numeric));
        let encoded = self
            .encoder
            .transform(&read_categorical(df, &self.categorical_features)?);

        let rows = df.height();
        let columns: Vec<Vec<f64>> = scaled.into_iter().chain(encoded).collect();
        let mut matrix = Array2::zeros((rows, columns.len()));
        for (j, column) in columns.iter().enumerate() {
            for (i, value) in column.iter().enumerate() {
                matrix[[i, j]] = *value;
            }
        }
        Ok(matrix)
    }

    /// Names of the output columns, e.g. `depth` or `formation=shale`.
    pub fn output_names(&self) -> Vec<String> {
        let mut names = self.numeric_features.clone();
        for (feature, cats) in self.categorical_features.iter().zip(self.encoder.categories()) {
            names.extend(cats.iter().map(|cat| format!("{}={}", feature, cat)));
        }
        names
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

fn feature_series(df: &DataFrame, name: &str) -> Result<Series> {
    df.column(name)
        .map(|c| c.as_materialized_series().clone())
        .map_err(|_| LearningError::FeatureNotFound(name.to_string()))
}

fn read_numeric(df: &DataFrame, names: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    names
        .iter()
        .map(|name| {
            let series = feature_series(df, name)?.cast(&DataType::Float64)?;
            Ok(series.f64()?.into_iter().collect())
        })
        .collect()
}

fn read_categorical(df: &DataFrame, names: &[String]) -> Result<Vec<Vec<String>>> {
    names
        .iter()
        .map(|name| {
            let series = feature_series(df, name)?.cast(&DataType::String)?;
            Ok(series
                .str()?
                .into_iter()
                .map(|v| v.unwrap_or(MISSING_CATEGORY).to_string())
                .collect())
        })
        .collect()
}
