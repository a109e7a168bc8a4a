//! Classifier pipeline: column transformers followed by a random forest.
//!
//! # Example
//!
//! ```rust,ignore
//! use drill_learning::build_ml_pipeline;
//!
//! let mut pipeline = build_ml_pipeline(
//!     &["depth", "pressure", "pt_ratio"],
//!     &["formation"],
//! );
//! pipeline.fit(&training_frame, "lithology")?;
//! let labels = pipeline.predict(&new_frame)?;
//! ```

use crate::config::ModelPipelineConfig;
use crate::error::{LearningError, Result};
use crate::forest::RandomForestClassifier;
use crate::preprocess::Preprocessor;
use polars::prelude::*;

/// Build an unfitted pipeline with the default forest settings.
///
/// Numeric features are median-imputed and standard-scaled; categorical
/// features are imputed with `"missing"` and one-hot encoded.
pub fn build_ml_pipeline<N, C>(numeric_features: &[N], categorical_features: &[C]) -> ModelPipeline
where
    N: AsRef<str>,
    C: AsRef<str>,
{
    ModelPipeline::new(
        numeric_features,
        categorical_features,
        ModelPipelineConfig::default(),
    )
}

struct FittedPipeline {
    preprocessor: Preprocessor,
    forest: RandomForestClassifier,
    classes: Vec<String>,
}

/// Preprocessing plus random forest classifier over named columns.
///
/// # Lifecycle
///
/// 1. Create with [`build_ml_pipeline`] or [`ModelPipeline::new`]
/// 2. Call [`fit()`](Self::fit) with a frame and the target column name
/// 3. Call [`predict()`](Self::predict) on frames with the same feature columns
pub struct ModelPipeline {
    numeric_features: Vec<String>,
    categorical_features: Vec<String>,
    config: ModelPipelineConfig,
    fitted: Option<FittedPipeline>,
}

static_assertions::assert_impl_all!(ModelPipeline: Send, Sync);

impl std::fmt::Debug for ModelPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelPipeline")
            .field("numeric_features", &self.numeric_features)
            .field("categorical_features", &self.categorical_features)
            .field("config", &self.config)
            .field("fitted", &self.is_fitted())
            .finish()
    }
}

impl ModelPipeline {
    pub fn new<N, C>(
        numeric_features: &[N],
        categorical_features: &[C],
        config: ModelPipelineConfig,
    ) -> Self
    where
        N: AsRef<str>,
        C: AsRef<str>,
    {
        Self {
            numeric_features: numeric_features.iter().map(|s| s.as_ref().to_string()).collect(),
            categorical_features: categorical_features
                .iter()
                .map(|s| s.as_ref().to_string())
                .collect(),
            config,
            fitted: None,
        }
    }

    /// Fit transformers and classifier on `df`, predicting `target`.
    ///
    /// # Errors
    ///
    /// - [`LearningError::InvalidData`] if no features are configured, the
    ///   frame is empty, or the target has nulls
    /// - [`LearningError::TargetNotFound`] / [`LearningError::FeatureNotFound`]
    ///   for missing columns
    pub fn fit(&mut self, df: &DataFrame, target: &str) -> Result<()> {
        if self.numeric_features.is_empty() && self.categorical_features.is_empty() {
            return Err(LearningError::InvalidData(
                "no feature columns configured".to_string(),
            ));
        }
        if df.height() == 0 {
            return Err(LearningError::InvalidData("DataFrame has no rows".to_string()));
        }

        let labels = read_target(df, target)?;
        let mut classes: Vec<String> = labels.clone();
        classes.sort();
        classes.dedup();
        let y: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or(0))
            .collect();

        let preprocessor =
            Preprocessor::fit(df, &self.numeric_features, &self.categorical_features)?;
        let x = preprocessor.transform(df)?;
        if x.ncols() == 0 {
            return Err(LearningError::InvalidData(
                "feature columns produced no encoded values".to_string(),
            ));
        }

        let forest = RandomForestClassifier::fit(&x, &y, classes.len(), &self.config);
        self.fitted = Some(FittedPipeline {
            preprocessor,
            forest,
            classes,
        });
        Ok(())
    }

    /// Predict a class label for every row of `df`.
    ///
    /// # Errors
    ///
    /// Returns [`LearningError::NotFitted`] before [`fit()`](Self::fit).
    pub fn predict(&self, df: &DataFrame) -> Result<Vec<String>> {
        let fitted = self.fitted.as_ref().ok_or(LearningError::NotFitted)?;
        let x = fitted.preprocessor.transform(df)?;
        Ok(fitted
            .forest
            .predict(&x)
            .into_iter()
            .map(|k| fitted.classes[k].clone())
            .collect())
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Class labels in encoded order, once fitted.
    pub fn classes(&self) -> Option<&[String]> {
        self.fitted.as_ref().map(|f| f.classes.as_slice())
    }

    /// Names of the encoded feature matrix columns, once fitted.
    pub fn feature_names(&self) -> Option<Vec<String>> {
        self.fitted.as_ref().map(|f| f.preprocessor.output_names())
    }

    pub fn numeric_features(&self) -> &[String] {
        &self.numeric_features
    }

    pub fn categorical_features(&self) -> &[String] {
        &self.categorical_features
    }

    pub fn config(&self) -> &ModelPipelineConfig {
        &self.config
    }
}

fn read_target(df: &DataFrame, target: &str) -> Result<Vec<String>> {
    let series = df
        .column(target)
        .map_err(|_| LearningError::TargetNotFound(target.to_string()))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    if series.null_count() > 0 {
        return Err(LearningError::InvalidData(format!(
            "target column '{}' has {} null values",
            target,
            series.null_count()
        )));
    }
    Ok(series
        .str()?
        .into_no_null_iter()
        .map(str::to_string)
        .collect())
}
