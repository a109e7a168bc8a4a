//! The drilling data processor.
//!
//! [`DrillingProcessor`] owns the current dataset and drives it through the
//! fixed stage sequence, moving the dataset by value from one stage to the
//! next.

use super::builder::DrillingProcessorBuilder;
use super::io;
use crate::config::{ConfigError, ProcessorConfig};
use crate::error::{ProcessingError, Result};
use crate::logging::{LogLevel, ProcessingLogger};
use crate::stages::{Cleaner, FeatureEngineer, OutlierDetector, QualityChecker, Stage};
use crate::types::QualityReport;
use crate::validation::DataValidator;
use anyhow::bail;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Lifecycle state of a [`DrillingProcessor`].
///
/// ```text
/// Uninitialized -> Loaded -> Cleaned -> OutlierFiltered -> FeatureEngineered -> QualityChecked
///                                 (any stage failure) -> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessorState {
    Uninitialized,
    Loaded,
    Cleaned,
    OutlierFiltered,
    FeatureEngineered,
    QualityChecked,
    Failed,
}

impl ProcessorState {
    /// State a stage must start from.
    pub fn before(stage: Stage) -> Self {
        match stage {
            Stage::Clean => Self::Loaded,
            Stage::HandleOutliers => Self::Cleaned,
            Stage::EngineerFeatures => Self::OutlierFiltered,
            Stage::CheckQuality => Self::FeatureEngineered,
        }
    }

    /// State reached when a stage succeeds.
    pub fn after(stage: Stage) -> Self {
        match stage {
            Stage::Clean => Self::Cleaned,
            Stage::HandleOutliers => Self::OutlierFiltered,
            Stage::EngineerFeatures => Self::FeatureEngineered,
            Stage::CheckQuality => Self::QualityChecked,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loaded => "loaded",
            Self::Cleaned => "cleaned",
            Self::OutlierFiltered => "outlier_filtered",
            Self::FeatureEngineered => "feature_engineered",
            Self::QualityChecked => "quality_checked",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestrates loading, validation and the four processing stages.
///
/// Use [`DrillingProcessor::builder()`] to inject a logger, a validator or
/// alternative stage implementations.
///
/// # Example
///
/// ```rust,ignore
/// use drill_processing::{DrillingProcessor, ProcessorConfig};
///
/// let mut processor = DrillingProcessor::new(ProcessorConfig::default())?;
/// processor.load("well_17.parquet")?;
/// let processed = processor.run()?;
/// println!("{} rows after processing", processed.height());
///
/// let report = processor.quality_report().unwrap();
/// println!("Quality score: {:.2}", report.score);
/// ```
pub struct DrillingProcessor {
    pub(super) config: ProcessorConfig,
    pub(super) logger: Arc<dyn ProcessingLogger>,
    pub(super) validator: DataValidator,
    pub(super) cleaner: Box<dyn Cleaner>,
    pub(super) outlier_detector: Box<dyn OutlierDetector>,
    pub(super) feature_engineer: Box<dyn FeatureEngineer>,
    pub(super) quality_checker: Box<dyn QualityChecker>,
    pub(super) data: Option<DataFrame>,
    pub(super) state: ProcessorState,
    pub(super) quality_report: Option<QualityReport>,
}

// The processor can be handed to a worker thread.
static_assertions::assert_impl_all!(DrillingProcessor: Send);

impl DrillingProcessor {
    /// Create a new processor builder.
    pub fn builder() -> DrillingProcessorBuilder {
        DrillingProcessorBuilder::default()
    }

    /// Processor with default logger, validator and stages.
    pub fn new(config: ProcessorConfig) -> std::result::Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    pub fn state(&self) -> ProcessorState {
        self.state
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// The current dataset, if one is loaded.
    pub fn data(&self) -> Option<&DataFrame> {
        self.data.as_ref()
    }

    /// Consume the processor and return its dataset.
    pub fn into_data(self) -> Option<DataFrame> {
        self.data
    }

    /// Report from the last successful quality check.
    pub fn quality_report(&self) -> Option<&QualityReport> {
        self.quality_report.as_ref()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Load a dataset from a parquet, CSV or IPC file.
    ///
    /// Can be called in any state. On success the processor is `Loaded` and
    /// any previous report is cleared; on failure it is `Uninitialized`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.reset();

        let df = match io::read_frame(path) {
            Ok(df) => df,
            Err(e) => return Err(self.log_error(e)),
        };
        self.accept(df, &path.display().to_string())
    }

    /// Load an in-memory dataset under the same contract as [`load`](Self::load).
    pub fn load_frame(&mut self, df: DataFrame) -> Result<()> {
        self.reset();
        self.accept(df, "in-memory frame")
    }

    fn reset(&mut self) {
        self.data = None;
        self.quality_report = None;
        self.state = ProcessorState::Uninitialized;
    }

    fn accept(&mut self, df: DataFrame, source: &str) -> Result<()> {
        if df.width() == 0 || df.height() == 0 {
            return Err(self.log_error(ProcessingError::DataLoad(format!(
                "{} contains no data",
                source
            ))));
        }

        let (is_valid, message) = self.validator.validate(&df);
        if !is_valid {
            return Err(self.log_error(ProcessingError::Validation(message)));
        }

        self.log(
            &format!(
                "Loaded {} rows x {} columns from {}",
                df.height(),
                df.width(),
                source
            ),
            LogLevel::Info,
        );
        self.data = Some(df);
        self.state = ProcessorState::Loaded;
        Ok(())
    }

    // ========================================================================
    // Stages
    // ========================================================================

    /// Run clean -> handle outliers -> engineer features -> check quality.
    ///
    /// Requires a freshly loaded dataset. Stops at the first failing stage.
    pub fn run(&mut self) -> Result<&DataFrame> {
        if self.state != ProcessorState::Loaded {
            return Err(self.precondition(format!(
                "run() requires a loaded dataset, current state is '{}'",
                self.state
            )));
        }
        self.require_data()?;

        self.log("Starting drilling data processing", LogLevel::Info);
        self.clean()?;
        self.handle_outliers()?;
        self.engineer_features()?;
        self.check_quality()?;
        self.log("Drilling data processing complete", LogLevel::Info);

        match self.data.as_ref() {
            Some(df) => Ok(df),
            None => Err(ProcessingError::Precondition(
                "Dataset missing after processing".to_string(),
            )),
        }
    }

    /// Impute missing values and drop exact duplicate rows.
    pub fn clean(&mut self) -> Result<()> {
        let df = self.begin(Stage::Clean)?;
        let strategy = self.config.imputation_strategy;

        match self.cleaner.clean(df, strategy) {
            Ok(df) => {
                self.complete(Stage::Clean, df);
                Ok(())
            }
            Err(e) => Err(self.fail(Stage::Clean, e)),
        }
    }

    /// Remove the rows the outlier detector flags, unless removal is disabled.
    pub fn handle_outliers(&mut self) -> Result<()> {
        let df = self.begin(Stage::HandleOutliers)?;

        if !self.config.remove_outliers {
            self.log(
                &format!("Outlier removal disabled, keeping all {} rows", df.height()),
                LogLevel::Info,
            );
            self.complete(Stage::HandleOutliers, df);
            return Ok(());
        }

        let result = self
            .outlier_detector
            .detect(&df, &self.config.outliers)
            .and_then(|mask| remove_flagged(df, &mask));

        match result {
            Ok((df, removed)) => {
                self.log(
                    &format!(
                        "Removed {} outlier rows using {}",
                        removed, self.config.outliers.method
                    ),
                    LogLevel::Info,
                );
                self.complete(Stage::HandleOutliers, df);
                Ok(())
            }
            Err(e) => Err(self.fail(Stage::HandleOutliers, e)),
        }
    }

    /// Add derived drilling features. The row count must not change.
    pub fn engineer_features(&mut self) -> Result<()> {
        let df = self.begin(Stage::EngineerFeatures)?;
        let rows = df.height();

        let result = self
            .feature_engineer
            .engineer(df, &self.config.features)
            .and_then(|out| {
                if out.height() != rows {
                    bail!(
                        "Feature engineering changed the row count from {} to {}",
                        rows,
                        out.height()
                    );
                }
                Ok(out)
            });

        match result {
            Ok(df) => {
                self.complete(Stage::EngineerFeatures, df);
                Ok(())
            }
            Err(e) => Err(self.fail(Stage::EngineerFeatures, e)),
        }
    }

    /// Produce and store the quality report. The dataset is not changed.
    pub fn check_quality(&mut self) -> Result<()> {
        let df = self.begin(Stage::CheckQuality)?;

        match self.quality_checker.check(&df) {
            Ok(report) => {
                self.log(
                    &format!(
                        "Quality score {:.3} with {} issues",
                        report.score,
                        report.issues.len()
                    ),
                    LogLevel::Info,
                );
                self.quality_report = Some(report);
                self.complete(Stage::CheckQuality, df);
                Ok(())
            }
            Err(e) => Err(self.fail(Stage::CheckQuality, e)),
        }
    }

    /// Check preconditions, log the start event and take the dataset.
    fn begin(&mut self, stage: Stage) -> Result<DataFrame> {
        self.require_data()?;

        let expected = ProcessorState::before(stage);
        if self.state != expected {
            return Err(self.precondition(format!(
                "Stage '{}' requires state '{}', current state is '{}'",
                stage, expected, self.state
            )));
        }

        self.log(&format!("Starting stage '{}'", stage), LogLevel::Info);
        self.data
            .take()
            .ok_or_else(|| ProcessingError::Precondition("No dataset loaded".to_string()))
    }

    fn complete(&mut self, stage: Stage, df: DataFrame) {
        self.log(
            &format!(
                "Completed stage '{}': {} rows x {} columns",
                stage,
                df.height(),
                df.width()
            ),
            LogLevel::Debug,
        );
        self.data = Some(df);
        self.state = ProcessorState::after(stage);
    }

    /// Record a stage failure. The dataset is dropped.
    fn fail(&mut self, stage: Stage, error: anyhow::Error) -> ProcessingError {
        self.log(&format!("Stage '{}' failed: {:#}", stage, error), LogLevel::Error);
        self.data = None;
        self.state = ProcessorState::Failed;
        ProcessingError::stage_failed(stage, error)
    }

    fn require_data(&self) -> Result<()> {
        match &self.data {
            None => Err(self.precondition("No dataset loaded".to_string())),
            Some(df) if df.height() == 0 => Err(self.precondition("Dataset is empty".to_string())),
            Some(_) => Ok(()),
        }
    }

    fn precondition(&self, message: String) -> ProcessingError {
        self.log_error(ProcessingError::Precondition(message))
    }

    fn log_error(&self, error: ProcessingError) -> ProcessingError {
        self.log(&error.to_string(), LogLevel::Error);
        error
    }

    fn log(&self, message: &str, level: LogLevel) {
        self.logger.log(message, level);
    }
}

/// Drop rows where `mask` is true. Returns the filtered frame and the number
/// of removed rows.
fn remove_flagged(df: DataFrame, mask: &BooleanChunked) -> anyhow::Result<(DataFrame, usize)> {
    if mask.len() != df.height() {
        bail!(
            "Outlier mask has {} entries for {} rows",
            mask.len(),
            df.height()
        );
    }
    if mask.null_count() > 0 {
        bail!("Outlier mask contains {} null entries", mask.null_count());
    }

    let keep: BooleanChunked = mask.into_iter().map(|flag| flag.map(|f| !f)).collect();
    let removed = mask.into_iter().filter(|flag| *flag == Some(true)).count();
    let filtered = df.filter(&keep)?;
    Ok((filtered, removed))
}
