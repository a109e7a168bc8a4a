//! Builder for [`DrillingProcessor`].

use super::processor::{DrillingProcessor, ProcessorState};
use crate::cleaner::DataCleaner;
use crate::config::{ConfigError, ProcessorConfig};
use crate::features::DrillingFeatureEngineer;
use crate::logging::{ClosureLogger, LogLevel, ProcessingLogger, TracingLogger};
use crate::outliers::StatisticalOutlierDetector;
use crate::quality::DataQualityChecker;
use crate::stages::{Cleaner, FeatureEngineer, OutlierDetector, QualityChecker};
use crate::validation::DataValidator;
use std::sync::Arc;

/// Builder for creating a [`DrillingProcessor`].
///
/// Every component is optional; unset components fall back to the defaults
/// driven by the configuration.
#[derive(Default)]
pub struct DrillingProcessorBuilder {
    config: Option<ProcessorConfig>,
    logger: Option<Arc<dyn ProcessingLogger>>,
    validator: Option<DataValidator>,
    cleaner: Option<Box<dyn Cleaner>>,
    outlier_detector: Option<Box<dyn OutlierDetector>>,
    feature_engineer: Option<Box<dyn FeatureEngineer>>,
    quality_checker: Option<Box<dyn QualityChecker>>,
}

static_assertions::assert_impl_all!(DrillingProcessorBuilder: Send);

impl DrillingProcessorBuilder {
    /// Set the processor configuration.
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the event logger.
    ///
    /// Use `Arc` so the caller can keep a handle to the same logger, for
    /// example a [`MemoryLogger`](crate::logging::MemoryLogger) whose events
    /// are inspected after the run.
    pub fn logger(mut self, logger: Arc<dyn ProcessingLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Set a logging callback closure.
    ///
    /// This is a convenience method for simple event handling.
    /// For more complex scenarios, use [`logger`](Self::logger).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let processor = DrillingProcessor::builder()
    ///     .on_log(|message, level| println!("[{}] {}", level, message))
    ///     .build()?;
    /// ```
    pub fn on_log<F>(mut self, callback: F) -> Self
    where
        F: Fn(&str, LogLevel) + Send + Sync + 'static,
    {
        self.logger = Some(Arc::new(ClosureLogger::new(callback)));
        self
    }

    /// Override the validator. By default it is derived from the config's
    /// `required_columns` and `min_rows`.
    pub fn validator(mut self, validator: DataValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn cleaner(mut self, cleaner: impl Cleaner + 'static) -> Self {
        self.cleaner = Some(Box::new(cleaner));
        self
    }

    pub fn outlier_detector(mut self, detector: impl OutlierDetector + 'static) -> Self {
        self.outlier_detector = Some(Box::new(detector));
        self
    }

    pub fn feature_engineer(mut self, engineer: impl FeatureEngineer + 'static) -> Self {
        self.feature_engineer = Some(Box::new(engineer));
        self
    }

    pub fn quality_checker(mut self, checker: impl QualityChecker + 'static) -> Self {
        self.quality_checker = Some(Box::new(checker));
        self
    }

    /// Build the processor.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> Result<DrillingProcessor, ConfigError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let validator = self
            .validator
            .unwrap_or_else(|| DataValidator::from_config(&config));

        Ok(DrillingProcessor {
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
            validator,
            cleaner: self.cleaner.unwrap_or_else(|| Box::new(DataCleaner)),
            outlier_detector: self
                .outlier_detector
                .unwrap_or_else(|| Box::new(StatisticalOutlierDetector)),
            feature_engineer: self
                .feature_engineer
                .unwrap_or_else(|| Box::new(DrillingFeatureEngineer)),
            quality_checker: self
                .quality_checker
                .unwrap_or_else(|| Box::new(DataQualityChecker)),
            config,
            data: None,
            state: ProcessorState::Uninitialized,
            quality_report: None,
        })
    }
}
