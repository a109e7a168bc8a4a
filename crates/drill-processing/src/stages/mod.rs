//! Stage contracts for the fixed processing pipeline.
//!
//! Each stage is a trait with a single entry point so the processor can be
//! given alternative implementations. Implementations hold no state between
//! calls. Transforming stages take the dataset by value and return a new
//! owned dataset; analyzing stages borrow it.
//!
//! | Stage | Trait | Default implementation |
//! |-------|-------|------------------------|
//! | [`Stage::Clean`] | [`Cleaner`] | [`DataCleaner`](crate::cleaner::DataCleaner) |
//! | [`Stage::HandleOutliers`] | [`OutlierDetector`] | [`StatisticalOutlierDetector`](crate::outliers::StatisticalOutlierDetector) |
//! | [`Stage::EngineerFeatures`] | [`FeatureEngineer`] | [`DrillingFeatureEngineer`](crate::features::DrillingFeatureEngineer) |
//! | [`Stage::CheckQuality`] | [`QualityChecker`] | [`DataQualityChecker`](crate::quality::DataQualityChecker) |

use crate::config::{FeatureSettings, ImputationStrategy, OutlierSettings};
use crate::types::QualityReport;
use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Clean,
    HandleOutliers,
    EngineerFeatures,
    CheckQuality,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::Clean,
        Stage::HandleOutliers,
        Stage::EngineerFeatures,
        Stage::CheckQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::HandleOutliers => "handle_outliers",
            Self::EngineerFeatures => "engineer_features",
            Self::CheckQuality => "check_quality",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Missing-value imputation followed by duplicate-row removal.
pub trait Cleaner: Send + Sync {
    /// Return a dataset with no missing values in imputed columns and no
    /// exact duplicate rows (first occurrence kept, order preserved).
    fn clean(&self, df: DataFrame, strategy: ImputationStrategy) -> Result<DataFrame>;
}

/// Flags rows to exclude.
pub trait OutlierDetector: Send + Sync {
    /// Return one boolean per row; `true` marks a row for removal.
    fn detect(&self, df: &DataFrame, settings: &OutlierSettings) -> Result<BooleanChunked>;
}

/// Adds derived columns. Must not add or remove rows.
pub trait FeatureEngineer: Send + Sync {
    fn engineer(&self, df: DataFrame, settings: &FeatureSettings) -> Result<DataFrame>;
}

/// Summarizes dataset health without modifying it.
pub trait QualityChecker: Send + Sync {
    fn check(&self, df: &DataFrame) -> Result<QualityReport>;
}
