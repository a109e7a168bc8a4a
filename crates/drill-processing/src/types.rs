use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Quality Report Types
// ============================================================================

/// Structured summary of dataset health produced by the quality check stage.
///
/// Serializes to JSON for the `--report` output of the CLI.
///
/// # Example
///
/// ```rust,ignore
/// let report = processor.quality_report().unwrap();
/// println!("Quality score {:.2} over {} rows", report.score, report.row_count);
/// for issue in &report.issues {
///     println!("{}: {}", issue.column, issue.message);
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// RFC 3339 timestamp of when the report was generated.
    pub generated_at: String,

    pub row_count: usize,
    pub column_count: usize,

    /// Total number of null cells.
    pub total_missing: usize,
    /// Null cells per column, only for columns that have any.
    pub missing_by_column: BTreeMap<String, usize>,
    /// Rows that exactly repeat an earlier row.
    pub duplicate_rows: usize,
    /// Ratio of non-null cells to all cells (0.0 - 1.0).
    pub completeness: f64,

    /// Per-column statistics for numeric columns, in column order.
    pub numeric_summaries: Vec<NumericSummary>,

    pub issues: Vec<QualityIssue>,

    /// Overall score (0.0 - 1.0): completeness minus penalties for
    /// duplicates and issues.
    pub score: f64,
}

impl QualityReport {
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }

    /// Issues of a given kind.
    pub fn issues_of(&self, kind: IssueKind) -> impl Iterator<Item = &QualityIssue> {
        self.issues.iter().filter(move |issue| issue.kind == kind)
    }

    /// Summary for a numeric column, if it was summarized.
    pub fn summary(&self, column: &str) -> Option<&NumericSummary> {
        self.numeric_summaries.iter().find(|s| s.column == column)
    }
}

/// Descriptive statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub column: String,
    /// Non-null values.
    pub count: usize,
    pub missing: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Population standard deviation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
}

/// One problem found by the quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub column: String,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The column still has null values.
    MissingValues,
    /// A numeric column holds a single distinct value.
    ConstantColumn,
    /// A physically non-negative measurement has negative values.
    NegativeValues,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingValues => "missing_values",
            Self::ConstantColumn => "constant_column",
            Self::NegativeValues => "negative_values",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
