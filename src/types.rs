//! Record and report types produced by the cleaning session.
//!
//! Everything here is serializable: outlier records are the audit trail of a
//! cleaning session, and summary/comparison types are shipped to callers as
//! JSON in embedding applications.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// The three outlier-detection algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Interquartile-range fences.
    Iqr,
    /// Standard Z-score against mean and sample standard deviation.
    Zscore,
    /// Median/MAD-based robust Z-score.
    ModifiedZscore,
}

impl DetectionMethod {
    /// All methods, in presentation order.
    pub const ALL: [DetectionMethod; 3] = [Self::Iqr, Self::Zscore, Self::ModifiedZscore];

    /// Get a human-readable display name for the method.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Iqr => "IQR",
            Self::Zscore => "Z-score",
            Self::ModifiedZscore => "Modified Z-score",
        }
    }
}

/// Method selection for batch cleaning: a fixed algorithm or per-column
/// automatic selection via distribution analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CleaningMethod {
    Iqr,
    Zscore,
    ModifiedZscore,
    /// Analyze each column's distribution and pick the method per column.
    #[default]
    Auto,
}

impl CleaningMethod {
    /// The fixed detection method, or `None` for automatic selection.
    pub fn detection(&self) -> Option<DetectionMethod> {
        match self {
            Self::Iqr => Some(DetectionMethod::Iqr),
            Self::Zscore => Some(DetectionMethod::Zscore),
            Self::ModifiedZscore => Some(DetectionMethod::ModifiedZscore),
            Self::Auto => None,
        }
    }
}

/// Threshold parameters for a detection run. The variant determines the
/// algorithm: IQR takes a factor pair, the Z-score variants a single cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ThresholdSpec {
    IqrFactors { lower: f64, upper: f64 },
    Zscore { threshold: f64 },
    ModifiedZscore { threshold: f64 },
}

impl ThresholdSpec {
    /// Default parameters for a method: 1.5/1.5 IQR fences, Z cutoff 3.0,
    /// modified-Z cutoff 3.5.
    pub fn default_for(method: DetectionMethod) -> Self {
        match method {
            DetectionMethod::Iqr => Self::IqrFactors {
                lower: 1.5,
                upper: 1.5,
            },
            DetectionMethod::Zscore => Self::Zscore { threshold: 3.0 },
            DetectionMethod::ModifiedZscore => Self::ModifiedZscore { threshold: 3.5 },
        }
    }

    /// The method this threshold parameterizes.
    pub fn method(&self) -> DetectionMethod {
        match self {
            Self::IqrFactors { .. } => DetectionMethod::Iqr,
            Self::Zscore { .. } => DetectionMethod::Zscore,
            Self::ModifiedZscore { .. } => DetectionMethod::ModifiedZscore,
        }
    }
}

/// Secondary dispersion measure used when the primary one degenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// MAD was zero; scores were computed against the mean absolute
    /// deviation from the median instead.
    MeanAbsoluteDeviation,
}

/// Basic descriptive statistics of a column, captured before and after a
/// removal. Fields are `None` when the column has no valid values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DescriptiveStats {
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl DescriptiveStats {
    /// Stats of an empty column.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Audit record of one detection-and-removal operation on a column.
///
/// Overwritten when a detector is re-run on the same column ("latest wins").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierRecord {
    /// Column the detector ran on.
    pub column: String,
    /// Algorithm used.
    pub method: DetectionMethod,
    /// Threshold parameters actually used.
    pub threshold: ThresholdSpec,
    /// Fallback dispersion measure, when the primary one was degenerate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPolicy>,
    /// Number of rows flagged and removed.
    pub n_outliers: usize,
    /// Flagged rows as a percentage of the column's valid (non-null,
    /// non-NaN) rows.
    pub pct_outliers: f64,
    /// Row labels removed, as they stood in the working copy at the time of
    /// removal.
    pub removed_labels: BTreeSet<u32>,
    /// Column statistics before removal.
    pub stats_before: DescriptiveStats,
    /// Column statistics after removal.
    pub stats_after: DescriptiveStats,
}

/// Result of distribution analysis on a single column.
///
/// Ephemeral: returned to the caller, never stored in session state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionAnalysis {
    /// Fisher-Pearson skewness (third standardized moment).
    pub skewness: f64,
    /// Excess kurtosis (fourth standardized moment minus 3).
    pub kurtosis: f64,
    /// Heuristic normality verdict based on skewness and kurtosis bounds.
    pub is_normal: bool,
    /// Method recommended for this distribution shape.
    pub recommended_method: DetectionMethod,
    /// Threshold recommended alongside the method.
    pub recommended_threshold: ThresholdSpec,
}

/// One entry in a side-by-side method comparison for a column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodComparison {
    pub method: DetectionMethod,
    pub threshold: ThresholdSpec,
    pub n_outliers: usize,
    pub pct_outliers: f64,
}

/// Removal counts for one column in the summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnRemovalSummary {
    pub method: DetectionMethod,
    pub n_outliers: usize,
    pub pct_outliers: f64,
}

/// Aggregate view of a cleaning session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryReport {
    /// No detection has run yet.
    NoOperations { status: String },
    /// Shapes and per-column counts after one or more operations.
    Cleaned {
        original_shape: (usize, usize),
        clean_shape: (usize, usize),
        total_rows_removed: usize,
        columns: BTreeMap<String, ColumnRemovalSummary>,
    },
}

impl SummaryReport {
    /// The placeholder returned before any detection call.
    pub fn no_operations() -> Self {
        Self::NoOperations {
            status: "no operations performed".to_string(),
        }
    }
}
