//! Statistical Outlier Detection and Cleaning
//!
//! A stateful outlier-detection and cleaning engine for tabular numeric data,
//! built with Rust and Polars.
//!
//! # Overview
//!
//! This library provides session-based outlier cleaning:
//!
//! - **Three Detectors**: IQR fences, Z-score, and robust modified Z-score
//! - **Distribution Analysis**: Skewness/kurtosis-driven method recommendation
//! - **Batch Cleaning**: Multi-column cleaning with order-independent results
//! - **Audit Trail**: Per-column removal records with before/after statistics
//! - **Row Identity**: Stable row labels, preserved or relabeled on removal
//! - **Progress Reporting**: Per-column progress updates for batch operations
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use statclean::{CleaningMethod, StatClean};
//! use polars::prelude::*;
//!
//! let df = CsvReader::new(std::fs::File::open("data.csv")?).finish()?;
//!
//! // Option 1: single-column removal with an explicit method
//! let mut session = StatClean::new(df.clone(), true)?;
//! let (cleaned, record) = session.remove_outliers_iqr("price", None)?;
//! println!("removed {} rows ({:.1}%)", record.n_outliers, record.pct_outliers);
//!
//! // Option 2: batch cleaning with per-column automatic method selection
//! let mut session = StatClean::new(df, false)?
//!     .on_progress(|update| println!("{}", update.message));
//! let (cleaned, records) =
//!     session.clean_columns(&["price", "quantity"], CleaningMethod::Auto, true)?;
//!
//! let report = session.get_summary_report();
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```
//!
//! # Method Selection
//!
//! [`StatClean::analyze_distribution`] inspects a column's skewness and
//! excess kurtosis and recommends a detector: Z-score for near-normal data,
//! IQR for moderately skewed data, and modified Z-score for extreme shapes.
//! Batch cleaning with [`CleaningMethod::Auto`] applies the recommendation
//! per column.

pub mod analyzer;
pub mod detector;
pub mod error;
pub mod progress;
pub mod session;
pub mod stats;
pub mod types;

// Re-exports for convenient access
pub use analyzer::DistributionAnalyzer;
pub use detector::{
    Detection, DetectionStats, IqrDetector, ModifiedZscoreDetector, OutlierDetector,
    ZscoreDetector, make_detector,
};
pub use error::{Result, ResultExt, StatCleanError};
pub use progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
pub use session::{StatClean, ZSCORE_SUFFIX};
pub use types::{
    CleaningMethod, ColumnRemovalSummary, DescriptiveStats, DetectionMethod,
    DistributionAnalysis, FallbackPolicy, MethodComparison, OutlierRecord, SummaryReport,
    ThresholdSpec,
};
