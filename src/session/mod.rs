//! Stateful cleaning session over a tabular dataset.
//!
//! A [`StatClean`] session holds an immutable snapshot of the dataset taken
//! at construction and a mutable working copy shrunk by detection
//! operations. Every removal is recorded per column so the session is
//! auditable and reversible via [`StatClean::reset`].

mod batch;
mod reporting;

pub use batch::ZSCORE_SUFFIX;

use crate::analyzer::DistributionAnalyzer;
use crate::detector::{Detection, make_detector};
use crate::error::{Result, StatCleanError};
use crate::progress::{ClosureProgressReporter, ProgressReporter, ProgressUpdate};
use crate::stats::{describe_series, is_numeric_dtype};
use crate::types::{DistributionAnalysis, OutlierRecord, ThresholdSpec};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

/// Outlier-detection and cleaning session.
///
/// Row identity: every row carries a label, assigned `0..n` at construction
/// (and on `set_data`). With `preserve_index = true` surviving rows keep
/// their labels across removals; with `preserve_index = false` rows are
/// relabeled to a contiguous sequence starting at 0 after every removal. The
/// flag is fixed for the session's lifetime.
pub struct StatClean {
    original: DataFrame,
    clean: DataFrame,
    original_labels: Vec<u32>,
    labels: Vec<u32>,
    preserve_index: bool,
    outlier_info: HashMap<String, OutlierRecord>,
    progress: Option<Arc<dyn ProgressReporter>>,
}

impl StatClean {
    /// Create a session over a dataset. Fails with
    /// [`StatCleanError::EmptyDataset`] when the dataset has no rows or no
    /// columns.
    pub fn new(data: DataFrame, preserve_index: bool) -> Result<Self> {
        Self::validate_non_empty(&data)?;
        let original_labels: Vec<u32> = (0..data.height() as u32).collect();
        Ok(Self {
            original: data.clone(),
            clean: data,
            labels: original_labels.clone(),
            original_labels,
            preserve_index,
            outlier_info: HashMap::new(),
            progress: None,
        })
    }

    /// Install a closure-based progress reporter for batch operations.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Install a progress reporter for batch operations.
    pub fn set_progress_reporter(&mut self, reporter: Arc<dyn ProgressReporter>) {
        self.progress = Some(reporter);
    }

    /// The current working copy.
    pub fn data(&self) -> &DataFrame {
        &self.clean
    }

    /// The immutable snapshot taken at construction or `set_data`.
    pub fn original_data(&self) -> &DataFrame {
        &self.original
    }

    /// Current row labels, aligned with the working copy's rows.
    pub fn labels(&self) -> &[u32] {
        &self.labels
    }

    /// All stored per-column outlier records.
    pub fn outlier_info(&self) -> &HashMap<String, OutlierRecord> {
        &self.outlier_info
    }

    /// Replace the snapshot and working copy with a new dataset; clears all
    /// outlier records. Fails with [`StatCleanError::EmptyDataset`] when the
    /// new dataset is empty.
    pub fn set_data(&mut self, data: DataFrame) -> Result<()> {
        Self::validate_non_empty(&data)?;
        self.original_labels = (0..data.height() as u32).collect();
        self.labels = self.original_labels.clone();
        self.original = data.clone();
        self.clean = data;
        self.outlier_info.clear();
        debug!("Session data replaced: {:?}", self.original.shape());
        Ok(())
    }

    /// Restore the working copy to the snapshot and clear all outlier
    /// records. Idempotent.
    pub fn reset(&mut self) {
        self.clean = self.original.clone();
        self.labels = self.original_labels.clone();
        self.outlier_info.clear();
        debug!("Session reset to original snapshot");
    }

    /// Analyze the distribution of a column in the current working copy.
    pub fn analyze_distribution(&self, column: &str) -> Result<DistributionAnalysis> {
        let series = self.numeric_series(column)?;
        DistributionAnalyzer::analyze(&series)
    }

    /// Detect and remove IQR outliers from a column. `factors` overrides the
    /// default 1.5/1.5 fence factors.
    pub fn remove_outliers_iqr(
        &mut self,
        column: &str,
        factors: Option<(f64, f64)>,
    ) -> Result<(DataFrame, OutlierRecord)> {
        let (lower, upper) = factors.unwrap_or((1.5, 1.5));
        Self::validate_factor("lower_factor", lower)?;
        Self::validate_factor("upper_factor", upper)?;
        self.detect_and_remove(column, ThresholdSpec::IqrFactors { lower, upper })
    }

    /// Detect and remove Z-score outliers from a column. `threshold`
    /// overrides the default cutoff of 3.0.
    pub fn remove_outliers_zscore(
        &mut self,
        column: &str,
        threshold: Option<f64>,
    ) -> Result<(DataFrame, OutlierRecord)> {
        let threshold = threshold.unwrap_or(3.0);
        Self::validate_threshold("threshold", threshold)?;
        self.detect_and_remove(column, ThresholdSpec::Zscore { threshold })
    }

    /// Detect and remove modified-Z-score outliers from a column.
    /// `threshold` overrides the default cutoff of 3.5.
    pub fn remove_outliers_modified_zscore(
        &mut self,
        column: &str,
        threshold: Option<f64>,
    ) -> Result<(DataFrame, OutlierRecord)> {
        let threshold = threshold.unwrap_or(3.5);
        Self::validate_threshold("threshold", threshold)?;
        self.detect_and_remove(column, ThresholdSpec::ModifiedZscore { threshold })
    }

    /// Row labels removed from a column by past detections. Empty for
    /// columns no detection has touched - absence is a valid, empty answer,
    /// never an error.
    pub fn get_outlier_indices(&self, column: &str) -> BTreeSet<u32> {
        self.outlier_info
            .get(column)
            .map(|record| record.removed_labels.clone())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // internals
    // ------------------------------------------------------------------

    fn validate_non_empty(data: &DataFrame) -> Result<()> {
        if data.height() == 0 || data.width() == 0 {
            return Err(StatCleanError::EmptyDataset);
        }
        Ok(())
    }

    fn validate_threshold(field: &str, value: f64) -> Result<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(StatCleanError::InvalidThreshold {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    fn validate_factor(field: &str, value: f64) -> Result<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(StatCleanError::InvalidThreshold {
                field: field.to_string(),
                value,
            });
        }
        Ok(())
    }

    /// Fetch a numeric column from the working copy by name.
    fn numeric_series(&self, column: &str) -> Result<Series> {
        Self::numeric_series_from(&self.clean, column)
    }

    fn numeric_series_from(df: &DataFrame, column: &str) -> Result<Series> {
        let col = df
            .column(column)
            .map_err(|_| StatCleanError::ColumnNotFound(column.to_string()))?;
        let series = col.as_materialized_series();
        if !is_numeric_dtype(series.dtype()) {
            return Err(StatCleanError::NonNumericColumn(column.to_string()));
        }
        Ok(series.clone())
    }

    fn detect_and_remove(
        &mut self,
        column: &str,
        spec: ThresholdSpec,
    ) -> Result<(DataFrame, OutlierRecord)> {
        let series = self.numeric_series(column)?;
        let detection = make_detector(spec).detect(&series)?;
        let record = self.apply_detection(column, &series, &detection)?;
        Ok((self.clean.clone(), record))
    }

    /// Remove the rows a detection flagged and store the audit record.
    fn apply_detection(
        &mut self,
        column: &str,
        series: &Series,
        detection: &Detection,
    ) -> Result<OutlierRecord> {
        let stats_before = describe_series(series)?;
        let flagged = detection.flagged_positions();
        let removed_labels: BTreeSet<u32> = flagged.iter().map(|&pos| self.labels[pos]).collect();

        if !flagged.is_empty() {
            let keep: Vec<bool> = detection
                .mask
                .into_iter()
                .map(|flag| !flag.unwrap_or(false))
                .collect();
            self.remove_rows(&keep)?;
        }

        let stats_after = describe_series(
            self.clean
                .column(column)?
                .as_materialized_series(),
        )?;

        let record = OutlierRecord {
            column: column.to_string(),
            method: detection.stats.threshold.method(),
            threshold: detection.stats.threshold,
            fallback: detection.stats.fallback,
            n_outliers: detection.stats.n_outliers,
            pct_outliers: detection.stats.pct_outliers,
            removed_labels,
            stats_before,
            stats_after,
        };
        debug!(
            "Removed {} outlier rows from '{}' using {}",
            record.n_outliers,
            column,
            record.method.display_name()
        );
        self.outlier_info.insert(column.to_string(), record.clone());
        Ok(record)
    }

    /// Filter the working copy to the rows marked `true`, keeping labels in
    /// step and relabeling when the session does not preserve the index.
    fn remove_rows(&mut self, keep: &[bool]) -> Result<()> {
        let mask = BooleanChunked::from_slice("keep".into(), keep);
        self.clean = self.clean.filter(&mask)?;
        self.labels = self
            .labels
            .iter()
            .zip(keep)
            .filter(|(_, kept)| **kept)
            .map(|(label, _)| *label)
            .collect();
        if !self.preserve_index {
            self.labels = (0..self.clean.height() as u32).collect();
        }
        Ok(())
    }
}
