//! Read-only reporting over session state: stored-record tables, method
//! comparison and the summary report.

use super::StatClean;
use crate::detector::make_detector;
use crate::error::Result;
use crate::types::{
    ColumnRemovalSummary, DetectionMethod, MethodComparison, SummaryReport, ThresholdSpec,
};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};

impl StatClean {
    /// Tabulate the stored outlier records for `columns` as a DataFrame, one
    /// row per column that has a record. Columns without a record are
    /// silently skipped.
    pub fn get_outlier_stats(&self, columns: &[&str]) -> Result<DataFrame> {
        let mut names = Vec::new();
        let mut methods = Vec::new();
        let mut thresholds = Vec::new();
        let mut counts: Vec<u32> = Vec::new();
        let mut percentages = Vec::new();
        let mut means_before = Vec::new();
        let mut means_after = Vec::new();
        let mut stds_before = Vec::new();
        let mut stds_after = Vec::new();

        for column in columns {
            let Some(record) = self.outlier_info().get(*column) else {
                continue;
            };
            names.push(record.column.clone());
            methods.push(record.method.display_name().to_string());
            thresholds.push(serde_json::to_string(&record.threshold)?);
            counts.push(record.n_outliers as u32);
            percentages.push(record.pct_outliers);
            means_before.push(record.stats_before.mean);
            means_after.push(record.stats_after.mean);
            stds_before.push(record.stats_before.std);
            stds_after.push(record.stats_after.std);
        }

        Ok(df![
            "column" => names,
            "method" => methods,
            "threshold" => thresholds,
            "n_outliers" => counts,
            "pct_outliers" => percentages,
            "mean_before" => means_before,
            "mean_after" => means_after,
            "std_before" => stds_before,
            "std_after" => stds_after,
        ]?)
    }

    /// Run every requested method at its default threshold against the
    /// current working copy, side by side, without mutating anything.
    /// `methods` defaults to all three algorithms.
    pub fn compare_methods(
        &self,
        columns: &[&str],
        methods: Option<&[DetectionMethod]>,
    ) -> Result<HashMap<String, Vec<MethodComparison>>> {
        let methods = methods.unwrap_or(&DetectionMethod::ALL);
        let mut comparison = HashMap::with_capacity(columns.len());

        for column in columns {
            let series = self.numeric_series(column)?;
            let mut entries = Vec::with_capacity(methods.len());
            for method in methods {
                let spec = ThresholdSpec::default_for(*method);
                let detection = make_detector(spec).detect(&series)?;
                entries.push(MethodComparison {
                    method: *method,
                    threshold: spec,
                    n_outliers: detection.stats.n_outliers,
                    pct_outliers: detection.stats.pct_outliers,
                });
            }
            comparison.insert((*column).to_string(), entries);
        }
        Ok(comparison)
    }

    /// Aggregate view of the session: a placeholder before any detection has
    /// run, otherwise the original/clean shapes and per-column removal
    /// counts.
    pub fn get_summary_report(&self) -> SummaryReport {
        if self.outlier_info().is_empty() {
            return SummaryReport::no_operations();
        }
        let columns: BTreeMap<String, ColumnRemovalSummary> = self
            .outlier_info()
            .iter()
            .map(|(name, record)| {
                (
                    name.clone(),
                    ColumnRemovalSummary {
                        method: record.method,
                        n_outliers: record.n_outliers,
                        pct_outliers: record.pct_outliers,
                    },
                )
            })
            .collect();

        SummaryReport::Cleaned {
            original_shape: self.original_data().shape(),
            clean_shape: self.data().shape(),
            total_rows_removed: self
                .original_data()
                .height()
                .saturating_sub(self.data().height()),
            columns,
        }
    }
}
