//! Batch operations: multi-column cleaning and Z-score helper columns.

use super::StatClean;
use crate::analyzer::DistributionAnalyzer;
use crate::detector::make_detector;
use crate::error::Result;
use crate::progress::ProgressUpdate;
use crate::stats::{describe, is_numeric_dtype, mean, positional_values, sample_std};
use crate::types::{
    CleaningMethod, DescriptiveStats, DetectionMethod, OutlierRecord, ThresholdSpec,
};
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Suffix of the helper columns produced by [`StatClean::add_zscore_columns`].
pub const ZSCORE_SUFFIX: &str = "_zscore";

impl StatClean {
    /// Clean several columns in one pass.
    ///
    /// Each column is detected against a snapshot of the working copy taken
    /// when the batch starts, so column order does not change the outcome.
    /// The union of all flagged rows is removed once at the end. With
    /// [`CleaningMethod::Auto`] each column's distribution picks its own
    /// method and threshold.
    pub fn clean_columns(
        &mut self,
        columns: &[&str],
        method: CleaningMethod,
        show_progress: bool,
    ) -> Result<(DataFrame, HashMap<String, OutlierRecord>)> {
        // Validate every column up front so a bad name cannot leave a
        // half-applied batch behind.
        for column in columns {
            Self::numeric_series_from(&self.clean, column)?;
        }

        let batch = self.clean.clone();
        let batch_labels = self.labels.clone();
        let mut flagged_any = vec![false; batch.height()];
        let mut records = HashMap::with_capacity(columns.len());

        for (i, column) in columns.iter().enumerate() {
            if show_progress && let Some(reporter) = &self.progress {
                reporter.report(ProgressUpdate::new(*column, i + 1, columns.len()));
            }

            let series = Self::numeric_series_from(&batch, column)?;
            let spec = match method.detection() {
                Some(fixed) => ThresholdSpec::default_for(fixed),
                None => DistributionAnalyzer::analyze(&series)?.recommended_threshold,
            };
            let detection = make_detector(spec).detect(&series)?;

            let flagged = detection.flagged_positions();
            let removed_labels: BTreeSet<u32> =
                flagged.iter().map(|&pos| batch_labels[pos]).collect();
            for &pos in &flagged {
                flagged_any[pos] = true;
            }

            // Per-column "after" stats describe the column minus its own
            // flagged rows, independent of what other columns flagged.
            let slots = positional_values(&series)?;
            let survivors: Vec<f64> = slots
                .iter()
                .zip(detection.mask.into_iter())
                .filter(|(_, flag)| !flag.unwrap_or(false))
                .filter_map(|(value, _)| *value)
                .collect();

            let record = OutlierRecord {
                column: (*column).to_string(),
                method: spec.method(),
                threshold: detection.stats.threshold,
                fallback: detection.stats.fallback,
                n_outliers: detection.stats.n_outliers,
                pct_outliers: detection.stats.pct_outliers,
                removed_labels,
                stats_before: describe(&slots.iter().flatten().copied().collect::<Vec<f64>>()),
                stats_after: describe(&survivors),
            };
            self.outlier_info.insert((*column).to_string(), record.clone());
            records.insert((*column).to_string(), record);
        }

        let n_removed = flagged_any.iter().filter(|f| **f).count();
        if n_removed > 0 {
            let keep: Vec<bool> = flagged_any.iter().map(|f| !f).collect();
            self.remove_rows(&keep)?;
        }
        debug!(
            "Batch cleaned {} columns, removed {} rows",
            columns.len(),
            n_removed
        );
        Ok((self.clean.clone(), records))
    }

    /// Append a `_zscore` helper column for every numeric column of the
    /// working copy.
    ///
    /// Scores use the column's mean and sample standard deviation over its
    /// valid values. Null/NaN source positions and zero-dispersion columns
    /// get null scores. Columns already carrying the suffix are skipped, so
    /// the operation is idempotent.
    pub fn add_zscore_columns(&mut self) -> Result<DataFrame> {
        let names: Vec<String> = self
            .clean
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();

        for name in &names {
            if name.ends_with(ZSCORE_SUFFIX) {
                continue;
            }
            let series = self.clean.column(name)?.as_materialized_series().clone();
            if !is_numeric_dtype(series.dtype()) {
                continue;
            }

            let slots = positional_values(&series)?;
            let values: Vec<f64> = slots.iter().flatten().copied().collect();
            let center = mean(&values);
            let std = sample_std(&values);

            let scores: Vec<Option<f64>> = slots
                .iter()
                .map(|slot| match (slot, center) {
                    (Some(value), Some(center)) if std > 0.0 => Some((value - center) / std),
                    _ => None,
                })
                .collect();

            let score_name = format!("{name}{ZSCORE_SUFFIX}");
            self.clean
                .with_column(Series::new(score_name.as_str().into(), scores))?;
        }
        Ok(self.clean.clone())
    }

    /// Remove every row whose score in any `_zscore` column exceeds
    /// `threshold` in absolute value.
    ///
    /// Helper columns are computed first if none exist yet. One record per
    /// base column is stored; the returned record aggregates the joint
    /// removal under the name `"zscore_columns"`.
    pub fn clean_zscore_columns(
        &mut self,
        threshold: f64,
    ) -> Result<(DataFrame, OutlierRecord)> {
        Self::validate_threshold("threshold", threshold)?;

        let has_scores = self
            .clean
            .get_column_names()
            .iter()
            .any(|name| name.ends_with(ZSCORE_SUFFIX));
        if !has_scores {
            self.add_zscore_columns()?;
        }

        let score_names: Vec<String> = self
            .clean
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name.ends_with(ZSCORE_SUFFIX))
            .collect();

        let height = self.clean.height();
        let mut flagged_any = vec![false; height];
        let mut per_column: Vec<(String, Vec<bool>)> = Vec::with_capacity(score_names.len());

        for score_name in &score_names {
            let series = self
                .clean
                .column(score_name)?
                .as_materialized_series()
                .clone();
            let slots = positional_values(&series)?;
            let flags: Vec<bool> = slots
                .iter()
                .map(|slot| matches!(slot, Some(score) if score.abs() > threshold))
                .collect();
            for (pos, flag) in flags.iter().enumerate() {
                if *flag {
                    flagged_any[pos] = true;
                }
            }
            let base = score_name
                .strip_suffix(ZSCORE_SUFFIX)
                .unwrap_or(score_name)
                .to_string();
            per_column.push((base, flags));
        }

        let labels_before = self.labels.clone();
        let mut stats_before: HashMap<String, DescriptiveStats> = HashMap::new();
        for (base, _) in &per_column {
            if let Ok(col) = self.clean.column(base) {
                stats_before.insert(
                    base.clone(),
                    crate::stats::describe_series(col.as_materialized_series())?,
                );
            }
        }

        let n_removed = flagged_any.iter().filter(|f| **f).count();
        let removed_union: BTreeSet<u32> = flagged_any
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(pos, _)| labels_before[pos])
            .collect();
        if n_removed > 0 {
            let keep: Vec<bool> = flagged_any.iter().map(|f| !f).collect();
            self.remove_rows(&keep)?;
        }

        let spec = ThresholdSpec::Zscore { threshold };
        for (base, flags) in &per_column {
            let n_outliers = flags.iter().filter(|f| **f).count();
            let removed_labels: BTreeSet<u32> = flags
                .iter()
                .enumerate()
                .filter(|(_, flag)| **flag)
                .map(|(pos, _)| labels_before[pos])
                .collect();
            let stats_after = match self.clean.column(base) {
                Ok(col) => crate::stats::describe_series(col.as_materialized_series())?,
                Err(_) => DescriptiveStats::empty(),
            };
            let record = OutlierRecord {
                column: base.clone(),
                method: DetectionMethod::Zscore,
                threshold: spec,
                fallback: None,
                n_outliers,
                pct_outliers: percentage(n_outliers, height),
                removed_labels,
                stats_before: stats_before.get(base).copied().unwrap_or_default(),
                stats_after,
            };
            self.outlier_info.insert(base.clone(), record);
        }

        debug!(
            "Joint z-score cleaning removed {} of {} rows across {} columns",
            n_removed,
            height,
            per_column.len()
        );
        let combined = OutlierRecord {
            column: "zscore_columns".to_string(),
            method: DetectionMethod::Zscore,
            threshold: spec,
            fallback: None,
            n_outliers: n_removed,
            pct_outliers: percentage(n_removed, height),
            removed_labels: removed_union,
            stats_before: DescriptiveStats::empty(),
            stats_after: DescriptiveStats::empty(),
        };
        Ok((self.clean.clone(), combined))
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn two_outlier_df() -> DataFrame {
        df![
            "a" => [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 100.0],
            "b" => [-50.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0],
            "label" => ["r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9"],
        ]
        .unwrap()
    }

    // ==================== clean_columns tests ====================

    #[test]
    fn test_clean_columns_removes_union() {
        let mut session = StatClean::new(two_outlier_df(), true).unwrap();
        let (cleaned, records) = session
            .clean_columns(&["a", "b"], CleaningMethod::Iqr, false)
            .unwrap();

        // Each column flags its own extreme row; the union of both goes.
        assert_eq!(cleaned.height(), 8);
        assert_eq!(records["a"].removed_labels, BTreeSet::from([9]));
        assert_eq!(records["b"].removed_labels, BTreeSet::from([0]));
        assert_eq!(session.labels(), (1..9).collect::<Vec<u32>>());
    }

    #[test]
    fn test_clean_columns_order_independent() {
        let mut forward = StatClean::new(two_outlier_df(), true).unwrap();
        forward
            .clean_columns(&["a", "b"], CleaningMethod::Iqr, false)
            .unwrap();

        let mut backward = StatClean::new(two_outlier_df(), true).unwrap();
        backward
            .clean_columns(&["b", "a"], CleaningMethod::Iqr, false)
            .unwrap();

        assert_eq!(forward.data(), backward.data());
        assert_eq!(forward.labels(), backward.labels());
    }

    #[test]
    fn test_clean_columns_auto_matches_single_runs() {
        let df = two_outlier_df();

        let mut batch = StatClean::new(df.clone(), true).unwrap();
        let (_, records) = batch
            .clean_columns(&["a", "b"], CleaningMethod::Auto, false)
            .unwrap();

        for column in ["a", "b"] {
            let analysis = StatClean::new(df.clone(), true)
                .unwrap()
                .analyze_distribution(column)
                .unwrap();
            assert_eq!(records[column].method, analysis.recommended_method);
        }
    }

    #[test]
    fn test_clean_columns_bad_column_leaves_state_untouched() {
        let mut session = StatClean::new(two_outlier_df(), true).unwrap();
        let result = session.clean_columns(&["a", "missing"], CleaningMethod::Iqr, false);
        assert!(result.is_err());
        assert_eq!(session.data().height(), 10);
        assert!(session.outlier_info().is_empty());
    }

    #[test]
    fn test_clean_columns_progress_reporting() {
        let seen: std::sync::Arc<Mutex<Vec<String>>> = Default::default();
        let seen_clone = seen.clone();

        let mut session = StatClean::new(two_outlier_df(), true)
            .unwrap()
            .on_progress(move |update| {
                seen_clone.lock().unwrap().push(update.message.clone());
            });
        session
            .clean_columns(&["a", "b"], CleaningMethod::Iqr, true)
            .unwrap();

        let messages = seen.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("'a' (1/2)"));
        assert!(messages[1].contains("'b' (2/2)"));
    }

    #[test]
    fn test_clean_columns_progress_suppressed() {
        let calls = std::sync::Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();

        let mut session = StatClean::new(two_outlier_df(), true)
            .unwrap()
            .on_progress(move |_| {
                calls_clone.fetch_add(1, Ordering::SeqCst);
            });
        session
            .clean_columns(&["a", "b"], CleaningMethod::Iqr, false)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    // ==================== add_zscore_columns tests ====================

    #[test]
    fn test_add_zscore_columns_basic() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0, 5.0],
            "name" => ["a", "b", "c", "d", "e"],
        ]
        .unwrap();
        let mut session = StatClean::new(df, false).unwrap();
        let result = session.add_zscore_columns().unwrap();

        assert!(result.column("x_zscore").is_ok());
        assert!(result.column("name_zscore").is_err(), "non-numeric skipped");

        // mean 3, sample std sqrt(2.5); first score is (1 - 3) / 1.5811
        let scores = result.column("x_zscore").unwrap().f64().unwrap();
        let expected = (1.0 - 3.0) / 2.5f64.sqrt();
        assert!((scores.get(0).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_add_zscore_columns_idempotent() {
        let df = df!["x" => [1.0, 2.0, 3.0]].unwrap();
        let mut session = StatClean::new(df, false).unwrap();
        session.add_zscore_columns().unwrap();
        let width = session.data().width();
        session.add_zscore_columns().unwrap();
        assert_eq!(session.data().width(), width, "no _zscore_zscore columns");
    }

    #[test]
    fn test_add_zscore_columns_null_and_constant() {
        let df = df![
            "with_null" => [Some(1.0), None, Some(3.0)],
            "constant" => [5.0, 5.0, 5.0],
        ]
        .unwrap();
        let mut session = StatClean::new(df, false).unwrap();
        let result = session.add_zscore_columns().unwrap();

        let with_null = result.column("with_null_zscore").unwrap();
        assert_eq!(with_null.null_count(), 1, "null source gets null score");

        let constant = result.column("constant_zscore").unwrap();
        assert_eq!(constant.null_count(), 3, "zero std gets all-null scores");
    }

    // ==================== clean_zscore_columns tests ====================

    #[test]
    fn test_clean_zscore_columns_joint_removal() {
        // 20 tight rows plus one row extreme in x only and one extreme in y
        // only. Joint cleaning drops both.
        let mut x: Vec<f64> = (1..=20).map(f64::from).collect();
        let mut y: Vec<f64> = (1..=20).map(f64::from).collect();
        x.extend([1000.0, 10.0]);
        y.extend([10.0, 1000.0]);
        let df = df!["x" => x, "y" => y].unwrap();

        let mut session = StatClean::new(df, true).unwrap();
        let (cleaned, combined) = session.clean_zscore_columns(3.0).unwrap();

        assert_eq!(combined.column, "zscore_columns");
        assert_eq!(combined.n_outliers, 2);
        assert_eq!(combined.removed_labels, BTreeSet::from([20, 21]));
        assert_eq!(cleaned.height(), 20);

        // Per-base-column records are stored under the base names.
        assert_eq!(session.get_outlier_indices("x"), BTreeSet::from([20]));
        assert_eq!(session.get_outlier_indices("y"), BTreeSet::from([21]));
    }

    #[test]
    fn test_clean_zscore_columns_computes_scores_on_demand() {
        let df = df!["x" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();
        let mut session = StatClean::new(df, false).unwrap();
        assert!(session.data().column("x_zscore").is_err());

        let (cleaned, combined) = session.clean_zscore_columns(3.0).unwrap();
        assert!(cleaned.column("x_zscore").is_ok());
        assert_eq!(combined.n_outliers, 0);
        assert_eq!(cleaned.height(), 5);
    }

    #[test]
    fn test_clean_zscore_columns_invalid_threshold() {
        let df = df!["x" => [1.0, 2.0, 3.0]].unwrap();
        let mut session = StatClean::new(df, false).unwrap();
        assert!(session.clean_zscore_columns(0.0).is_err());
        assert!(session.clean_zscore_columns(-2.0).is_err());
        assert!(session.clean_zscore_columns(f64::NAN).is_err());
    }
}
