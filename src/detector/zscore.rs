//! Standard Z-score outlier detection.

use super::{Detection, OutlierDetector};
use crate::error::Result;
use crate::stats::{mean, positional_values, sample_std};
use crate::types::{DetectionMethod, ThresholdSpec};
use polars::prelude::*;
use tracing::debug;

/// Flags values with `|value - mean| / std > threshold`, where std is the
/// sample standard deviation of the valid values. A zero std flags nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZscoreDetector {
    pub threshold: f64,
}

impl Default for ZscoreDetector {
    fn default() -> Self {
        Self { threshold: 3.0 }
    }
}

impl ZscoreDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl OutlierDetector for ZscoreDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Zscore
    }

    fn detect(&self, series: &Series) -> Result<Detection> {
        let threshold = ThresholdSpec::Zscore {
            threshold: self.threshold,
        };

        let slots = positional_values(series)?;
        let values: Vec<f64> = slots.iter().flatten().copied().collect();
        let Some(m) = mean(&values) else {
            return Ok(Detection::none_flagged(slots.len(), threshold));
        };
        let std = sample_std(&values);
        if std == 0.0 {
            debug!("Zero std in '{}', no outliers flagged", series.name());
            return Ok(Detection::none_flagged(slots.len(), threshold));
        }

        let flags: Vec<bool> = slots
            .iter()
            .map(|opt| matches!(opt, Some(v) if ((v - m) / std).abs() > self.threshold))
            .collect();

        Ok(Detection::from_flags(flags, values.len(), threshold, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_clear_outlier() {
        let mut data: Vec<f64> = (1..=20).map(f64::from).collect();
        data.push(1000.0);
        let series = Series::new("val".into(), &data);
        let detection = ZscoreDetector::default().detect(&series).unwrap();
        assert_eq!(detection.flagged_positions(), vec![20]);
    }

    #[test]
    fn test_constant_column_flags_nothing() {
        let series = Series::new("val".into(), &[7.0f64, 7.0, 7.0, 7.0]);
        let detection = ZscoreDetector::default().detect(&series).unwrap();
        assert_eq!(detection.stats.n_outliers, 0);
    }

    #[test]
    fn test_single_value_flags_nothing() {
        let series = Series::new("val".into(), &[7.0f64]);
        let detection = ZscoreDetector::default().detect(&series).unwrap();
        assert_eq!(detection.stats.n_outliers, 0);
    }

    #[test]
    fn test_tighter_threshold_flags_more() {
        let mut data: Vec<f64> = (1..=50).map(f64::from).collect();
        data.extend([200.0, 300.0]);
        let series = Series::new("val".into(), &data);

        let strict = ZscoreDetector::new(1.5).detect(&series).unwrap();
        let loose = ZscoreDetector::new(4.0).detect(&series).unwrap();
        assert!(strict.stats.n_outliers >= loose.stats.n_outliers);
    }

    #[test]
    fn test_percentage_excludes_missing_rows() {
        // 4 valid values, one null; flagging the extreme is 25% of valid rows.
        let series = Series::new(
            "val".into(),
            &[Some(1.0), Some(1.1), Some(0.9), None, Some(1e6)],
        );
        let detection = ZscoreDetector::new(1.0).detect(&series).unwrap();
        assert_eq!(detection.stats.n_outliers, 1);
        assert!((detection.stats.pct_outliers - 25.0).abs() < 1e-12);
    }
}
