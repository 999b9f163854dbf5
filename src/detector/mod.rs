//! Outlier-detection algorithms.
//!
//! Each detector is a stateless strategy: given a numeric column it produces
//! a boolean mask aligned to the column's positions plus a statistics bundle.
//! Nulls and NaN are excluded from threshold computation and are never
//! flagged as outliers. Degenerate dispersions (zero IQR, zero std, zero MAD)
//! are handled by per-detector fallback policy, never as errors.

mod iqr;
mod modified_zscore;
mod zscore;

pub use iqr::IqrDetector;
pub use modified_zscore::ModifiedZscoreDetector;
pub use zscore::ZscoreDetector;

use crate::error::Result;
use crate::types::{DetectionMethod, FallbackPolicy, ThresholdSpec};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Statistics bundle describing one detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionStats {
    /// Number of positions flagged.
    pub n_outliers: usize,
    /// Flagged positions as a percentage of valid (non-null, non-NaN) rows.
    pub pct_outliers: f64,
    /// Threshold parameters actually used.
    pub threshold: ThresholdSpec,
    /// Fallback dispersion measure, when the primary one was degenerate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPolicy>,
}

/// Result of running a detector on a column.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Boolean mask aligned to the column's positions; `true` marks an
    /// outlier. Null/NaN positions are always `false`.
    pub mask: BooleanChunked,
    pub stats: DetectionStats,
}

impl Detection {
    /// Build a detection from per-position flags and the count of valid rows.
    pub(crate) fn from_flags(
        flags: Vec<bool>,
        n_valid: usize,
        threshold: ThresholdSpec,
        fallback: Option<FallbackPolicy>,
    ) -> Self {
        let n_outliers = flags.iter().filter(|f| **f).count();
        let pct_outliers = if n_valid == 0 {
            0.0
        } else {
            n_outliers as f64 / n_valid as f64 * 100.0
        };
        Self {
            mask: BooleanChunked::from_slice("outlier_mask".into(), &flags),
            stats: DetectionStats {
                n_outliers,
                pct_outliers,
                threshold,
                fallback,
            },
        }
    }

    /// A detection that flags nothing.
    pub(crate) fn none_flagged(len: usize, threshold: ThresholdSpec) -> Self {
        Self::from_flags(vec![false; len], 0, threshold, None)
    }

    /// Positions flagged as outliers.
    pub fn flagged_positions(&self) -> Vec<usize> {
        self.mask
            .into_iter()
            .enumerate()
            .filter(|(_, flagged)| flagged.unwrap_or(false))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Strategy interface implemented once per algorithm.
pub trait OutlierDetector {
    /// The algorithm this detector implements.
    fn method(&self) -> DetectionMethod;

    /// Detect outliers in a numeric column.
    fn detect(&self, series: &Series) -> Result<Detection>;
}

/// Build the detector a threshold spec parameterizes.
pub fn make_detector(spec: ThresholdSpec) -> Box<dyn OutlierDetector> {
    match spec {
        ThresholdSpec::IqrFactors { lower, upper } => Box::new(IqrDetector::new(lower, upper)),
        ThresholdSpec::Zscore { threshold } => Box::new(ZscoreDetector::new(threshold)),
        ThresholdSpec::ModifiedZscore { threshold } => {
            Box::new(ModifiedZscoreDetector::new(threshold))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_detector_dispatch() {
        for method in DetectionMethod::ALL {
            let detector = make_detector(ThresholdSpec::default_for(method));
            assert_eq!(detector.method(), method);
        }
    }

    #[test]
    fn test_detection_from_flags_percentage() {
        let detection = Detection::from_flags(
            vec![true, false, false, true],
            4,
            ThresholdSpec::Zscore { threshold: 3.0 },
            None,
        );
        assert_eq!(detection.stats.n_outliers, 2);
        assert!((detection.stats.pct_outliers - 50.0).abs() < 1e-12);
        assert_eq!(detection.flagged_positions(), vec![0, 3]);
    }

    #[test]
    fn test_detection_none_flagged_zero_valid() {
        let detection =
            Detection::none_flagged(3, ThresholdSpec::ModifiedZscore { threshold: 3.5 });
        assert_eq!(detection.stats.n_outliers, 0);
        assert_eq!(detection.stats.pct_outliers, 0.0);
        assert_eq!(detection.mask.len(), 3);
    }

    /// Mask length equals column length and NaN/null positions are never
    /// flagged, for all three detectors.
    #[test]
    fn test_mask_alignment_and_missing_positions() {
        let series = Series::new(
            "val".into(),
            &[
                Some(1.0),
                None,
                Some(f64::NAN),
                Some(2.0),
                Some(3.0),
                Some(1000.0),
            ],
        );

        for method in DetectionMethod::ALL {
            let detector = make_detector(ThresholdSpec::default_for(method));
            let detection = detector.detect(&series).unwrap();
            assert_eq!(detection.mask.len(), series.len());
            assert_eq!(detection.mask.get(1), Some(false), "null never flagged");
            assert_eq!(detection.mask.get(2), Some(false), "NaN never flagged");
        }
    }

    #[test]
    fn test_empty_series_no_outliers() {
        let series: Series = Series::new("val".into(), Vec::<f64>::new());
        for method in DetectionMethod::ALL {
            let detector = make_detector(ThresholdSpec::default_for(method));
            let detection = detector.detect(&series).unwrap();
            assert_eq!(detection.stats.n_outliers, 0);
            assert_eq!(detection.mask.len(), 0);
        }
    }

    #[test]
    fn test_all_null_series_no_outliers() {
        let series = Series::new("val".into(), &[Option::<f64>::None, None, None]);
        for method in DetectionMethod::ALL {
            let detector = make_detector(ThresholdSpec::default_for(method));
            let detection = detector.detect(&series).unwrap();
            assert_eq!(detection.stats.n_outliers, 0);
            assert_eq!(detection.stats.pct_outliers, 0.0);
            assert_eq!(detection.mask.len(), 3);
        }
    }
}
