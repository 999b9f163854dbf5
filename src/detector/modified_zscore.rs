//! Modified Z-score outlier detection (median/MAD based).

use super::{Detection, OutlierDetector};
use crate::error::Result;
use crate::stats::{mad, mean_abs_deviation, median, positional_values};
use crate::types::{DetectionMethod, FallbackPolicy, ThresholdSpec};
use polars::prelude::*;
use tracing::debug;

/// Consistency constant making MAD-based scores comparable to Z-scores
/// under a normal distribution.
const MAD_SCALE: f64 = 0.6745;

/// Consistency constant for the mean-absolute-deviation fallback
/// (Iglewicz & Hoaglin).
const MEAN_AD_SCALE: f64 = 1.253314;

/// Flags values with `|0.6745 * (value - median) / MAD| > threshold`.
///
/// When MAD is zero (more than half the values equal the median), scores
/// fall back to the mean absolute deviation from the median:
/// `(value - median) / (1.253314 * MeanAD)`. Columns that are entirely
/// constant have both dispersions at zero and flag nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifiedZscoreDetector {
    pub threshold: f64,
}

impl Default for ModifiedZscoreDetector {
    fn default() -> Self {
        Self { threshold: 3.5 }
    }
}

impl ModifiedZscoreDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl OutlierDetector for ModifiedZscoreDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::ModifiedZscore
    }

    fn detect(&self, series: &Series) -> Result<Detection> {
        let threshold = ThresholdSpec::ModifiedZscore {
            threshold: self.threshold,
        };

        let slots = positional_values(series)?;
        let values: Vec<f64> = slots.iter().flatten().copied().collect();
        let Some(med) = median(&values) else {
            return Ok(Detection::none_flagged(slots.len(), threshold));
        };

        let mad_value = mad(&values, med).unwrap_or(0.0);
        let (scale, fallback) = if mad_value > 0.0 {
            (mad_value / MAD_SCALE, None)
        } else {
            let mean_ad = mean_abs_deviation(&values, med).unwrap_or(0.0);
            if mean_ad > 0.0 {
                debug!(
                    "Zero MAD in '{}', falling back to mean absolute deviation",
                    series.name()
                );
                (
                    mean_ad * MEAN_AD_SCALE,
                    Some(FallbackPolicy::MeanAbsoluteDeviation),
                )
            } else {
                return Ok(Detection::none_flagged(slots.len(), threshold));
            }
        };

        let flags: Vec<bool> = slots
            .iter()
            .map(|opt| matches!(opt, Some(v) if ((v - med) / scale).abs() > self.threshold))
            .collect();

        Ok(Detection::from_flags(flags, values.len(), threshold, fallback))
    }
}
