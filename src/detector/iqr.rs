//! Interquartile-range outlier detection.

use super::{Detection, OutlierDetector};
use crate::error::Result;
use crate::stats::{positional_values, quantile};
use crate::types::{DetectionMethod, ThresholdSpec};
use polars::prelude::*;
use tracing::debug;

/// Flags values strictly outside `[Q1 - lower_factor*IQR, Q3 + upper_factor*IQR]`.
///
/// Quartiles are linear-interpolated. A zero IQR collapses the fences onto
/// the quartiles themselves, so constant columns flag nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrDetector {
    pub lower_factor: f64,
    pub upper_factor: f64,
}

impl Default for IqrDetector {
    fn default() -> Self {
        Self {
            lower_factor: 1.5,
            upper_factor: 1.5,
        }
    }
}

impl IqrDetector {
    pub fn new(lower_factor: f64, upper_factor: f64) -> Self {
        Self {
            lower_factor,
            upper_factor,
        }
    }
}

impl OutlierDetector for IqrDetector {
    fn method(&self) -> DetectionMethod {
        DetectionMethod::Iqr
    }

    fn detect(&self, series: &Series) -> Result<Detection> {
        let threshold = ThresholdSpec::IqrFactors {
            lower: self.lower_factor,
            upper: self.upper_factor,
        };

        let slots = positional_values(series)?;
        let values: Vec<f64> = slots.iter().flatten().copied().collect();
        let (Some(q1), Some(q3)) = (quantile(&values, 0.25), quantile(&values, 0.75)) else {
            return Ok(Detection::none_flagged(slots.len(), threshold));
        };

        let iqr = q3 - q1;
        let lower_bound = q1 - self.lower_factor * iqr;
        let upper_bound = q3 + self.upper_factor * iqr;
        debug!(
            "IQR fences for '{}': [{:.4}, {:.4}] (IQR {:.4})",
            series.name(),
            lower_bound,
            upper_bound,
            iqr
        );

        let flags: Vec<bool> = slots
            .iter()
            .map(|opt| matches!(opt, Some(v) if *v < lower_bound || *v > upper_bound))
            .collect();

        Ok(Detection::from_flags(flags, values.len(), threshold, None))
    }
}
