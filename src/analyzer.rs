//! Distribution-shape analysis and detection-method recommendation.

use crate::error::Result;
use crate::stats::{kurtosis, skewness, valid_values};
use crate::types::{DetectionMethod, DistributionAnalysis, ThresholdSpec};
use polars::prelude::*;
use tracing::debug;

/// Bound on |skewness| below which a column counts as normal.
const NORMAL_SKEW_BOUND: f64 = 0.5;

/// Bound on |excess kurtosis| below which a column counts as normal.
const NORMAL_KURT_BOUND: f64 = 1.0;

/// Above these bounds the column counts as extremely non-normal and the
/// robust modified Z-score is recommended.
const EXTREME_SKEW_BOUND: f64 = 2.0;
const EXTREME_KURT_BOUND: f64 = 7.0;

/// Analyzes the shape of a column's distribution and recommends a detection
/// method with a threshold scaled to the severity of the departure from
/// normality.
///
/// The recommendation policy is monotonic: a more extreme |skewness| or
/// |kurtosis| never yields a stricter threshold, so genuinely skewed data is
/// not over-trimmed.
pub struct DistributionAnalyzer;

impl DistributionAnalyzer {
    /// Analyze a numeric column. Nulls and NaN are excluded from the moment
    /// computations; zero-variance and near-empty columns report zero
    /// skew/kurtosis and fall in the normal branch.
    pub fn analyze(series: &Series) -> Result<DistributionAnalysis> {
        let values = valid_values(series)?;
        let skew = skewness(&values);
        let kurt = kurtosis(&values);

        let is_normal = skew.abs() < NORMAL_SKEW_BOUND && kurt.abs() < NORMAL_KURT_BOUND;
        // Single severity scale: kurtosis is weighted half since its normal
        // range is about twice as wide as skewness's.
        let severity = f64::max(skew.abs(), kurt.abs() / 2.0);

        let (recommended_method, recommended_threshold) = if is_normal {
            (
                DetectionMethod::Zscore,
                ThresholdSpec::Zscore { threshold: 3.0 },
            )
        } else if skew.abs() < EXTREME_SKEW_BOUND && kurt.abs() < EXTREME_KURT_BOUND {
            let factor = 1.5 + 0.5 * (severity - 0.5).clamp(0.0, 1.5);
            (
                DetectionMethod::Iqr,
                ThresholdSpec::IqrFactors {
                    lower: factor,
                    upper: factor,
                },
            )
        } else {
            let threshold = 3.5 + 0.5 * (severity - 2.0).clamp(0.0, 3.0);
            (
                DetectionMethod::ModifiedZscore,
                ThresholdSpec::ModifiedZscore { threshold },
            )
        };

        debug!(
            "Distribution of '{}': skew {:.3}, kurtosis {:.3} -> {}",
            series.name(),
            skew,
            kurt,
            recommended_method.display_name()
        );

        Ok(DistributionAnalysis {
            skewness: skew,
            kurtosis: kurt,
            is_normal,
            recommended_method,
            recommended_threshold,
        })
    }
}
