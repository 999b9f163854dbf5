//! NaN-aware statistical kernels for numeric columns.
//!
//! All functions exclude nulls and NaN from computation; they never panic on
//! degenerate input and report degeneracy through `Option`/zero returns.

use crate::error::Result;
use crate::types::DescriptiveStats;
use polars::prelude::*;

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Per-position values of a numeric series, with nulls and NaN mapped to
/// `None`. Output length always equals the series length.
pub(crate) fn positional_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let cast = series.cast(&DataType::Float64)?;
    let ca = cast.f64()?;
    Ok(ca
        .into_iter()
        .map(|opt| opt.filter(|v| !v.is_nan()))
        .collect())
}

/// Valid (non-null, non-NaN) values of a numeric series, positions dropped.
pub(crate) fn valid_values(series: &Series) -> Result<Vec<f64>> {
    Ok(positional_values(series)?.into_iter().flatten().collect())
}

/// Arithmetic mean. `None` on empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1). Zero for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Median. `None` on empty input.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Linear-interpolated quantile (`pos = q * (n - 1)`), matching the
/// convention of numpy/pandas. `None` on empty input or q outside [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let pos = q * (sorted.len() as f64 - 1.0);
    let idx = pos.floor() as usize;
    let frac = pos - idx as f64;
    let a = sorted[idx];
    let b = sorted[(idx + 1).min(sorted.len() - 1)];
    Some(a + (b - a) * frac)
}

/// Median absolute deviation from `center`. `None` on empty input.
pub fn mad(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    median(&deviations)
}

/// Mean absolute deviation from `center`. `None` on empty input.
pub fn mean_abs_deviation(values: &[f64], center: f64) -> Option<f64> {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    mean(&deviations)
}

/// Fisher-Pearson skewness `m3 / m2^1.5` from population moments.
/// Zero for constant or too-short input.
pub fn skewness(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n;
    m3 / m2.powf(1.5)
}

/// Excess kurtosis `m4 / m2^2 - 3` from population moments.
/// Zero for constant or too-short input.
pub fn kurtosis(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    if n < 2.0 {
        return 0.0;
    }
    let Some(m) = mean(values) else {
        return 0.0;
    };
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
    if m2 == 0.0 {
        return 0.0;
    }
    let m4 = values.iter().map(|v| (v - m).powi(4)).sum::<f64>() / n;
    m4 / (m2 * m2) - 3.0
}

/// Mean, sample std, min and max of a value slice.
pub fn describe(values: &[f64]) -> DescriptiveStats {
    if values.is_empty() {
        return DescriptiveStats::empty();
    }
    DescriptiveStats {
        mean: mean(values),
        std: Some(sample_std(values)),
        min: values.iter().copied().reduce(f64::min),
        max: values.iter().copied().reduce(f64::max),
    }
}

/// Descriptive statistics of a series, excluding nulls and NaN.
pub(crate) fn describe_series(series: &Series) -> Result<DescriptiveStats> {
    Ok(describe(&valid_values(series)?))
}
