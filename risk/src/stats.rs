//! Window statistics shared by the estimator and the backtest

use crate::error::{Result, VarError};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

/// 95th percentile of the chi-square distribution with one degree of freedom
pub const CHI_SQUARED_95_DF1: f64 = 3.841_458_820_694_124;

/// Arithmetic mean. `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation with the unbiased `n - 1` divisor
///
/// `NaN` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }

    let mu = mean(values);
    let sum_sq = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>();
    (sum_sq / (n - 1) as f64).sqrt()
}

/// Empirical quantile with linear interpolation between order statistics
///
/// `q` must lie in `[0, 1]`. The quantile sits at position `q * (n - 1)` of
/// the sorted sample; a fractional position interpolates between its two
/// neighbours. `values` is sorted in place.
pub fn quantile_linear(values: &mut [f64], q: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&q) {
        return Err(VarError::InvalidQuantile(q));
    }
    if values.is_empty() {
        return Err(VarError::EmptySeries);
    }

    Ok(interpolate_quantile(values, q))
}

/// Unchecked form of [`quantile_linear`] for callers that have already
/// validated `q` and know `values` is non-empty
pub(crate) fn interpolate_quantile(values: &mut [f64], q: f64) -> f64 {
    values.sort_by(f64::total_cmp);

    let last = values.len() - 1;
    let position = q * last as f64;
    let lower = (position.floor() as usize).min(last);
    let fraction = position - lower as f64;

    match values.get(lower + 1) {
        Some(upper) if fraction > 0.0 => values[lower] + fraction * (upper - values[lower]),
        _ => values[lower],
    }
}

/// Inverse standard normal CDF
pub fn normal_quantile(p: f64) -> Result<f64> {
    let normal = Normal::new(0.0, 1.0).map_err(|e| VarError::Calculation(e.to_string()))?;
    Ok(normal.inverse_cdf(p))
}

/// Upper-tail probability of a chi-square(1) statistic
pub fn chi_squared_df1_survival(statistic: f64) -> Result<f64> {
    let chi2 = ChiSquared::new(1.0).map_err(|e| VarError::Calculation(e.to_string()))?;
    Ok(1.0 - chi2.cdf(statistic))
}
