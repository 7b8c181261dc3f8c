//! Rolling Value at Risk estimation
//!
//! Two methodologies over the same trailing window:
//! - Parametric VaR: assumes normal returns, `VaR = μ + Φ⁻¹(α) · s`
//!   with `s` the sample standard deviation (divisor `n - 1`)
//! - Historical VaR: empirical `α`-quantile of the window, linearly
//!   interpolated between order statistics
//!
//! VaR is expressed as a return threshold (negative for a loss), so a
//! realized return below the forecast is a breach.

use crate::error::{Result, VarError};
use crate::series::{ReturnSeries, TimeSeries, VarForecastSeries};
use crate::stats;
use serde::{Deserialize, Serialize};

/// VaR calculation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarMethod {
    Parametric,
    Historical,
}

impl VarMethod {
    pub fn name(&self) -> &'static str {
        match self {
            VarMethod::Parametric => "Parametric",
            VarMethod::Historical => "Historical",
        }
    }
}

/// Rolling VaR parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VarConfig {
    /// Confidence level in (0, 1), e.g. 0.99
    pub confidence_level: f64,

    /// Number of trailing returns per forecast (one trading year by default)
    pub window: usize,
}

impl Default for VarConfig {
    fn default() -> Self {
        Self {
            confidence_level: 0.99,
            window: 252,
        }
    }
}

impl VarConfig {
    pub fn new(confidence_level: f64, window: usize) -> Result<Self> {
        let config = Self {
            confidence_level,
            window,
        };
        config.validate()?;
        Ok(config)
    }

    /// Tail probability `α = 1 - confidence_level`
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(VarError::InvalidConfidenceLevel(self.confidence_level));
        }

        if self.window < 2 {
            return Err(VarError::InvalidWindow(self.window));
        }

        Ok(())
    }
}

/// Parametric and historical forecasts over the same dates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarForecast {
    pub parametric: VarForecastSeries,
    pub historical: VarForecastSeries,
}

impl VarForecast {
    pub fn get(&self, method: VarMethod) -> &VarForecastSeries {
        match method {
            VarMethod::Parametric => &self.parametric,
            VarMethod::Historical => &self.historical,
        }
    }

    pub fn len(&self) -> usize {
        self.parametric.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parametric.is_empty()
    }
}

/// Rolling VaR estimator
///
/// Produces one forecast per full window: the forecast dated at position `i`
/// uses returns `i - window + 1 ..= i`. A series shorter than the window
/// yields empty forecasts rather than an error.
#[derive(Debug, Clone)]
pub struct RollingVarEstimator {
    config: VarConfig,
    z_score: f64,
}

impl RollingVarEstimator {
    pub fn new(config: VarConfig) -> Result<Self> {
        config.validate()?;
        let z_score = stats::normal_quantile(config.alpha())?;

        Ok(Self { config, z_score })
    }

    pub fn config(&self) -> &VarConfig {
        &self.config
    }

    /// `Φ⁻¹(α)`, negative for confidence levels above 0.5
    pub fn z_score(&self) -> f64 {
        self.z_score
    }

    /// Number of forecasts a series of `len` returns produces
    pub fn forecast_len(&self, len: usize) -> usize {
        (len + 1).saturating_sub(self.config.window)
    }

    /// Rolling parametric VaR
    pub fn parametric(&self, returns: &ReturnSeries) -> VarForecastSeries {
        self.rolling(returns, |window| self.parametric_value(window))
    }

    /// Rolling historical-simulation VaR
    pub fn historical(&self, returns: &ReturnSeries) -> VarForecastSeries {
        let mut scratch = Vec::with_capacity(self.config.window);
        self.rolling(returns, |window| self.historical_value(window, &mut scratch))
    }

    /// Both forecasts from a single pass over the windows
    pub fn estimate(&self, returns: &ReturnSeries) -> VarForecast {
        let count = self.forecast_len(returns.len());
        let mut parametric = Vec::with_capacity(count);
        let mut historical = Vec::with_capacity(count);
        let mut scratch = Vec::with_capacity(self.config.window);

        for window in returns.values().windows(self.config.window) {
            parametric.push(self.parametric_value(window));
            historical.push(self.historical_value(window, &mut scratch));
        }

        VarForecast {
            parametric: self.forecast_series(returns, parametric),
            historical: self.forecast_series(returns, historical),
        }
    }

    fn parametric_value(&self, window: &[f64]) -> f64 {
        stats::mean(window) + self.z_score * stats::sample_std_dev(window)
    }

    fn historical_value(&self, window: &[f64], scratch: &mut Vec<f64>) -> f64 {
        scratch.clear();
        scratch.extend_from_slice(window);
        stats::interpolate_quantile(scratch, self.config.alpha())
    }

    fn rolling<F>(&self, returns: &ReturnSeries, mut forecast: F) -> VarForecastSeries
    where
        F: FnMut(&[f64]) -> f64,
    {
        let values = returns
            .values()
            .windows(self.config.window)
            .map(|window| forecast(window))
            .collect();

        self.forecast_series(returns, values)
    }

    fn forecast_series(&self, returns: &ReturnSeries, values: Vec<f64>) -> VarForecastSeries {
        if values.is_empty() {
            return TimeSeries::empty();
        }

        let timestamps = returns.timestamps()[self.config.window - 1..].to_vec();
        TimeSeries::from_sorted_parts(timestamps, values)
    }
}

/// Rolling parametric and historical VaR for `returns`
///
/// Returns `(parametric, historical)`, both empty when `returns` is shorter
/// than `window`.
pub fn estimate(
    returns: &ReturnSeries,
    confidence_level: f64,
    window: usize,
) -> Result<(VarForecastSeries, VarForecastSeries)> {
    let estimator = RollingVarEstimator::new(VarConfig::new(confidence_level, window)?)?;
    let forecast = estimator.estimate(returns);
    Ok((forecast.parametric, forecast.historical))
}
