//! Kupiec proportion-of-failures backtest
//!
//! Compares the observed breach frequency of a VaR forecast with the
//! frequency implied by its confidence level. Under the null hypothesis the
//! likelihood ratio
//!
//! ```text
//! LR = -2 · [ (x·ln p + (N-x)·ln(1-p)) - (x·ln(x/N) + (N-x)·ln(1-x/N)) ]
//! ```
//!
//! is chi-square distributed with one degree of freedom. The model passes
//! when `LR` stays below the 95% critical value.

use crate::error::{Result, VarError};
use crate::series::{BreachFlags, ReturnSeries, VarForecastSeries};
use crate::stats::{self, CHI_SQUARED_95_DF1};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of the likelihood-ratio test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Pass => "PASS",
            Verdict::Fail => "FAIL",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kupiec test statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStatistics {
    /// Number of forecast/return pairs
    #[serde(rename = "N")]
    pub n: usize,

    /// Number of breaches
    pub x: usize,

    /// Observed breach rate `x / N`
    pub failure_rate: f64,

    /// Breach rate implied by the confidence level
    pub expected_rate: f64,

    #[serde(rename = "LR_statistic")]
    pub lr_statistic: f64,

    /// Chi-square(1) 95% critical value
    pub critical_value: f64,

    /// Probability of a statistic at least this large under the null
    pub p_value: f64,

    pub verdict: Verdict,
}

impl BacktestStatistics {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Flag breaches and run the Kupiec test
///
/// `actual` and `forecast` must cover exactly the same dates; use
/// [`ReturnSeries::align_to`] beforehand if the realized series is longer.
pub fn backtest(
    actual: &ReturnSeries,
    forecast: &VarForecastSeries,
    confidence_level: f64,
) -> Result<(BreachFlags, BacktestStatistics)> {
    validate_confidence_level(confidence_level)?;

    let flags = breach_flags(actual, forecast)?;
    let statistics = kupiec_pof(flags.len(), flags.count(), confidence_level)?;

    Ok((flags, statistics))
}

/// `actual < forecast` for every aligned pair
pub fn breach_flags(actual: &ReturnSeries, forecast: &VarForecastSeries) -> Result<BreachFlags> {
    if actual.len() != forecast.len() {
        return Err(VarError::Alignment(format!(
            "{} realized returns for {} forecasts",
            actual.len(),
            forecast.len()
        )));
    }

    if let Some((realized, predicted)) = actual
        .timestamps()
        .iter()
        .zip(forecast.timestamps())
        .find(|(a, f)| a != f)
    {
        return Err(VarError::Alignment(format!(
            "realized return dated {realized} paired with forecast dated {predicted}"
        )));
    }

    let flags = actual
        .values()
        .iter()
        .zip(forecast.values())
        .map(|(realized, predicted)| realized < predicted)
        .collect();

    Ok(BreachFlags::new(actual.timestamps().to_vec(), flags))
}

/// Kupiec statistics from a breach count
///
/// `n` observations, `x` breaches, forecasts made at `confidence_level`.
pub fn kupiec_pof(n: usize, x: usize, confidence_level: f64) -> Result<BacktestStatistics> {
    validate_confidence_level(confidence_level)?;

    if n == 0 {
        return Err(VarError::InsufficientData(
            "No observations to backtest".to_string(),
        ));
    }

    if x > n {
        return Err(VarError::Calculation(format!(
            "{x} breaches out of {n} observations"
        )));
    }

    if x == n {
        return Err(VarError::DegenerateBacktest { observations: n });
    }

    let p = 1.0 - confidence_level;
    let n_f = n as f64;
    let x_f = x as f64;

    let lr_statistic = if x == 0 {
        -2.0 * n_f * (1.0 - p).ln()
    } else {
        let observed = x_f / n_f;
        let null_log_likelihood = x_f * p.ln() + (n_f - x_f) * (1.0 - p).ln();
        let alt_log_likelihood = x_f * observed.ln() + (n_f - x_f) * (1.0 - observed).ln();
        -2.0 * (null_log_likelihood - alt_log_likelihood)
    };

    let verdict = if lr_statistic < CHI_SQUARED_95_DF1 {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    Ok(BacktestStatistics {
        n,
        x,
        failure_rate: x_f / n_f,
        expected_rate: p,
        lr_statistic,
        critical_value: CHI_SQUARED_95_DF1,
        p_value: stats::chi_squared_df1_survival(lr_statistic)?,
        verdict,
    })
}

fn validate_confidence_level(confidence_level: f64) -> Result<()> {
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(VarError::InvalidConfidenceLevel(confidence_level));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::TimeSeries;
    use approx::assert_relative_eq;
    use chrono::{Duration, NaiveDate};

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    #[test]
    fn test_no_breaches() {
        let stats = kupiec_pof(100, 0, 0.99).unwrap();

        // -2 * 100 * ln(0.99)
        assert_relative_eq!(stats.lr_statistic, 2.010_067_170_700_29, epsilon = 1e-9);
        assert_eq!(stats.verdict, Verdict::Pass);
        assert_eq!(stats.failure_rate, 0.0);
        assert_relative_eq!(stats.expected_rate, 0.01, epsilon = 1e-15);
    }

    #[test]
    fn test_breaches_at_expected_rate() {
        let stats = kupiec_pof(1000, 10, 0.99).unwrap();

        assert!(stats.lr_statistic.abs() < 1e-9);
        assert!(stats.passed());
        assert_relative_eq!(stats.p_value, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_too_many_breaches_fail() {
        // 5% breaches against a 1% model
        let stats = kupiec_pof(500, 25, 0.99).unwrap();

        assert!(stats.lr_statistic > CHI_SQUARED_95_DF1);
        assert_eq!(stats.verdict, Verdict::Fail);
        assert!(stats.p_value < 0.05);
    }

    #[test]
    fn test_general_formula() {
        let (n, x, p) = (250.0_f64, 5.0_f64, 0.01_f64);
        let expected = -2.0
            * ((x * p.ln() + (n - x) * (1.0 - p).ln())
                - (x * (x / n).ln() + (n - x) * (1.0 - x / n).ln()));

        let stats = kupiec_pof(250, 5, 0.99).unwrap();

        assert_relative_eq!(stats.lr_statistic, expected, epsilon = 1e-12);
        assert_eq!(stats.critical_value, CHI_SQUARED_95_DF1);
    }

    #[test]
    fn test_no_observations() {
        assert!(matches!(
            kupiec_pof(0, 0, 0.99),
            Err(VarError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_rejects_confidence_outside_unit_interval() {
        for level in [1.5, 1.0, 0.0, -0.2, f64::NAN] {
            assert!(matches!(
                kupiec_pof(100, 0, level),
                Err(VarError::InvalidConfidenceLevel(_))
            ));
        }
    }

    #[test]
    fn test_all_breaches() {
        assert_eq!(
            kupiec_pof(20, 20, 0.99),
            Err(VarError::DegenerateBacktest { observations: 20 })
        );
    }

    #[test]
    fn test_backtest_flags_strictly_below() {
        let timestamps = dates(4);
        let actual =
            TimeSeries::new(timestamps.clone(), vec![-0.03, -0.02, 0.01, -0.021]).unwrap();
        let forecast = TimeSeries::new(timestamps, vec![-0.02; 4]).unwrap();

        let (flags, stats) = backtest(&actual, &forecast, 0.95).unwrap();

        // Equal to the forecast is not a breach
        assert_eq!(flags.flags(), &[true, false, false, true]);
        assert_eq!(stats.n, 4);
        assert_eq!(stats.x, 2);
        assert_relative_eq!(stats.failure_rate, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_backtest_length_mismatch() {
        let actual = TimeSeries::new(dates(3), vec![0.0; 3]).unwrap();
        let forecast = TimeSeries::new(dates(2), vec![-0.01; 2]).unwrap();

        assert!(matches!(
            backtest(&actual, &forecast, 0.99),
            Err(VarError::Alignment(_))
        ));
    }

    #[test]
    fn test_backtest_date_mismatch() {
        let actual = TimeSeries::new(dates(3), vec![0.0; 3]).unwrap();
        let forecast = TimeSeries::new(dates(4)[1..].to_vec(), vec![-0.01; 3]).unwrap();

        assert!(matches!(
            backtest(&actual, &forecast, 0.99),
            Err(VarError::Alignment(_))
        ));
    }

    #[test]
    fn test_backtest_empty_inputs() {
        let empty = TimeSeries::empty();
        assert!(matches!(
            backtest(&empty, &empty, 0.99),
            Err(VarError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_verdict_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Verdict::Pass).unwrap(), "\"PASS\"");
        assert_eq!(serde_json::to_string(&Verdict::Fail).unwrap(), "\"FAIL\"");
        assert_eq!(Verdict::Fail.to_string(), "FAIL");
    }
}
