//! Estimate-and-backtest pipeline
//!
//! returns → rolling VaR → realized returns aligned to the forecast dates →
//! Kupiec test on the configured forecast.

use crate::backtest::{self, BacktestStatistics};
use crate::config::AnalysisConfig;
use crate::error::{Result, VarError};
use crate::estimator::{RollingVarEstimator, VarForecast};
use crate::report::AnalysisReport;
use crate::series::{BreachFlags, ReturnSeries};
use tracing::{debug, info};

/// Output of one analysis run
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub config: AnalysisConfig,

    /// Realized returns on the forecast dates
    pub aligned_returns: ReturnSeries,

    pub forecast: VarForecast,

    pub breaches: BreachFlags,

    pub statistics: BacktestStatistics,
}

impl AnalysisOutcome {
    pub fn report(&self) -> AnalysisReport {
        AnalysisReport::from_outcome(self)
    }
}

/// Runs the VaR pipeline for a fixed configuration
#[derive(Debug, Clone)]
pub struct VarAnalysis {
    config: AnalysisConfig,
    estimator: RollingVarEstimator,
}

impl VarAnalysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        let estimator = RollingVarEstimator::new(config.var_config())?;
        Ok(Self { config, estimator })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Estimate both forecasts and backtest the configured one
    ///
    /// Fails with [`VarError::InsufficientHistory`] when `returns` is shorter
    /// than the window, since there is nothing to backtest.
    pub fn run(&self, returns: &ReturnSeries) -> Result<AnalysisOutcome> {
        debug!(
            observations = returns.len(),
            window = self.config.window,
            confidence_level = self.config.confidence_level,
            "Estimating rolling VaR"
        );

        let forecast = self.estimator.estimate(returns);
        if forecast.is_empty() {
            return Err(VarError::InsufficientHistory {
                required: self.config.window,
                available: returns.len(),
            });
        }

        let aligned_returns = returns.align_to(&forecast.parametric)?;
        let target = forecast.get(self.config.backtest_target);

        debug!(
            forecasts = forecast.len(),
            target = self.config.backtest_target.name(),
            "Backtesting VaR forecast"
        );

        let (breaches, statistics) =
            backtest::backtest(&aligned_returns, target, self.config.confidence_level)?;

        info!(
            observations = statistics.n,
            breaches = statistics.x,
            lr_statistic = statistics.lr_statistic,
            verdict = %statistics.verdict,
            "Kupiec backtest complete"
        );

        Ok(AnalysisOutcome {
            config: self.config,
            aligned_returns,
            forecast,
            breaches,
            statistics,
        })
    }
}
