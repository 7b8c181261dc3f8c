//! # var-backtest: Rolling Value-at-Risk with Kupiec backtesting
//!
//! This library estimates daily Value-at-Risk for a single-asset or
//! equal-weighted return series and validates the forecasts with the Kupiec
//! proportion-of-failures test.
//!
//! ## Core Components
//!
//! - **RollingVarEstimator**: parametric (Gaussian) and historical-simulation
//!   VaR over a trailing window
//! - **backtest**: breach flags and the Kupiec likelihood-ratio test
//! - **VarAnalysis**: the estimate → align → backtest pipeline
//! - **AnalysisReport**: serializable summary and chart rows
//!
//! ## Example Usage
//!
//! ```rust
//! use var_backtest::{generate_prices, AnalysisConfig, SyntheticConfig, VarAnalysis};
//!
//! let prices = generate_prices(&SyntheticConfig { days: 400, ..Default::default() }).unwrap();
//! let returns = prices.simple_returns().unwrap();
//!
//! let config = AnalysisConfig::from_yaml("confidence_level: 0.95\nwindow: 100").unwrap();
//! let outcome = VarAnalysis::new(config).unwrap().run(&returns).unwrap();
//!
//! assert_eq!(outcome.forecast.len(), returns.len() - 99);
//! println!("Kupiec verdict: {}", outcome.statistics.verdict);
//! ```

mod analysis;
mod backtest;
mod config;
mod error;
mod estimator;
mod report;
mod series;
mod stats;
mod synthetic;

pub use analysis::{AnalysisOutcome, VarAnalysis};
pub use backtest::{backtest, breach_flags, kupiec_pof, BacktestStatistics, Verdict};
pub use config::AnalysisConfig;
pub use error::{Result, VarError};
pub use estimator::{estimate, RollingVarEstimator, VarConfig, VarForecast, VarMethod};
pub use report::{AnalysisReport, DashboardRow};
pub use series::{BreachFlags, PriceSeries, ReturnSeries, TimeSeries, VarForecastSeries};
pub use stats::{mean, normal_quantile, quantile_linear, sample_std_dev, CHI_SQUARED_95_DF1};
pub use synthetic::{generate_prices, SyntheticConfig};
