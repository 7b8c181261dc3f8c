//! Error types for VaR estimation and backtesting

use thiserror::Error;

/// Errors that can occur while building series, estimating VaR or backtesting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VarError {
    /// Not enough observations to produce a single forecast
    #[error("Insufficient history: need at least {required} returns, got {available}")]
    InsufficientHistory { required: usize, available: usize },

    /// Realized returns and forecasts do not line up
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// Backtest called without observations
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Every observation breached the forecast, the likelihood ratio is undefined
    #[error("Degenerate backtest: all {observations} observations breached the VaR forecast")]
    DegenerateBacktest { observations: usize },

    #[error("Invalid window: {0} (must be at least 2)")]
    InvalidWindow(usize),

    #[error("Invalid confidence level: {0} (must be between 0 and 1)")]
    InvalidConfidenceLevel(f64),

    #[error("Invalid quantile: {0} (must be between 0 and 1)")]
    InvalidQuantile(f64),

    #[error("Timestamps must be strictly increasing: {0}")]
    UnorderedTimestamps(String),

    #[error("Length mismatch: {timestamps} timestamps for {values} values")]
    LengthMismatch { timestamps: usize, values: usize },

    #[error("Invalid price {price} on {date}")]
    InvalidPrice { date: String, price: f64 },

    #[error("Series is empty")]
    EmptySeries,

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_yaml::Error> for VarError {
    fn from(err: serde_yaml::Error) -> Self {
        VarError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for VarError {
    fn from(err: serde_json::Error) -> Self {
        VarError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VarError>;
