//! Data source errors

use thiserror::Error;
use var_backtest::VarError;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Parse error on row {row}: {message}")]
    Parse { row: usize, message: String },

    #[error("No price data in {0}")]
    EmptyData(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} fetching {ticker}")]
    Http { status: u16, ticker: String },

    #[error("Yahoo Finance error: {0}")]
    Yahoo(String),

    #[error("Invalid series: {0}")]
    Series(#[from] VarError),

    #[error("{name} failed after {attempts} attempt(s)")]
    Exhausted {
        name: String,
        attempts: u32,
        #[source]
        last: Box<SourceError>,
    },
}

impl SourceError {
    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SourceError::Io(_) | SourceError::EmptyData(_) => true,
            SourceError::Csv(err) => err.is_io_error(),
            SourceError::Network(err) => {
                err.is_timeout() || err.is_connect() || err.is_request() || err.is_body()
            }
            SourceError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SourceError>;
