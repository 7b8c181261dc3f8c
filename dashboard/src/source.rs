//! Price data sources

use crate::error::{Result, SourceError};
use crate::yahoo::YahooSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use tracing::{info, warn};
use var_backtest::{generate_prices, PriceSeries, SyntheticConfig, TimeSeries};

const DATE_COLUMN: &str = "Date";
const PRICE_COLUMNS: [&str; 2] = ["Adj Close", "Close"];

/// Something that yields a daily price series
pub trait PriceSource {
    fn name(&self) -> String;

    fn fetch(&self) -> Result<PriceSeries>;
}

/// Source entry in the dashboard config
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceConfig {
    /// CSV file with `Date` and `Adj Close` (or `Close`) columns
    Csv { path: PathBuf },

    /// Yahoo Finance daily history, `start` inclusive and `end` exclusive,
    /// optionally saved as a `Date,Adj Close` CSV
    Yahoo {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
        #[serde(default)]
        save_path: Option<PathBuf>,
    },

    /// Seeded synthetic path
    Synthetic(SyntheticConfig),
}

impl SourceConfig {
    pub fn build(&self) -> Box<dyn PriceSource> {
        match self {
            SourceConfig::Csv { path } => Box::new(CsvPriceSource::new(path.clone())),
            SourceConfig::Yahoo {
                ticker,
                start,
                end,
                save_path,
            } => Box::new(YahooSource::new(ticker.clone(), *start, *end, save_path.clone())),
            SourceConfig::Synthetic(config) => Box::new(SyntheticSource::new(config.clone())),
        }
    }
}

/// Price history stored as CSV
pub struct CsvPriceSource {
    path: PathBuf,
}

impl CsvPriceSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse CSV price data
    ///
    /// Dates are `YYYY-MM-DD`; anything after the first 10 characters (a time
    /// component) is ignored. Rows with an empty price are skipped.
    pub fn parse<R: Read>(reader: R, name: &str) -> Result<PriceSeries> {
        let mut reader = csv::Reader::from_reader(reader);
        let headers = reader.headers()?.clone();

        let column = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
        let date_index =
            column(DATE_COLUMN).ok_or_else(|| SourceError::MissingColumn(DATE_COLUMN.to_string()))?;
        let price_index = PRICE_COLUMNS
            .iter()
            .find_map(|wanted| column(*wanted))
            .ok_or_else(|| SourceError::MissingColumn(PRICE_COLUMNS.join(" or ")))?;

        let mut pairs = Vec::new();
        let mut skipped = 0;

        for (i, record) in reader.records().enumerate() {
            let record = record?;
            let row = i + 1;

            let raw_date = record.get(date_index).unwrap_or("").trim();
            let date = NaiveDate::parse_from_str(raw_date.get(..10).unwrap_or(raw_date), "%Y-%m-%d")
                .map_err(|e| SourceError::Parse {
                    row,
                    message: format!("invalid date {raw_date:?}: {e}"),
                })?;

            let raw_price = record.get(price_index).unwrap_or("").trim();
            if raw_price.is_empty() {
                skipped += 1;
                continue;
            }

            let price = raw_price.parse::<f64>().map_err(|e| SourceError::Parse {
                row,
                message: format!("invalid price {raw_price:?}: {e}"),
            })?;

            pairs.push((date, price));
        }

        if skipped > 0 {
            warn!("Skipped {} rows without a price in {}", skipped, name);
        }

        if pairs.is_empty() {
            return Err(SourceError::EmptyData(name.to_string()));
        }

        Ok(TimeSeries::from_pairs(pairs)?)
    }
}

impl PriceSource for CsvPriceSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<PriceSeries> {
        info!("Loading price data from {}", self.path.display());
        let file = File::open(&self.path)?;
        let prices = Self::parse(file, &self.name())?;
        info!("Loaded {} trading days", prices.len());
        Ok(prices)
    }
}

/// Seeded synthetic prices for offline runs
pub struct SyntheticSource {
    config: SyntheticConfig,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        Self { config }
    }
}

impl PriceSource for SyntheticSource {
    fn name(&self) -> String {
        format!("synthetic(seed={})", self.config.seed)
    }

    fn fetch(&self) -> Result<PriceSeries> {
        Ok(generate_prices(&self.config)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_adj_close() {
        let data = "Date,Adj Close\n2024-01-02,100.0\n2024-01-03,101.5\n2024-01-04,99.0\n";

        let prices = CsvPriceSource::parse(data.as_bytes(), "test").unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices.timestamps()[0], day(2024, 1, 2));
        assert_eq!(prices.values(), &[100.0, 101.5, 99.0]);
    }

    #[test]
    fn test_parse_prefers_adj_close_over_close() {
        let data = "Date,Close,Adj Close\n2024-01-02,200.0,100.0\n";

        let prices = CsvPriceSource::parse(data.as_bytes(), "test").unwrap();

        assert_eq!(prices.values(), &[100.0]);
    }

    #[test]
    fn test_parse_close_fallback_and_datetime() {
        let data = "Date,Close\n\
                    2024-01-02 00:00:00,100.0\n\
                    2024-01-03 00:00:00,\n\
                    2024-01-04 00:00:00,102.0\n";

        let prices = CsvPriceSource::parse(data.as_bytes(), "test").unwrap();

        // Row without a price is dropped
        assert_eq!(prices.timestamps(), &[day(2024, 1, 2), day(2024, 1, 4)]);
        assert_eq!(prices.values(), &[100.0, 102.0]);
    }

    #[test]
    fn test_parse_missing_price_column() {
        let data = "Date,Open\n2024-01-02,100.0\n";

        assert!(matches!(
            CsvPriceSource::parse(data.as_bytes(), "test"),
            Err(SourceError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_parse_bad_date() {
        let data = "Date,Adj Close\n02/01/2024,100.0\n";

        assert!(matches!(
            CsvPriceSource::parse(data.as_bytes(), "test"),
            Err(SourceError::Parse { row: 1, .. })
        ));
    }

    #[test]
    fn test_parse_empty() {
        let data = "Date,Adj Close\n";

        let err = CsvPriceSource::parse(data.as_bytes(), "test").unwrap_err();
        assert!(matches!(err, SourceError::EmptyData(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_unordered_dates() {
        let data = "Date,Adj Close\n2024-01-03,100.0\n2024-01-02,101.0\n";

        assert!(matches!(
            CsvPriceSource::parse(data.as_bytes(), "test"),
            Err(SourceError::Series(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let source = CsvPriceSource::new(PathBuf::from("/nonexistent/prices.csv"));

        assert!(matches!(source.fetch(), Err(SourceError::Io(_))));
    }

    #[test]
    fn test_yahoo_source_from_config() {
        let yaml = "type: yahoo\nticker: SPY\nstart: 2020-01-01\nend: 2026-01-01\n";
        let config: SourceConfig = serde_yaml::from_str(yaml).unwrap();

        assert!(matches!(
            &config,
            SourceConfig::Yahoo { ticker, save_path: None, .. } if ticker == "SPY"
        ));
        assert_eq!(config.build().name(), "yahoo:SPY");
    }

    #[test]
    fn test_synthetic_source_from_config() {
        let yaml = "type: synthetic\nseed: 5\ndays: 20\n";
        let config: SourceConfig = serde_yaml::from_str(yaml).unwrap();

        let source = config.build();
        let prices = source.fetch().unwrap();

        assert_eq!(source.name(), "synthetic(seed=5)");
        assert_eq!(prices.len(), 20);
    }
}
