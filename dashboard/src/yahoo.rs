//! Yahoo Finance daily chart download

use crate::error::{Result, SourceError};
use crate::source::PriceSource;
use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use var_backtest::{PriceSeries, TimeSeries};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    meta: ChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

/// Parse a v8 chart response into adjusted closing prices
///
/// Falls back to the raw close when the response carries no adjusted series.
/// Bars without a price are skipped. Dates are taken in exchange local time.
pub fn parse_chart(json: &str, name: &str) -> Result<PriceSeries> {
    let response: ChartResponse = serde_json::from_str(json)
        .map_err(|e| SourceError::Yahoo(format!("malformed chart response: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(SourceError::Yahoo(format!("{} - {}", error.code, error.description)));
    }

    let data = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::EmptyData(name.to_string()))?;

    let timestamps = data.timestamp.unwrap_or_default();
    let adjusted = data
        .indicators
        .adjclose
        .and_then(|series| series.into_iter().next())
        .map(|series| series.adjclose);
    let close = data
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let mut pairs = Vec::with_capacity(timestamps.len());
    for (i, timestamp) in timestamps.iter().enumerate() {
        let price = adjusted
            .as_ref()
            .and_then(|series| series.get(i).copied().flatten())
            .or_else(|| close.get(i).copied().flatten());
        let Some(price) = price else {
            continue;
        };

        let date = DateTime::from_timestamp(timestamp + data.meta.gmtoffset, 0)
            .ok_or_else(|| SourceError::Yahoo(format!("invalid timestamp {timestamp}")))?
            .date_naive();
        pairs.push((date, price));
    }

    if pairs.is_empty() {
        return Err(SourceError::EmptyData(name.to_string()));
    }

    Ok(TimeSeries::from_pairs(pairs)?)
}

/// Write prices as a `Date,Adj Close` CSV readable by the csv source
pub fn save_csv(path: &Path, prices: &PriceSeries) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["Date", "Adj Close"])?;
    for (date, price) in prices.iter() {
        writer.write_record([date.format("%Y-%m-%d").to_string(), price.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

/// Daily history for one ticker, `start` inclusive and `end` exclusive
pub struct YahooSource {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    save_path: Option<PathBuf>,
    base_url: String,
    client: Option<Client>,
}

impl YahooSource {
    pub fn new(
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
        save_path: Option<PathBuf>,
    ) -> Self {
        Self {
            ticker,
            start,
            end,
            save_path,
            base_url: CHART_URL.to_string(),
            client: None,
        }
    }

    /// Point at another chart endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use a preconfigured HTTP client instead of the default one
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    fn epoch(date: NaiveDate) -> i64 {
        date.and_time(NaiveTime::MIN).and_utc().timestamp()
    }

    fn download(&self) -> Result<String> {
        let client = match &self.client {
            Some(client) => client.clone(),
            None => Client::builder()
                .user_agent(USER_AGENT)
                .timeout(REQUEST_TIMEOUT)
                .build()?,
        };

        let response = client
            .get(format!("{}/{}", self.base_url, self.ticker))
            .query(&[
                ("period1", Self::epoch(self.start).to_string()),
                ("period2", Self::epoch(self.end).to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                ticker: self.ticker.clone(),
            });
        }

        Ok(response.text()?)
    }
}

impl PriceSource for YahooSource {
    fn name(&self) -> String {
        format!("yahoo:{}", self.ticker)
    }

    fn fetch(&self) -> Result<PriceSeries> {
        info!("Downloading {} from {} to {}", self.ticker, self.start, self.end);
        let body = self.download()?;
        let prices = parse_chart(&body, &self.name())?;
        info!("Downloaded {} trading days", prices.len());

        if let Some(path) = &self.save_path {
            match save_csv(path, &prices) {
                Ok(()) => info!("Data saved to {}", path.display()),
                Err(e) => warn!("Could not save {}: {}", path.display(), e),
            }
        }

        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::source::CsvPriceSource;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    // 2024-01-02 .. 2024-01-04 at 14:30 UTC (09:30 New York)
    const CHART: &str = r#"{
        "chart": {
            "result": [{
                "meta": {"symbol": "SPY", "gmtoffset": -18000},
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{"open": [1.0, 2.0, 3.0], "close": [472.65, 468.79, 467.28]}],
                    "adjclose": [{"adjclose": [465.1, null, 459.9]}]
                }
            }],
            "error": null
        }
    }"#;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Serve each canned response to one connection, then stop
    fn serve(responses: Vec<(u16, &'static str)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::spawn(move || {
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let read = stream.read(&mut buf).unwrap();
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..read]);
                }
                let head = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(body.as_bytes()).unwrap();
            }
        });

        format!("http://{addr}")
    }

    fn source(base_url: String, save_path: Option<PathBuf>) -> YahooSource {
        let client = Client::builder().no_proxy().build().unwrap();
        YahooSource::new("SPY".to_string(), day(2024, 1, 1), day(2024, 1, 5), save_path)
            .with_base_url(base_url)
            .with_client(client)
    }

    #[test]
    fn test_parse_chart_adjusted_with_close_fallback() {
        let prices = parse_chart(CHART, "SPY").unwrap();

        assert_eq!(prices.timestamps(), &[day(2024, 1, 2), day(2024, 1, 3), day(2024, 1, 4)]);
        // Missing adjusted value on the 3rd falls back to the close
        assert_eq!(prices.values(), &[465.1, 468.79, 459.9]);
    }

    #[test]
    fn test_parse_chart_without_adjclose_uses_close() {
        let json = r#"{"chart": {"result": [{
            "timestamp": [1704205800, 1704292200],
            "indicators": {"quote": [{"close": [472.65, null]}]}
        }], "error": null}}"#;

        let prices = parse_chart(json, "SPY").unwrap();

        assert_eq!(prices.timestamps(), &[day(2024, 1, 2)]);
        assert_eq!(prices.values(), &[472.65]);
    }

    #[test]
    fn test_parse_chart_error_payload() {
        let json = r#"{"chart": {"result": null, "error": {
            "code": "Not Found",
            "description": "No data found, symbol may be delisted"
        }}}"#;

        let err = parse_chart(json, "XXXX").unwrap_err();

        assert!(matches!(&err, SourceError::Yahoo(msg) if msg.starts_with("Not Found")));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_chart_no_bars_is_empty() {
        let json = r#"{"chart": {"result": [{"indicators": {"quote": [{}]}}], "error": null}}"#;

        assert!(matches!(parse_chart(json, "SPY"), Err(SourceError::EmptyData(_))));
    }

    #[test]
    fn test_parse_chart_malformed() {
        assert!(matches!(
            parse_chart("<html>rate limited</html>", "SPY"),
            Err(SourceError::Yahoo(_))
        ));
    }

    #[test]
    fn test_epoch_bounds() {
        assert_eq!(YahooSource::epoch(day(2020, 1, 1)), 1_577_836_800);
    }

    #[test]
    fn test_fetch_saves_csv_readable_by_csv_source() {
        let path = std::env::temp_dir()
            .join(format!("var-dashboard-yahoo-{}", std::process::id()))
            .join("spy.csv");
        let yahoo = source(serve(vec![(200, CHART)]), Some(path.clone()));

        let prices = yahoo.fetch().unwrap();

        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.starts_with("Date,Adj Close\n2024-01-02,465.1\n"));
        let reloaded = CsvPriceSource::parse(saved.as_bytes(), "saved").unwrap();
        assert_eq!(reloaded, prices);
    }

    #[test]
    fn test_server_error_is_retried() {
        let base_url = serve(vec![(503, ""), (500, ""), (200, CHART)]);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 0,
        };

        let prices = policy.fetch(&source(base_url, None)).unwrap();

        assert_eq!(prices.len(), 3);
    }

    #[test]
    fn test_client_error_is_not_retried() {
        let base_url = serve(vec![(404, "")]);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 0,
        };

        let err = policy.fetch(&source(base_url, None)).unwrap_err();

        match err {
            SourceError::Exhausted { attempts, last, .. } => {
                assert_eq!(attempts, 1);
                assert!(matches!(*last, SourceError::Http { status: 404, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_connection_refused_is_retryable() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();

        let err = source(format!("http://{addr}"), None).fetch().unwrap_err();

        assert!(matches!(err, SourceError::Network(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_http_status_retryability() {
        let http = |status| SourceError::Http {
            status,
            ticker: "SPY".to_string(),
        };

        assert!(http(500).is_retryable());
        assert!(http(503).is_retryable());
        assert!(http(429).is_retryable());
        assert!(!http(404).is_retryable());
        assert!(!http(401).is_retryable());
    }
}
