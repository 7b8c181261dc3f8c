//! Seeded synthetic price paths for offline runs and tests
//!
//! Prices follow a geometric random walk on weekdays. Daily shocks are
//! normal, or Student-t (rescaled to unit variance) when fat tails are
//! requested. The same seed always yields the same path.

use crate::error::{Result, VarError};
use crate::series::{PriceSeries, TimeSeries};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal, StudentT};
use serde::{Deserialize, Serialize};

const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Synthetic price path parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub seed: u64,

    /// Number of prices to generate
    pub days: usize,

    /// First date; moved forward to a weekday if needed
    pub start_date: NaiveDate,

    pub start_price: f64,

    pub annual_drift: f64,

    pub annual_volatility: f64,

    /// Student-t degrees of freedom for fat-tailed shocks (must exceed 2)
    pub tail_degrees_of_freedom: Option<f64>,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            days: 1512,
            start_date: NaiveDate::from_ymd_opt(2020, 1, 2).unwrap_or_default(),
            start_price: 100.0,
            annual_drift: 0.08,
            annual_volatility: 0.20,
            tail_degrees_of_freedom: None,
        }
    }
}

enum Shock {
    Normal(Normal<f64>),
    StudentT { dist: StudentT<f64>, scale: f64 },
}

impl Shock {
    fn sample(&self, rng: &mut StdRng) -> f64 {
        match self {
            Shock::Normal(dist) => dist.sample(rng),
            Shock::StudentT { dist, scale } => dist.sample(rng) * scale,
        }
    }
}

/// Generate a synthetic daily price series
pub fn generate_prices(config: &SyntheticConfig) -> Result<PriceSeries> {
    if !(config.start_price.is_finite() && config.start_price > 0.0) {
        return Err(VarError::InvalidPrice {
            date: config.start_date.to_string(),
            price: config.start_price,
        });
    }

    if !(config.annual_volatility.is_finite() && config.annual_volatility >= 0.0) {
        return Err(VarError::Calculation(format!(
            "annual volatility must be non-negative, got {}",
            config.annual_volatility
        )));
    }

    let shock = match config.tail_degrees_of_freedom {
        Some(df) if df > 2.0 => Shock::StudentT {
            dist: StudentT::new(df).map_err(|e| VarError::Calculation(e.to_string()))?,
            scale: ((df - 2.0) / df).sqrt(),
        },
        Some(df) => {
            return Err(VarError::Calculation(format!(
                "tail degrees of freedom must exceed 2, got {df}"
            )))
        }
        None => Shock::Normal(
            Normal::new(0.0, 1.0).map_err(|e| VarError::Calculation(e.to_string()))?,
        ),
    };

    let dt = 1.0 / TRADING_DAYS_PER_YEAR;
    let drift = (config.annual_drift - 0.5 * config.annual_volatility.powi(2)) * dt;
    let diffusion = config.annual_volatility * dt.sqrt();

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut date = next_weekday(config.start_date);
    let mut price = config.start_price;
    let mut pairs = Vec::with_capacity(config.days);

    for _ in 0..config.days {
        pairs.push((date, price));
        price *= (drift + diffusion * shock.sample(&mut rng)).exp();
        date = next_weekday(date + Duration::days(1));
    }

    TimeSeries::from_pairs(pairs)
}

fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}
