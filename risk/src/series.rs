//! Date-indexed series types
//!
//! Every series in this crate is a pair of parallel vectors: observation dates
//! (strictly increasing) and values. Prices, returns and VaR forecasts share
//! the same representation and differ only in what the values mean.

use crate::error::{Result, VarError};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Date-indexed series of `f64` values with strictly increasing dates
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    timestamps: Vec<NaiveDate>,
    values: Vec<f64>,
}

/// Daily prices (e.g. adjusted close)
pub type PriceSeries = TimeSeries;

/// Daily fractional returns
pub type ReturnSeries = TimeSeries;

/// Rolling VaR forecasts, expressed as a return threshold
pub type VarForecastSeries = TimeSeries;

impl TimeSeries {
    /// Build a series, validating lengths and date ordering
    pub fn new(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(VarError::LengthMismatch {
                timestamps: timestamps.len(),
                values: values.len(),
            });
        }

        if let Some(pair) = timestamps.windows(2).find(|w| w[0] >= w[1]) {
            return Err(VarError::UnorderedTimestamps(format!(
                "{} is followed by {}",
                pair[0], pair[1]
            )));
        }

        Ok(Self { timestamps, values })
    }

    /// Build a series from `(date, value)` pairs
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (timestamps, values) = pairs.into_iter().unzip();
        Self::new(timestamps, values)
    }

    /// Build from parts already known to be ordered and of equal length
    pub(crate) fn from_sorted_parts(timestamps: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(timestamps.len(), values.len());
        Self { timestamps, values }
    }

    /// Empty series
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Observation at position `index`
    pub fn get(&self, index: usize) -> Option<(NaiveDate, f64)> {
        Some((*self.timestamps.get(index)?, *self.values.get(index)?))
    }

    /// Value observed on `date`
    pub fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.timestamps
            .binary_search(&date)
            .ok()
            .map(|index| self.values[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }

    /// Simple percentage-change returns of a price series
    ///
    /// `r_t = P_t / P_{t-1} - 1`, dated at `t`. The first price has no return
    /// and is dropped, so the result is one element shorter than the input.
    pub fn simple_returns(&self) -> Result<ReturnSeries> {
        for (date, price) in self.iter() {
            if !price.is_finite() || price <= 0.0 {
                return Err(VarError::InvalidPrice {
                    date: date.to_string(),
                    price,
                });
            }
        }

        if self.len() < 2 {
            return Ok(Self::empty());
        }

        let values = self.values.windows(2).map(|w| w[1] / w[0] - 1.0).collect();

        Ok(Self {
            timestamps: self.timestamps[1..].to_vec(),
            values,
        })
    }

    /// Select this series' values on the dates of `target`
    ///
    /// Used to pair realized returns with a forecast series before
    /// backtesting. Every date in `target` must be present here.
    pub fn align_to(&self, target: &TimeSeries) -> Result<TimeSeries> {
        let mut values = Vec::with_capacity(target.len());

        for date in target.timestamps() {
            let value = self.value_at(*date).ok_or_else(|| {
                VarError::Alignment(format!("no observation on {date} to pair with forecast"))
            })?;
            values.push(value);
        }

        Ok(Self {
            timestamps: target.timestamps.clone(),
            values,
        })
    }

    /// Equal-weighted portfolio returns
    ///
    /// Averages the inputs on the dates present in every one of them. Dates
    /// missing from any input are left out of the result.
    pub fn equal_weighted(components: &[ReturnSeries]) -> Result<ReturnSeries> {
        if components.is_empty() {
            return Err(VarError::EmptySeries);
        }

        let mut totals: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
        for series in components {
            for (date, value) in series.iter() {
                let entry = totals.entry(date).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let weight = components.len();
        Self::from_pairs(
            totals
                .into_iter()
                .filter(|(_, (_, count))| *count == weight)
                .map(|(date, (sum, _))| (date, sum / weight as f64)),
        )
    }
}

/// Per-date breach indicators aligned to a forecast series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreachFlags {
    timestamps: Vec<NaiveDate>,
    flags: Vec<bool>,
}

impl BreachFlags {
    pub(crate) fn new(timestamps: Vec<NaiveDate>, flags: Vec<bool>) -> Self {
        debug_assert_eq!(timestamps.len(), flags.len());
        Self { timestamps, flags }
    }

    // Only built by a successful backtest, which needs at least one observation
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn timestamps(&self) -> &[NaiveDate] {
        &self.timestamps
    }

    pub fn flags(&self) -> &[bool] {
        &self.flags
    }

    /// Number of breaches
    pub fn count(&self) -> usize {
        self.flags.iter().filter(|breached| **breached).count()
    }

    /// Dates on which the realized return fell below the forecast
    pub fn breach_dates(&self) -> Vec<NaiveDate> {
        self.iter()
            .filter_map(|(date, breached)| breached.then_some(date))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, bool)> + '_ {
        self.timestamps.iter().copied().zip(self.flags.iter().copied())
    }
}
