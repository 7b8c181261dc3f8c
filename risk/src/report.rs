//! Reporting types consumed by writers and chart renderers

use crate::analysis::AnalysisOutcome;
use crate::backtest::{BacktestStatistics, Verdict};
use crate::error::Result;
use crate::estimator::VarMethod;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Summary of an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,

    pub confidence_level: f64,

    pub window: usize,

    pub backtest_target: VarMethod,

    /// First and last forecast dates
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,

    pub statistics: BacktestStatistics,

    pub breach_dates: Vec<NaiveDate>,
}

/// One chart row: realized return, both VaR bands and the breach marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRow {
    pub date: NaiveDate,

    #[serde(rename = "return")]
    pub realized_return: f64,

    pub parametric_var: f64,

    pub historical_var: f64,

    pub breach: bool,
}

impl AnalysisReport {
    pub fn from_outcome(outcome: &AnalysisOutcome) -> Self {
        let timestamps = outcome.breaches.timestamps();

        Self {
            generated_at: Utc::now(),
            confidence_level: outcome.config.confidence_level,
            window: outcome.config.window,
            backtest_target: outcome.config.backtest_target,
            start_date: timestamps.first().copied(),
            end_date: timestamps.last().copied(),
            statistics: outcome.statistics.clone(),
            breach_dates: outcome.breaches.breach_dates(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable Kupiec summary
    pub fn summary_lines(&self) -> Vec<String> {
        let stats = &self.statistics;
        let mut lines = vec![
            format!(
                "Kupiec test on {} VaR ({:.0}% confidence, {}-day window)",
                self.backtest_target.name(),
                self.confidence_level * 100.0,
                self.window
            ),
            format!("Total observations: {}", stats.n),
            format!("Number of exceptions: {}", stats.x),
            format!(
                "Failure rate: {:.4} (expected: {:.4})",
                stats.failure_rate, stats.expected_rate
            ),
            format!(
                "LR statistic: {:.4} (critical: {:.4}, p-value: {:.4})",
                stats.lr_statistic, stats.critical_value, stats.p_value
            ),
            format!("Conclusion: model {}", stats.verdict),
        ];

        if stats.verdict == Verdict::Fail && stats.failure_rate > stats.expected_rate {
            lines.push(
                "Fat tails detected: losses exceed what a normal distribution implies".to_string(),
            );
        }

        lines
    }
}

impl AnalysisOutcome {
    /// Chart rows, one per forecast date
    pub fn dashboard_rows(&self) -> Vec<DashboardRow> {
        self.aligned_returns
            .iter()
            .zip(self.forecast.parametric.values())
            .zip(self.forecast.historical.values())
            .zip(self.breaches.flags())
            .map(
                |((((date, realized_return), parametric_var), historical_var), breach)| {
                    DashboardRow {
                        date,
                        realized_return,
                        parametric_var: *parametric_var,
                        historical_var: *historical_var,
                        breach: *breach,
                    }
                },
            )
            .collect()
    }
}
