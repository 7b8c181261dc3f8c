use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing::{info, warn};
use var_backtest::{ReturnSeries, TimeSeries, VarAnalysis, VarMethod, Verdict};

mod config;
mod error;
mod output;
mod retry;
mod source;
mod yahoo;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "var-dashboard", about = "Rolling VaR estimation and Kupiec backtest")]
struct Args {
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Override the rolling window length
    #[arg(long)]
    window: Option<usize>,

    /// Override the confidence level, e.g. 0.99
    #[arg(long)]
    confidence: Option<f64>,

    /// Override which forecast is backtested
    #[arg(long, value_enum)]
    target: Option<Target>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Target {
    Historical,
    Parametric,
}

impl From<Target> for VarMethod {
    fn from(target: Target) -> Self {
        match target {
            Target::Historical => VarMethod::Historical,
            Target::Parametric => VarMethod::Parametric,
        }
    }
}

fn load_returns(config: &Config) -> Result<ReturnSeries> {
    let mut components = Vec::with_capacity(config.data.sources.len());

    for source_config in &config.data.sources {
        let source = source_config.build();
        let prices = config.data.retry.fetch(source.as_ref())?;
        let returns = prices.simple_returns()?;
        info!("{}: {} daily returns", source.name(), returns.len());
        components.push(returns);
    }

    if components.len() == 1 {
        return Ok(components.remove(0));
    }

    let portfolio = TimeSeries::equal_weighted(&components)?;
    info!(
        "Equal-weighted portfolio of {} assets: {} common dates",
        components.len(),
        portfolio.len()
    );
    Ok(portfolio)
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration
    info!("Loading configuration from {:?}", args.config);
    let mut config = Config::load(&args.config)?;

    if let Some(window) = args.window {
        config.analysis.window = window;
    }
    if let Some(confidence) = args.confidence {
        config.analysis.confidence_level = confidence;
    }
    if let Some(target) = args.target {
        config.analysis.backtest_target = target.into();
    }
    config.validate()?;

    let returns = load_returns(&config)?;

    let analysis = VarAnalysis::new(config.analysis)?;
    info!(
        "Estimating {:.1}% VaR over a {}-day window, backtesting {}",
        analysis.config().confidence_level * 100.0,
        analysis.config().window,
        analysis.config().backtest_target.name()
    );
    let outcome = analysis.run(&returns)?;
    let report = outcome.report();

    for line in report.summary_lines() {
        if report.statistics.verdict == Verdict::Fail {
            warn!("{}", line);
        } else {
            info!("{}", line);
        }
    }

    if let Some(path) = &config.output.report_path {
        output::write_report(path, &report)?;
        info!("Report saved to {}", path.display());
    }

    if let Some(path) = &config.output.series_path {
        output::write_series(path, &outcome.dashboard_rows())?;
        info!("Chart data saved to {}", path.display());
    }

    Ok(())
}
