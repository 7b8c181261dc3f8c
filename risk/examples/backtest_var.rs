//! Rolling VaR backtest example
//!
//! Generates a seeded fat-tailed price path, estimates rolling parametric and
//! historical VaR, and runs the Kupiec test against each.
//!
//! Run with: cargo run --example backtest_var

use var_backtest::{
    backtest, generate_prices, mean, sample_std_dev, RollingVarEstimator, SyntheticConfig,
    VarConfig, VarMethod,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Rolling VaR Backtest Example ===\n");

    // 1. Six years of synthetic prices with Student-t shocks
    let prices = generate_prices(&SyntheticConfig {
        seed: 42,
        days: 1512,
        tail_degrees_of_freedom: Some(4.0),
        ..Default::default()
    })?;
    let returns = prices.simple_returns()?;

    println!("Sample returns statistics:");
    println!("  Mean return: {:.4}%", mean(returns.values()) * 100.0);
    println!("  Std deviation: {:.4}%", sample_std_dev(returns.values()) * 100.0);
    println!("  Number of observations: {}", returns.len());
    println!();

    // 2. Rolling forecasts at 99% over one trading year
    let config = VarConfig::default();
    let estimator = RollingVarEstimator::new(config)?;
    let forecast = estimator.estimate(&returns);

    println!("Confidence Level: {}%", config.confidence_level * 100.0);
    println!("Window: {} days", config.window);
    println!("Forecasts: {}", forecast.len());
    println!();

    if let (Some((date, parametric)), Some((_, historical))) = (
        forecast.parametric.get(forecast.len().saturating_sub(1)),
        forecast.historical.get(forecast.len().saturating_sub(1)),
    ) {
        println!("--- Latest forecast ({}) ---", date);
        println!("{:<20} {:>10}", "Method", "VaR");
        println!("{:-<31}", "");
        println!("{:<20} {:>9.2}%", "Parametric", parametric * 100.0);
        println!("{:<20} {:>9.2}%", "Historical", historical * 100.0);
        println!();
    }

    // 3. Kupiec test against each forecast
    let actual = returns.align_to(&forecast.parametric)?;
    for method in [VarMethod::Parametric, VarMethod::Historical] {
        println!("--- Kupiec Test: {} VaR ---", method.name());
        match backtest(&actual, forecast.get(method), config.confidence_level) {
            Ok((_, stats)) => {
                println!("Observations: {}", stats.n);
                println!("Exceptions: {}", stats.x);
                println!(
                    "Failure Rate: {:.2}% (expected {:.2}%)",
                    stats.failure_rate * 100.0,
                    stats.expected_rate * 100.0
                );
                println!(
                    "LR Statistic: {:.4} (critical {:.4})",
                    stats.lr_statistic, stats.critical_value
                );
                println!("Verdict: {}", stats.verdict);
            }
            Err(e) => println!("Backtest failed: {}", e),
        }
        println!();
    }

    println!("=== Example Complete ===");

    Ok(())
}
