//! Plain-text report: run summary and the four headline metrics.

use std::fmt::Write;

use crosslab_runner::{BacktestResult, PerformanceMetrics};

/// `Performance Metrics:` followed by one percentage line per metric.
pub fn format_metrics(metrics: &PerformanceMetrics) -> String {
    let mut out = String::from("Performance Metrics:\n");
    for (label, value) in [
        ("Total Return", metrics.total_return),
        ("Annualized Return", metrics.annualized_return),
        ("Volatility", metrics.volatility),
        ("Sharpe Ratio", metrics.sharpe_ratio),
    ] {
        let _ = writeln!(out, "{label}: {:.2}%", value * 100.0);
    }
    out
}

pub fn print_metrics(metrics: &PerformanceMetrics) {
    print!("{}", format_metrics(metrics));
}

/// Header block describing what was run.
pub fn format_summary(result: &BacktestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Backtest Result ===");
    let _ = writeln!(out, "Symbol:         {}", result.symbol);
    let _ = writeln!(out, "Interval:       {}", result.interval);
    if let Some(provider) = &result.provider {
        let _ = writeln!(out, "Provider:       {provider}");
    }
    if let (Some(first), Some(last)) = (result.performance.first(), result.performance.last()) {
        let _ = writeln!(out, "Period:         {} to {}", first.timestamp, last.timestamp);
    }
    let _ = writeln!(
        out,
        "Bars:           {} ({} warmup, {} simulated)",
        result.bar_count,
        result.warmup_bars,
        result.performance.len()
    );
    let _ = writeln!(out, "Capital:        {:.2}", result.initial_capital);
    if let Some(value) = result.final_value() {
        let _ = writeln!(out, "Final Value:    {value:.2}");
    }
    let _ = writeln!(out, "Run:            {}", &result.run_id[..result.run_id.len().min(12)]);
    if result.synthetic {
        let _ = writeln!(out, "WARNING: Results based on SYNTHETIC data");
    }
    out
}

/// Summary plus metrics, or a notice when metrics are undefined.
pub fn print_report(result: &BacktestResult) {
    println!();
    print!("{}", format_summary(result));
    println!();
    match &result.metrics {
        Ok(metrics) => print_metrics(metrics),
        Err(e) => println!("Performance Metrics: undefined ({e})"),
    }
}
