//! CrossLab CLI — fetch price history and run moving-average crossover backtests.
//!
//! Commands:
//! - `run`: fetch a series, backtest it, print metrics, draw the equity chart
//! - `fetch`: fetch a series and report what came back

mod chart;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{filter::Targets, prelude::*};

use crosslab_core::data::Interval;
use crosslab_runner::{build_provider, run_single_backtest, BacktestConfig, ProviderKind};

#[derive(Parser)]
#[command(
    name = "crosslab",
    version,
    about = "CrossLab CLI — moving-average crossover backtester"
)]
struct Cli {
    /// Log at DEBUG instead of INFO (logs go to stderr).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a series and run the backtest.
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Short moving-average window.
        #[arg(long)]
        short: Option<usize>,

        /// Long moving-average window.
        #[arg(long)]
        long: Option<usize>,

        /// Initial capital.
        #[arg(long)]
        capital: Option<f64>,

        /// Skip the equity chart.
        #[arg(long, default_value_t = false)]
        no_chart: bool,
    },
    /// Fetch a series and print its extent.
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Where the series comes from. Flags override the config file.
#[derive(Args)]
struct SourceArgs {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ticker symbol (required without --config).
    #[arg(long)]
    symbol: Option<String>,

    /// Bar interval: 1min, 5min, 15min, 30min, 60min, daily.
    #[arg(long)]
    interval: Option<Interval>,

    /// Data provider: alpha_vantage, csv, synthetic.
    #[arg(long)]
    provider: Option<ProviderKind>,

    /// CSV file (implies --provider csv).
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Seed for the synthetic provider.
    #[arg(long)]
    seed: Option<u64>,
}

impl SourceArgs {
    /// Start from the config file (or defaults) and apply flag overrides.
    fn base_config(&self) -> Result<BacktestConfig> {
        let mut config = match (&self.config, &self.symbol) {
            (Some(path), _) => BacktestConfig::read_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            (None, Some(symbol)) => BacktestConfig::for_symbol(symbol.clone()),
            (None, None) => anyhow::bail!("either --config or --symbol is required"),
        };

        if let Some(symbol) = &self.symbol {
            config.backtest.symbol = symbol.clone();
        }
        if let Some(interval) = self.interval {
            config.backtest.interval = interval;
        }
        if let Some(kind) = self.provider {
            config.provider.kind = kind;
        }
        if let Some(path) = &self.csv {
            config.provider.csv_path = Some(path.clone());
            if self.provider.is_none() {
                config.provider.kind = ProviderKind::Csv;
            }
        }
        if let Some(seed) = self.seed {
            config.provider.seed = seed;
        }
        Ok(config)
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(Targets::new().with_default(level));
    tracing_subscriber::registry().with(fmt_layer).init();
}

fn main() -> Result<()> {
    // Load environment variables (API key) from a .env file, if it exists.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Run {
            source,
            short,
            long,
            capital,
            no_chart,
        } => {
            let mut config = source.base_config()?;
            if let Some(short) = short {
                config.strategy.short_window = short;
            }
            if let Some(long) = long {
                config.strategy.long_window = long;
            }
            if let Some(capital) = capital {
                config.backtest.initial_capital = capital;
            }
            run_backtest(&config, !no_chart)
        }
        Commands::Fetch { source } => run_fetch(&source.base_config()?),
    }
}

fn run_backtest(config: &BacktestConfig, show_chart: bool) -> Result<()> {
    info!(
        symbol = %config.backtest.symbol,
        interval = %config.backtest.interval,
        provider = config.provider.kind.as_str(),
        short = config.strategy.short_window,
        long = config.strategy.long_window,
        "starting backtest"
    );

    let result = match run_single_backtest(config) {
        Ok(result) => result,
        Err(e) if e.is_insufficient_data() => {
            println!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e).context("backtest failed"),
    };

    report::print_report(&result);

    if show_chart && !result.performance.is_empty() {
        println!();
        chart::draw_inline(&result.symbol, &result.performance).context("drawing chart")?;
    }
    Ok(())
}

fn run_fetch(config: &BacktestConfig) -> Result<()> {
    config.validate()?;
    let provider = build_provider(config)?;
    let series = provider
        .fetch(&config.backtest.symbol, config.backtest.interval)
        .with_context(|| format!("fetching {} from {}", config.backtest.symbol, provider.name()))?;

    println!("Symbol:   {}", series.symbol());
    println!("Interval: {}", series.interval());
    println!("Provider: {}", provider.name());
    println!("Bars:     {}", series.len());
    if let (Some(first), Some(last)) = (series.first_timestamp(), series.last_timestamp()) {
        println!("Range:    {first} to {last}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn run_flags_override_defaults() {
        let cli = parse(&[
            "crosslab", "run", "--symbol", "MSFT", "--interval", "5min", "--provider", "synthetic",
            "--seed", "9", "--short", "5", "--long", "20", "--no-chart",
        ]);
        let Commands::Run { source, short, long, no_chart, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(short, Some(5));
        assert_eq!(long, Some(20));
        assert!(no_chart);

        let cfg = source.base_config().unwrap();
        assert_eq!(cfg.backtest.symbol, "MSFT");
        assert_eq!(cfg.backtest.interval, Interval::FiveMinutes);
        assert_eq!(cfg.provider.kind, ProviderKind::Synthetic);
        assert_eq!(cfg.provider.seed, 9);
    }

    #[test]
    fn csv_flag_implies_csv_provider() {
        let cli = parse(&["crosslab", "fetch", "--symbol", "AAPL", "--csv", "prices.csv"]);
        let Commands::Fetch { source } = cli.command else {
            panic!("expected fetch");
        };
        let cfg = source.base_config().unwrap();
        assert_eq!(cfg.provider.kind, ProviderKind::Csv);
        assert_eq!(cfg.provider.csv_path, Some(PathBuf::from("prices.csv")));
    }

    #[test]
    fn symbol_or_config_required() {
        let cli = parse(&["crosslab", "fetch"]);
        let Commands::Fetch { source } = cli.command else {
            panic!("expected fetch");
        };
        assert!(source.base_config().is_err());
    }

    #[test]
    fn bad_interval_is_rejected_by_clap() {
        let args = ["crosslab", "run", "--symbol", "A", "--interval", "2min"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn verbose_is_global() {
        let cli = parse(&["crosslab", "fetch", "--symbol", "A", "--verbose"]);
        assert!(cli.verbose);
    }
}
