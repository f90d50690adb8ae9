//! Athena CLI - portfolio valuation and quant metrics from the command line.
//!
//! Every command prints a JSON `ApiResponse` envelope on stdout. Logs go to
//! stderr and are controlled with `RUST_LOG`.

use anyhow::{bail, Context, Result};
use athena_core::{
    backtest_series, build_provider,
    indicators::technical_overlay,
    load_positions,
    portfolio::{risk_report, value_portfolio, DuplicatePolicy},
    ApiResponse, AthenaConfig, Interval, Period, PriceProvider, PriceSeries, ProviderKind,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "athena")]
#[command(about = "Athena CLI - portfolio valuation, risk and backtests")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $ATHENA_CONFIG or ~/.athena/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Price provider override (yahoo or csv)
    #[arg(long, global = true)]
    provider: Option<ProviderKind>,

    /// Directory of <TICKER>.csv files for the csv provider
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Value a portfolio file against historical prices
    Portfolio {
        /// CSV with ticker, quantity and cost_basis columns
        #[arg(short, long)]
        file: PathBuf,
        /// History window (5d, 1mo, 3mo, 6mo, 1y, 2y, 3y, 5y, max)
        #[arg(short, long)]
        period: Option<Period>,
        /// Combine rows sharing a ticker before valuation
        #[arg(long)]
        merge: bool,
    },
    /// Latest price and daily change
    Quote {
        /// Stock symbol
        #[arg(short, long)]
        ticker: String,
    },
    /// Daily price history
    History {
        /// Stock symbol
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long, default_value = "1y")]
        period: Period,
        /// Bar size (1d, 1wk, 1mo)
        #[arg(short, long, default_value = "1d")]
        interval: Interval,
    },
    /// Closing prices with SMA overlays
    Technicals {
        /// Stock symbol
        #[arg(short, long)]
        ticker: String,
        #[arg(short, long)]
        period: Option<Period>,
        /// SMA windows (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        windows: Vec<usize>,
    },
    /// Beta, alpha and historical VaR against a benchmark
    Risk {
        /// Stock symbol
        #[arg(short, long)]
        ticker: String,
        /// Benchmark symbol
        #[arg(short, long)]
        benchmark: Option<String>,
        /// Confidence level for VaR (0.95 = 95%)
        #[arg(short, long)]
        confidence: Option<f64>,
        #[arg(short, long)]
        period: Option<Period>,
    },
    /// SMA crossover backtest against buy-and-hold
    Backtest {
        /// Stock symbol
        #[arg(short, long)]
        ticker: String,
        /// Fast SMA window
        #[arg(long)]
        fast: Option<usize>,
        /// Slow SMA window
        #[arg(long)]
        slow: Option<usize>,
        #[arg(short, long)]
        period: Option<Period>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let response = match run(cli) {
        Ok(data) => ApiResponse::ok(data),
        Err(e) => ApiResponse::<Value>::err(format!("{:#}", e)),
    };

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run(cli: Cli) -> Result<Value> {
    let config = load_config(&cli)?;
    let provider = build_provider(&config.provider).context("building price provider")?;
    let provider = provider.as_ref();

    match cli.command {
        Commands::Portfolio {
            file,
            period,
            merge,
        } => handle_portfolio(provider, &config, file, period, merge),
        Commands::Quote { ticker } => Ok(serde_json::to_value(provider.fetch_quote(&ticker)?)?),
        Commands::History {
            ticker,
            period,
            interval,
        } => Ok(serde_json::to_value(provider.fetch_history(
            &ticker, period, interval,
        )?)?),
        Commands::Technicals {
            ticker,
            period,
            windows,
        } => {
            let windows = if windows.is_empty() {
                config.analysis.sma_overlays.clone()
            } else {
                windows
            };
            if windows.contains(&0) {
                bail!("SMA windows must be positive");
            }

            let period = period.unwrap_or(config.analysis.technicals_period);
            let series = fetch_daily(provider, &ticker, period)?;
            Ok(serde_json::to_value(technical_overlay(&series, &windows))?)
        }
        Commands::Risk {
            ticker,
            benchmark,
            confidence,
            period,
        } => {
            let benchmark = benchmark.unwrap_or_else(|| config.analysis.benchmark.clone());
            let confidence = confidence.unwrap_or(config.analysis.var_confidence);
            let period = period.unwrap_or(config.analysis.risk_period);

            let asset = fetch_daily(provider, &ticker, period)?;
            let bench = fetch_daily(provider, &benchmark, period)?;
            Ok(serde_json::to_value(risk_report(&asset, &bench, confidence)?)?)
        }
        Commands::Backtest {
            ticker,
            fast,
            slow,
            period,
        } => {
            let fast = fast.unwrap_or(config.analysis.fast_window);
            let slow = slow.unwrap_or(config.analysis.slow_window);
            let period = period.unwrap_or(config.analysis.backtest_period);

            let series = fetch_daily(provider, &ticker, period)?;
            let report = backtest_series(&series, fast, slow)?;
            Ok(json!({
                "final_buy_hold": report.backtest.final_buy_hold(),
                "final_strategy": report.backtest.final_strategy(),
                "report": report,
            }))
        }
    }
}

fn load_config(cli: &Cli) -> Result<AthenaConfig> {
    let mut config = match &cli.config {
        Some(path) => AthenaConfig::from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => AthenaConfig::load().context("loading config")?,
    };

    if let Some(kind) = cli.provider {
        config.provider.kind = kind;
    }
    if let Some(dir) = &cli.data_dir {
        config.provider.data_dir = Some(dir.clone());
    }

    config.validate()?;
    Ok(config)
}

fn fetch_daily(provider: &dyn PriceProvider, ticker: &str, period: Period) -> Result<PriceSeries> {
    let series = provider.fetch_history(ticker, period, Interval::Daily)?;
    if series.is_empty() {
        bail!("No price data for {}", series.ticker);
    }
    Ok(series)
}

fn handle_portfolio(
    provider: &dyn PriceProvider,
    config: &AthenaConfig,
    file: PathBuf,
    period: Option<Period>,
    merge: bool,
) -> Result<Value> {
    let positions =
        load_positions(&file).with_context(|| format!("reading portfolio {}", file.display()))?;

    let mut options = config.valuation_options();
    if let Some(period) = period {
        options.period = period;
    }
    if merge {
        options.duplicates = DuplicatePolicy::Merge;
    }

    let valuation = value_portfolio(&positions, provider, &options);
    if valuation.is_empty() {
        return Ok(json!({
            "message": "No price data available for any position",
            "skipped": valuation.skipped,
        }));
    }

    Ok(json!({
        "rows": valuation.rows,
        "total_market_value": valuation.total_market_value(),
        "total_unrealized_pnl": valuation.total_unrealized_pnl(),
        "allocation": valuation.allocation(),
        "performance": valuation.performance(),
        "equity_curve": valuation.equity_curve,
        "skipped": valuation.skipped,
    }))
}
