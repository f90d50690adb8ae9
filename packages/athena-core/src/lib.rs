//! Athena Core - Portfolio valuation and quantitative metrics library.
//!
//! This crate provides the analytics behind the Athena investment dashboard:
//!
//! - **Valuation**: Per-position market value and P&L, value-weighted equity curve
//! - **Performance**: Annualized return, volatility, Sharpe ratio
//! - **Risk metrics**: Beta/alpha against a benchmark, historical VaR
//! - **Backtesting**: SMA crossover strategy versus buy-and-hold
//! - **Price providers**: Yahoo chart API, offline CSV files, TTL cache
//!
//! # Example
//!
//! ```rust
//! use athena_core::portfolio::{value_portfolio, ValuationOptions};
//! use athena_core::provider::MemoryProvider;
//! use athena_core::{Position, PriceBar, PriceSeries};
//! use chrono::NaiveDate;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let mut provider = MemoryProvider::new();
//! provider.insert_series(PriceSeries::new(
//!     "AAPL",
//!     vec![
//!         PriceBar::from_close(day(2), 100.0),
//!         PriceBar::from_close(day(3), 110.0),
//!     ],
//! ));
//!
//! let positions = vec![Position::new("aapl", 10.0, 90.0)];
//! let valuation = value_portfolio(&positions, &provider, &ValuationOptions::default());
//!
//! assert_eq!(valuation.rows[0].market_value, 1100.0);
//! assert_eq!(valuation.rows[0].unrealized_pnl, 200.0);
//! assert_eq!(valuation.equity_curve.len(), 2);
//! ```

pub mod backtest;
pub mod config;
pub mod indicators;
pub mod portfolio;
pub mod provider;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use types::{
    AnnualizedMetrics, ApiResponse, EquityCurvePoint, Interval, Period, Position,
    PositionValuation, PriceBar, PriceSeries, Quote,
};

// Re-export main functionality
pub use backtest::{backtest_series, sma_crossover_backtest, BacktestReport, CrossoverBacktest};
pub use config::AthenaConfig;
pub use indicators::{sma, technical_overlay, TechnicalOverlay};
pub use portfolio::{
    annualized_metrics, beta_alpha, historical_var, load_positions, parse_positions, risk_report,
    value_portfolio, BetaAlpha, DuplicatePolicy, PortfolioValuation, RiskReport, SeriesKind,
    ValuationOptions,
};
pub use provider::{build_provider, PriceProvider, ProviderError, ProviderKind};

/// Error types for athena-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Portfolio file is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid value {value:?} for '{field}' in row {row}")]
    InvalidRecord {
        row: usize,
        field: &'static str,
        value: String,
    },

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),
}

/// Result type for athena-core operations.
pub type Result<T> = std::result::Result<T, Error>;
