//! Portfolio analytics module.
//!
//! Provides portfolio file loading, valuation, performance analytics, and risk metrics.

mod loader;
mod performance;
mod risk;
mod valuation;

pub use loader::{load_positions, parse_positions, REQUIRED_COLUMNS};
pub use performance::{annualized_metrics, SeriesKind, RISK_FREE_RATE, TRADING_DAYS_PER_YEAR};
pub use risk::{
    align_returns, beta_alpha, dated_returns, historical_var, risk_report, AlignedReturn,
    BetaAlpha, DatedReturn, RiskReport, DEFAULT_VAR_CONFIDENCE,
};
pub use valuation::{
    merge_duplicates, value_portfolio, AllocationSlice, DuplicatePolicy, PortfolioValuation,
    ValuationOptions,
};
