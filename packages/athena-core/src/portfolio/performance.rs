//! Annualized performance analytics.

use crate::stats::{mean, pct_change, sample_std};
use crate::types::AnnualizedMetrics;
use serde::{Deserialize, Serialize};

/// Trading days used to annualize daily figures.
pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Annual risk-free rate used by the Sharpe ratio.
pub const RISK_FREE_RATE: f64 = 0.03;

/// What a value series passed to [`annualized_metrics`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    /// Prices or equity values; converted to simple returns first
    Prices,
    /// Period returns used as given
    Returns,
}

/// Annualized return, volatility and Sharpe ratio of a series.
///
/// # Arguments
///
/// * `values` - Prices or daily returns, oldest first
/// * `kind` - Whether `values` are prices or returns
///
/// # Returns
///
/// `AnnualizedMetrics` where:
/// - `annualized_return = (1 + mean(r))^252 - 1`
/// - `annualized_volatility = sample_std(r) * sqrt(252)`, 0 with fewer than two returns
/// - `sharpe = (annualized_return - 0.03) / annualized_volatility`, `None` when volatility is zero
pub fn annualized_metrics(values: &[f64], kind: SeriesKind) -> AnnualizedMetrics {
    let returns = match kind {
        SeriesKind::Prices => pct_change(values),
        SeriesKind::Returns => values.to_vec(),
    };

    let mean_return = mean(&returns).unwrap_or(0.0);
    let annualized_return = (1.0 + mean_return).powf(TRADING_DAYS_PER_YEAR) - 1.0;

    let annualized_volatility =
        sample_std(&returns).unwrap_or(0.0) * TRADING_DAYS_PER_YEAR.sqrt();

    let sharpe = if annualized_volatility > 0.0 {
        Some((annualized_return - RISK_FREE_RATE) / annualized_volatility).filter(|s| s.is_finite())
    } else {
        None
    };

    AnnualizedMetrics {
        annualized_return,
        annualized_volatility,
        sharpe,
    }
}
