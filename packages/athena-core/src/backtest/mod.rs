//! SMA crossover backtest against buy-and-hold.
//!
//! The strategy is long one unit while the fast SMA is above the slow SMA
//! and flat otherwise. Positions act on the next period's return, so a
//! signal never earns the return of the bar that produced it.

use crate::indicators::sma;
use crate::portfolio::{annualized_metrics, SeriesKind};
use crate::stats::{cumulative_growth, pct_change};
use crate::types::{AnnualizedMetrics, PriceSeries};
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Result of running the crossover strategy over a price vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossoverBacktest {
    pub fast_window: usize,
    pub slow_window: usize,
    /// Set when `fast_window >= slow_window`
    pub windows_inverted: bool,
    pub fast_sma: Vec<Option<f64>>,
    pub slow_sma: Vec<Option<f64>>,
    /// 1 when fast SMA > slow SMA, else 0
    pub signals: Vec<u8>,
    /// Signal lagged by one period
    pub positions: Vec<u8>,
    pub asset_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub buy_hold_equity: Vec<f64>,
    pub strategy_equity: Vec<f64>,
    pub buy_hold_metrics: AnnualizedMetrics,
    pub strategy_metrics: AnnualizedMetrics,
}

impl CrossoverBacktest {
    /// Growth of one unit invested at the start and held.
    pub fn final_buy_hold(&self) -> Option<f64> {
        self.buy_hold_equity.last().copied()
    }

    /// Growth of one unit run through the strategy.
    pub fn final_strategy(&self) -> Option<f64> {
        self.strategy_equity.last().copied()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}

/// A backtest tied to the dates of the series it ran on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BacktestReport {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    pub backtest: CrossoverBacktest,
}

/// Run the SMA crossover strategy over `prices`.
///
/// # Arguments
///
/// * `prices` - Closing prices, oldest first
/// * `fast_window` - Fast SMA window (typically 20)
/// * `slow_window` - Slow SMA window (typically 50)
///
/// # Errors
///
/// [`Error::InvalidOperation`] when either window is zero. Inverted windows
/// are accepted and flagged.
pub fn sma_crossover_backtest(
    prices: &[f64],
    fast_window: usize,
    slow_window: usize,
) -> Result<CrossoverBacktest> {
    if fast_window == 0 || slow_window == 0 {
        return Err(Error::InvalidOperation(format!(
            "SMA windows must be positive, got fast={} slow={}",
            fast_window, slow_window
        )));
    }

    let windows_inverted = fast_window >= slow_window;
    if windows_inverted {
        tracing::warn!(fast_window, slow_window, "fast SMA window is not shorter than slow window");
    }

    let fast_sma = sma(prices, fast_window);
    let slow_sma = sma(prices, slow_window);

    let signals: Vec<u8> = fast_sma
        .iter()
        .zip(&slow_sma)
        .map(|pair| match pair {
            (Some(fast), Some(slow)) if fast > slow => 1,
            _ => 0,
        })
        .collect();

    let positions: Vec<u8> = std::iter::once(0)
        .chain(signals.iter().copied())
        .take(signals.len())
        .collect();

    let asset_returns = pct_change(prices);
    let strategy_returns: Vec<f64> = positions
        .iter()
        .zip(&asset_returns)
        .map(|(&position, &ret)| f64::from(position) * ret)
        .collect();

    let buy_hold_equity = cumulative_growth(&asset_returns);
    let strategy_equity = cumulative_growth(&strategy_returns);

    let buy_hold_metrics = annualized_metrics(&buy_hold_equity, SeriesKind::Prices);
    let strategy_metrics = annualized_metrics(&strategy_equity, SeriesKind::Prices);

    tracing::debug!(
        points = prices.len(),
        fast_window,
        slow_window,
        "crossover backtest complete"
    );

    Ok(CrossoverBacktest {
        fast_window,
        slow_window,
        windows_inverted,
        fast_sma,
        slow_sma,
        signals,
        positions,
        asset_returns,
        strategy_returns,
        buy_hold_equity,
        strategy_equity,
        buy_hold_metrics,
        strategy_metrics,
    })
}

/// Run the crossover backtest on a series' closes, keeping its dates.
pub fn backtest_series(
    series: &PriceSeries,
    fast_window: usize,
    slow_window: usize,
) -> Result<BacktestReport> {
    let closes = series.closes();
    let backtest = sma_crossover_backtest(&closes, fast_window, slow_window)?;

    Ok(BacktestReport {
        ticker: series.ticker.clone(),
        dates: series.dates(),
        closes,
        backtest,
    })
}
