//! Portfolio valuation and equity curve aggregation.

use super::performance::{annualized_metrics, SeriesKind};
use crate::provider::PriceProvider;
use crate::types::{
    AnnualizedMetrics, EquityCurvePoint, Interval, Period, Position, PositionValuation,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How repeated tickers in a portfolio are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Every row is valued on its own
    #[default]
    Independent,
    /// Rows are collapsed into one position per ticker before valuation
    Merge,
}

/// History window and duplicate handling for [`value_portfolio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationOptions {
    pub period: Period,
    pub interval: Interval,
    pub duplicates: DuplicatePolicy,
}

impl Default for ValuationOptions {
    fn default() -> Self {
        Self {
            period: Period::Year2,
            interval: Interval::Daily,
            duplicates: DuplicatePolicy::Independent,
        }
    }
}

/// Market value held in one ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationSlice {
    pub ticker: String,
    pub market_value: f64,
}

/// Result of valuing a portfolio against historical prices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PortfolioValuation {
    /// One row per valued position, in input order
    pub rows: Vec<PositionValuation>,
    /// Aggregated value per date, ascending
    pub equity_curve: Vec<EquityCurvePoint>,
    /// Tickers that had no usable history
    pub skipped: Vec<String>,
}

impl PortfolioValuation {
    /// True when no position could be valued.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_market_value(&self) -> f64 {
        self.rows.iter().map(|r| r.market_value).sum()
    }

    pub fn total_unrealized_pnl(&self) -> f64 {
        self.rows.iter().map(|r| r.unrealized_pnl).sum()
    }

    /// Market value per row, largest first.
    pub fn allocation(&self) -> Vec<AllocationSlice> {
        let mut slices: Vec<AllocationSlice> = self
            .rows
            .iter()
            .map(|r| AllocationSlice {
                ticker: r.ticker.clone(),
                market_value: r.market_value,
            })
            .collect();
        slices.sort_by(|a, b| b.market_value.total_cmp(&a.market_value));
        slices
    }

    /// Annualized metrics of the equity curve's daily returns.
    pub fn performance(&self) -> AnnualizedMetrics {
        let returns: Vec<f64> = self.equity_curve.iter().map(|p| p.period_return).collect();
        annualized_metrics(&returns, SeriesKind::Returns)
    }
}

/// Collapse rows sharing a ticker into a single position.
///
/// Quantities add and the cost basis becomes the quantity-weighted average
/// (0.0 when the combined quantity is zero). The merged row takes the place
/// of the ticker's first occurrence.
pub fn merge_duplicates(positions: &[Position]) -> Vec<Position> {
    // (quantity, total cost) per merged row
    let mut merged: Vec<(Position, f64)> = Vec::with_capacity(positions.len());

    for position in positions {
        match merged.iter_mut().find(|(p, _)| p.ticker == position.ticker) {
            Some((existing, total_cost)) => {
                existing.quantity += position.quantity;
                *total_cost += position.total_cost();
            }
            None => merged.push((position.clone(), position.total_cost())),
        }
    }

    merged
        .into_iter()
        .map(|(mut position, total_cost)| {
            position.cost_basis = if position.quantity != 0.0 {
                total_cost / position.quantity
            } else {
                0.0
            };
            position
        })
        .collect()
}

/// Value each position at its latest close and build the portfolio equity curve.
///
/// Positions whose history cannot be fetched, or comes back empty, are
/// skipped and listed in [`PortfolioValuation::skipped`]. A position only
/// contributes to the curve on dates where it has a bar.
pub fn value_portfolio(
    positions: &[Position],
    provider: &dyn PriceProvider,
    options: &ValuationOptions,
) -> PortfolioValuation {
    let merged;
    let positions = match options.duplicates {
        DuplicatePolicy::Independent => positions,
        DuplicatePolicy::Merge => {
            merged = merge_duplicates(positions);
            merged.as_slice()
        }
    };

    let mut rows = Vec::with_capacity(positions.len());
    let mut skipped = Vec::new();
    let mut values_by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for position in positions {
        let series = match provider.fetch_history(
            &position.ticker,
            options.period,
            options.interval,
        ) {
            Ok(series) => series,
            Err(e) => {
                tracing::warn!(ticker = %position.ticker, error = %e, "skipping position");
                skipped.push(position.ticker.clone());
                continue;
            }
        };

        let Some(last_price) = series.last_close() else {
            tracing::warn!(ticker = %position.ticker, "skipping position without price history");
            skipped.push(position.ticker.clone());
            continue;
        };

        for bar in &series.bars {
            *values_by_date.entry(bar.date).or_insert(0.0) += position.quantity * bar.close;
        }
        rows.push(position.valued_at(last_price));
    }

    let equity_curve = equity_curve(values_by_date);

    tracing::info!(
        provider = provider.name(),
        valued = rows.len(),
        skipped = skipped.len(),
        points = equity_curve.len(),
        "portfolio valued"
    );

    PortfolioValuation {
        rows,
        equity_curve,
        skipped,
    }
}

fn equity_curve(values_by_date: BTreeMap<NaiveDate, f64>) -> Vec<EquityCurvePoint> {
    let mut previous: Option<f64> = None;

    values_by_date
        .into_iter()
        .map(|(date, value)| {
            let period_return = match previous {
                Some(prev) if prev != 0.0 => value / prev - 1.0,
                _ => 0.0,
            };
            previous = Some(value);
            EquityCurvePoint {
                date,
                portfolio_value: value,
                period_return,
            }
        })
        .collect()
}
