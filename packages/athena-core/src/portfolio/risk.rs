//! Benchmark regression and historical Value-at-Risk.
//!
//! Asset and benchmark returns are joined on date before any statistic is
//! computed. Degenerate inputs (flat benchmark, too few rows) produce `None`
//! rather than an error.

use crate::stats::{mean, percentile, sample_covariance, sample_variance};
use crate::types::PriceSeries;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Confidence level used when none is configured.
pub const DEFAULT_VAR_CONFIDENCE: f64 = 0.95;

/// A return observed on a date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DatedReturn {
    pub date: NaiveDate,
    pub value: f64,
}

/// Asset and benchmark returns observed on the same date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AlignedReturn {
    pub date: NaiveDate,
    pub asset: f64,
    pub benchmark: f64,
}

/// Single-factor regression of asset returns on benchmark returns.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BetaAlpha {
    /// cov(asset, benchmark) / var(benchmark); None for a flat benchmark
    pub beta: Option<f64>,
    /// Daily intercept: mean(asset) - beta * mean(benchmark)
    pub alpha: Option<f64>,
    /// Number of aligned observations used
    pub observations: usize,
}

/// Beta, alpha and VaR of an asset against a benchmark.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskReport {
    pub asset: String,
    pub benchmark: String,
    pub beta: Option<f64>,
    pub alpha: Option<f64>,
    pub observations: usize,
    pub confidence: f64,
    /// Historical one-day VaR of the asset as a return (e.g. -0.025)
    pub value_at_risk: Option<f64>,
    /// Aligned daily returns, for scatter plots
    pub points: Vec<AlignedReturn>,
}

/// Daily returns of a series keyed by the later bar's date.
///
/// The first bar has no prior close and yields no observation.
pub fn dated_returns(series: &PriceSeries) -> Vec<DatedReturn> {
    series
        .bars
        .windows(2)
        .map(|w| DatedReturn {
            date: w[1].date,
            value: w[1].close / w[0].close - 1.0,
        })
        .filter(|r| r.value.is_finite())
        .collect()
}

/// Inner join on date, dropping rows where either side is not finite.
pub fn align_returns(asset: &[DatedReturn], benchmark: &[DatedReturn]) -> Vec<AlignedReturn> {
    let bench_by_date: HashMap<NaiveDate, f64> =
        benchmark.iter().map(|r| (r.date, r.value)).collect();

    let mut aligned: Vec<AlignedReturn> = asset
        .iter()
        .filter_map(|a| {
            let b = *bench_by_date.get(&a.date)?;
            (a.value.is_finite() && b.is_finite()).then_some(AlignedReturn {
                date: a.date,
                asset: a.value,
                benchmark: b,
            })
        })
        .collect();

    aligned.sort_by_key(|r| r.date);
    aligned
}

/// Regress asset returns on benchmark returns after aligning them by date.
pub fn beta_alpha(asset: &[DatedReturn], benchmark: &[DatedReturn]) -> BetaAlpha {
    regress(&align_returns(asset, benchmark))
}

fn regress(aligned: &[AlignedReturn]) -> BetaAlpha {
    let a: Vec<f64> = aligned.iter().map(|r| r.asset).collect();
    let b: Vec<f64> = aligned.iter().map(|r| r.benchmark).collect();

    let beta = match (sample_covariance(&a, &b), sample_variance(&b)) {
        (Some(cov), Some(var)) if var > 0.0 => Some(cov / var).filter(|v| v.is_finite()),
        _ => None,
    };

    let alpha = match (beta, mean(&a), mean(&b)) {
        (Some(beta), Some(mean_a), Some(mean_b)) => Some(mean_a - beta * mean_b),
        _ => None,
    };

    BetaAlpha {
        beta,
        alpha,
        observations: aligned.len(),
    }
}

/// Historical-simulation Value-at-Risk.
///
/// # Arguments
///
/// * `returns` - Period returns over the whole window
/// * `confidence` - Confidence level (e.g., 0.95 for 95%)
///
/// # Returns
///
/// The empirical `(1 - confidence) * 100` percentile of `returns`, using
/// linear interpolation. A loss shows up as a negative return.
pub fn historical_var(returns: &[f64], confidence: f64) -> Result<f64> {
    check_confidence(confidence)?;

    percentile(returns, (1.0 - confidence) * 100.0).ok_or_else(|| {
        Error::InsufficientData("Need at least one finite return for VaR".to_string())
    })
}

fn check_confidence(confidence: f64) -> Result<()> {
    if confidence > 0.0 && confidence < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidOperation(format!(
            "Confidence must be in (0, 1), got {}",
            confidence
        )))
    }
}

/// Beta/alpha against `benchmark` and the asset's historical VaR.
///
/// Closing prices are first joined on date, then converted to returns over
/// the joined rows; the first joined row has no return and is dropped.
pub fn risk_report(
    asset: &PriceSeries,
    benchmark: &PriceSeries,
    confidence: f64,
) -> Result<RiskReport> {
    check_confidence(confidence)?;

    let bench_close: HashMap<NaiveDate, f64> =
        benchmark.bars.iter().map(|b| (b.date, b.close)).collect();
    let merged: Vec<(NaiveDate, f64, f64)> = asset
        .bars
        .iter()
        .filter_map(|bar| Some((bar.date, bar.close, *bench_close.get(&bar.date)?)))
        .collect();

    let points: Vec<AlignedReturn> = merged
        .windows(2)
        .map(|w| AlignedReturn {
            date: w[1].0,
            asset: w[1].1 / w[0].1 - 1.0,
            benchmark: w[1].2 / w[0].2 - 1.0,
        })
        .filter(|r| r.asset.is_finite() && r.benchmark.is_finite())
        .collect();

    let regression = regress(&points);
    let asset_returns: Vec<f64> = points.iter().map(|r| r.asset).collect();
    let value_at_risk = percentile(&asset_returns, (1.0 - confidence) * 100.0);

    if regression.beta.is_none() {
        tracing::debug!(
            asset = %asset.ticker,
            benchmark = %benchmark.ticker,
            observations = points.len(),
            "beta undefined"
        );
    }

    Ok(RiskReport {
        asset: asset.ticker.clone(),
        benchmark: benchmark.ticker.clone(),
        beta: regression.beta,
        alpha: regression.alpha,
        observations: regression.observations,
        confidence,
        value_at_risk,
        points,
    })
}
