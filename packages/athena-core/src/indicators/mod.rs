//! Technical indicators for chart overlays and strategy signals.

mod sma;

pub use sma::sma;

use crate::types::PriceSeries;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Windows drawn on the technicals chart by default.
pub const DEFAULT_OVERLAY_WINDOWS: [usize; 2] = [20, 50];

/// One moving-average line aligned with the series' dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmaLine {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

/// Closing prices with moving-average overlays.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TechnicalOverlay {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
    /// One line per requested window, in request order
    pub lines: Vec<SmaLine>,
}

/// Compute an SMA line per window over the series' closes.
pub fn technical_overlay(series: &PriceSeries, windows: &[usize]) -> TechnicalOverlay {
    let closes = series.closes();
    let lines = windows
        .iter()
        .map(|&window| SmaLine {
            window,
            values: sma(&closes, window),
        })
        .collect();

    TechnicalOverlay {
        ticker: series.ticker.clone(),
        dates: series.dates(),
        closes,
        lines,
    }
}
