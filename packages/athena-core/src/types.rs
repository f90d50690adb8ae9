//! Core data types for the Athena analytics core.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A holding loaded from the user's portfolio file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    /// Ticker symbol (trimmed, uppercase)
    pub ticker: String,
    /// Units held; negative for short positions
    pub quantity: f64,
    /// Cost per unit
    pub cost_basis: f64,
}

impl Position {
    /// Create a new position, normalizing the ticker.
    pub fn new(ticker: &str, quantity: f64, cost_basis: f64) -> Self {
        Self {
            ticker: ticker.trim().to_uppercase(),
            quantity,
            cost_basis,
        }
    }

    /// Total amount paid for the position.
    pub fn total_cost(&self) -> f64 {
        self.quantity * self.cost_basis
    }

    /// Value the position at `last_price`.
    pub fn valued_at(&self, last_price: f64) -> PositionValuation {
        PositionValuation {
            ticker: self.ticker.clone(),
            quantity: self.quantity,
            last_price,
            market_value: self.quantity * last_price,
            cost_basis: self.cost_basis,
            unrealized_pnl: (last_price - self.cost_basis) * self.quantity,
        }
    }
}

/// A single daily (or coarser) OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Bar where every price field equals `close` and volume is zero.
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}

/// Time-ordered price history for one ticker.
///
/// Bars are kept in ascending date order with at most one bar per date.
/// Missing dates are not filled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct PriceSeries {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    /// Build a series, sorting bars by date. For repeated dates the last bar wins.
    pub fn new(ticker: &str, bars: Vec<PriceBar>) -> Self {
        let mut bars = bars;
        bars.sort_by_key(|b| b.date);

        let mut deduped: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match deduped.last_mut() {
                Some(last) if last.date == bar.date => *last = bar,
                _ => deduped.push(bar),
            }
        }

        Self {
            ticker: ticker.trim().to_uppercase(),
            bars: deduped,
        }
    }

    /// An empty series for `ticker`.
    pub fn empty(ticker: &str) -> Self {
        Self::new(ticker, Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Closing prices in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Bar dates in ascending order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    /// Most recent close, if any.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// Keep only bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            ticker: self.ticker.clone(),
            bars: self
                .bars
                .iter()
                .filter(|b| b.date >= start)
                .cloned()
                .collect(),
        }
    }
}

/// Derived valuation of one position at its latest close.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionValuation {
    pub ticker: String,
    pub quantity: f64,
    pub last_price: f64,
    /// quantity * last_price
    pub market_value: f64,
    pub cost_basis: f64,
    /// (last_price - cost_basis) * quantity
    pub unrealized_pnl: f64,
}

/// One point of the aggregated portfolio equity curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquityCurvePoint {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    /// Change from the previous point; 0.0 on the first point
    #[serde(rename = "return")]
    pub period_return: f64,
}

/// Point-in-time quote for a ticker.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quote {
    pub ticker: String,
    pub last_price: f64,
    /// Absolute change from the previous close
    pub change: f64,
    /// Change from the previous close, in percent
    pub change_percent: f64,
}

impl Quote {
    /// Build a quote from the previous and latest close.
    pub fn from_closes(ticker: &str, previous_close: f64, last_price: f64) -> Self {
        let change = last_price - previous_close;
        let change_percent = if previous_close != 0.0 {
            change / previous_close * 100.0
        } else {
            0.0
        };

        Self {
            ticker: ticker.trim().to_uppercase(),
            last_price,
            change,
            change_percent,
        }
    }
}

/// Annualized performance of a return series.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AnnualizedMetrics {
    /// (1 + mean daily return)^252 - 1
    pub annualized_return: f64,
    /// Sample standard deviation of returns scaled by sqrt(252)
    pub annualized_volatility: f64,
    /// None when volatility is zero
    pub sharpe: Option<f64>,
}

/// Lookback window for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "5d")]
    Days5,
    #[serde(rename = "1mo")]
    Month1,
    #[serde(rename = "3mo")]
    Month3,
    #[serde(rename = "6mo")]
    Month6,
    #[serde(rename = "1y")]
    Year1,
    #[serde(rename = "2y")]
    Year2,
    #[serde(rename = "3y")]
    Year3,
    #[serde(rename = "5y")]
    Year5,
    #[serde(rename = "max")]
    Max,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Days5 => "5d",
            Period::Month1 => "1mo",
            Period::Month3 => "3mo",
            Period::Month6 => "6mo",
            Period::Year1 => "1y",
            Period::Year2 => "2y",
            Period::Year3 => "3y",
            Period::Year5 => "5y",
            Period::Max => "max",
        }
    }

    /// Calendar days covered by the period, `None` for `Max`.
    pub fn calendar_days(&self) -> Option<i64> {
        match self {
            Period::Days5 => Some(5),
            Period::Month1 => Some(30),
            Period::Month3 => Some(91),
            Period::Month6 => Some(182),
            Period::Year1 => Some(365),
            Period::Year2 => Some(730),
            Period::Year3 => Some(1095),
            Period::Year5 => Some(1826),
            Period::Max => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "5d" => Ok(Period::Days5),
            "1mo" => Ok(Period::Month1),
            "3mo" => Ok(Period::Month3),
            "6mo" => Ok(Period::Month6),
            "1y" => Ok(Period::Year1),
            "2y" => Ok(Period::Year2),
            "3y" => Ok(Period::Year3),
            "5y" => Ok(Period::Year5),
            "max" => Ok(Period::Max),
            other => Err(format!("unknown period: {}", other)),
        }
    }
}

/// Bar size for a history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1d")]
    Daily,
    #[serde(rename = "1wk")]
    Weekly,
    #[serde(rename = "1mo")]
    Monthly,
}

impl Interval {
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "1d",
            Interval::Weekly => "1wk",
            Interval::Monthly => "1mo",
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1d" => Ok(Interval::Daily),
            "1wk" => Ok(Interval::Weekly),
            "1mo" => Ok(Interval::Monthly),
            other => Err(format!("unknown interval: {}", other)),
        }
    }
}

/// API response wrapper for success cases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_position_new() {
        let pos = Position::new(" aapl ", 10.0, 150.0);
        assert_eq!(pos.ticker, "AAPL");
        assert_eq!(pos.quantity, 10.0);
        assert_eq!(pos.cost_basis, 150.0);
        assert_eq!(pos.total_cost(), 1500.0);
    }

    #[test]
    fn test_position_valued_at() {
        let row = Position::new("AAPL", 10.0, 150.0).valued_at(175.0);

        assert_eq!(row.last_price, 175.0);
        assert_eq!(row.market_value, 1750.0);
        assert_eq!(row.unrealized_pnl, 250.0);
    }

    #[test]
    fn test_short_position_pnl() {
        // Short 5 at 100, price falls to 90: +50
        let row = Position::new("TSLA", -5.0, 100.0).valued_at(90.0);
        assert_eq!(row.market_value, -450.0);
        assert_eq!(row.unrealized_pnl, 50.0);
    }

    #[test]
    fn test_series_sorts_and_dedups() {
        let series = PriceSeries::new(
            "msft",
            vec![
                PriceBar::from_close(day(3), 3.0),
                PriceBar::from_close(day(1), 1.0),
                PriceBar::from_close(day(3), 33.0),
                PriceBar::from_close(day(2), 2.0),
            ],
        );

        assert_eq!(series.ticker, "MSFT");
        assert_eq!(series.dates(), vec![day(1), day(2), day(3)]);
        assert_eq!(series.closes(), vec![1.0, 2.0, 33.0]);
        assert_eq!(series.last_close(), Some(33.0));
    }

    #[test]
    fn test_series_since() {
        let series = PriceSeries::new(
            "X",
            (1..=5).map(|d| PriceBar::from_close(day(d), d as f64)).collect(),
        );
        let trimmed = series.since(day(4));
        assert_eq!(trimmed.closes(), vec![4.0, 5.0]);
        assert!(PriceSeries::empty("X").last_close().is_none());
    }

    #[test]
    fn test_quote_from_closes() {
        let quote = Quote::from_closes("aapl", 200.0, 205.0);
        assert_eq!(quote.ticker, "AAPL");
        assert_eq!(quote.change, 5.0);
        assert!((quote.change_percent - 2.5).abs() < 1e-12);

        let flat = Quote::from_closes("X", 0.0, 1.0);
        assert_eq!(flat.change_percent, 0.0);
    }

    #[test]
    fn test_period_and_interval_strings() {
        assert_eq!("2Y".parse::<Period>().unwrap(), Period::Year2);
        assert_eq!(Period::Month6.to_string(), "6mo");
        assert!("7y".parse::<Period>().is_err());
        assert_eq!(Period::Max.calendar_days(), None);

        assert_eq!("1wk".parse::<Interval>().unwrap(), Interval::Weekly);
        assert_eq!(
            serde_json::to_string(&Interval::Daily).unwrap(),
            "\"1d\""
        );
        let period: Period = serde_json::from_str("\"3y\"").unwrap();
        assert_eq!(period, Period::Year3);
    }

    #[test]
    fn test_equity_point_serializes_return_field() {
        let point = EquityCurvePoint {
            date: day(1),
            portfolio_value: 100.0,
            period_return: 0.0,
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["return"], 0.0);
        assert_eq!(json["date"], "2024-03-01");
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
