//! In-memory provider for embedding pre-fetched data.

use super::{quote_from_series, trim_to_period, PriceProvider, ProviderError, ProviderResult};
use crate::types::{Interval, Period, PriceSeries, Quote};
use std::collections::HashMap;

/// Provider serving series and quotes held in memory.
///
/// Histories are trimmed to the requested period; the interval is ignored.
/// A quote falls back to the last two bars of the ticker's series.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: HashMap<String, PriceSeries>,
    quotes: HashMap<String, Quote>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the history for the series' ticker.
    pub fn insert_series(&mut self, series: PriceSeries) {
        self.series.insert(series.ticker.clone(), series);
    }

    /// Add or replace an explicit quote.
    pub fn insert_quote(&mut self, quote: Quote) {
        self.quotes.insert(quote.ticker.clone(), quote);
    }

    /// Builder-style variant of [`insert_series`](Self::insert_series).
    pub fn with_series(mut self, series: PriceSeries) -> Self {
        self.insert_series(series);
        self
    }

    pub fn tickers(&self) -> Vec<String> {
        let mut tickers: Vec<String> = self.series.keys().cloned().collect();
        tickers.sort();
        tickers
    }
}

impl PriceProvider for MemoryProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        _interval: Interval,
    ) -> ProviderResult<PriceSeries> {
        let key = ticker.trim().to_uppercase();
        self.series
            .get(&key)
            .cloned()
            .map(|series| trim_to_period(series, period))
            .ok_or(ProviderError::NoData(key))
    }

    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote> {
        let key = ticker.trim().to_uppercase();
        if let Some(quote) = self.quotes.get(&key) {
            return Ok(quote.clone());
        }

        self.series
            .get(&key)
            .and_then(quote_from_series)
            .ok_or(ProviderError::NoData(key))
    }
}
