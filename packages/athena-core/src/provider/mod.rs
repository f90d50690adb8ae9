//! Price series providers.
//!
//! Every data source sits behind [`PriceProvider`]. The concrete source is
//! chosen once from configuration by [`build_provider`], optionally wrapped in
//! a [`CachedProvider`].

mod cache;
mod csv_dir;
mod memory;
mod yahoo;

pub use cache::CachedProvider;
pub use csv_dir::CsvDirectoryProvider;
pub use memory::MemoryProvider;
pub use yahoo::{parse_chart, ChartPayload, YahooProvider};

use crate::config::ProviderConfig;
use crate::types::{Interval, Period, PriceSeries, Quote};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Errors that a [`PriceProvider`] implementation may return.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream API returned an application-level error.
    #[error("provider api error [{code}]: {description}")]
    Api { code: String, description: String },

    /// A response payload or file could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The provider has nothing for this ticker.
    #[error("no data for {0}")]
    NoData(String),

    /// The request shape is not supported by this provider.
    #[error("unsupported request: {0}")]
    Unsupported(String),
}

/// Result type for provider calls.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Upstream market-data provider contract.
///
/// Callers treat an `Err` and an empty series the same way: no data for
/// that ticker.
pub trait PriceProvider: Send + Sync {
    /// Human-readable name identifying this provider.
    fn name(&self) -> &'static str;

    /// Fetch OHLCV history for `ticker` over `period` at `interval`.
    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<PriceSeries>;

    /// Fetch the latest quote for `ticker`.
    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote>;
}

impl<P: PriceProvider + ?Sized> PriceProvider for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<PriceSeries> {
        (**self).fetch_history(ticker, period, interval)
    }

    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote> {
        (**self).fetch_quote(ticker)
    }
}

/// Which data source to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Yahoo chart API over HTTP
    Yahoo,
    /// Local directory of `<TICKER>.csv` files
    Csv,
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "csv" => Ok(ProviderKind::Csv),
            other => Err(format!("Unknown provider: {} (expected yahoo or csv)", other)),
        }
    }
}

/// Build the configured provider, wrapped in a cache when a TTL is set.
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn PriceProvider>> {
    let ttl = Duration::from_secs(config.cache_ttl_secs);

    let provider: Box<dyn PriceProvider> = match config.kind {
        ProviderKind::Yahoo => {
            let yahoo = YahooProvider::new(
                &config.base_url,
                Duration::from_secs(config.timeout_secs),
                &config.user_agent,
            )?;
            wrap_cached(yahoo, ttl)
        }
        ProviderKind::Csv => {
            let dir = config.data_dir.as_ref().ok_or_else(|| {
                Error::Config("provider.data_dir is required for the csv provider".to_string())
            })?;
            wrap_cached(CsvDirectoryProvider::new(dir), ttl)
        }
    };

    tracing::debug!(provider = provider.name(), ttl_secs = ttl.as_secs(), "built price provider");
    Ok(provider)
}

fn wrap_cached<P: PriceProvider + 'static>(provider: P, ttl: Duration) -> Box<dyn PriceProvider> {
    if ttl.is_zero() {
        Box::new(provider)
    } else {
        Box::new(CachedProvider::new(provider, ttl))
    }
}

/// Keep bars within `period` of the series' last bar.
pub(crate) fn trim_to_period(series: PriceSeries, period: Period) -> PriceSeries {
    let (Some(days), Some(last)) = (period.calendar_days(), series.bars.last()) else {
        return series;
    };
    let start = last.date - chrono::Duration::days(days);
    series.since(start)
}

/// Quote from the last two bars of a series.
pub(crate) fn quote_from_series(series: &PriceSeries) -> Option<Quote> {
    let last = series.bars.last()?;
    let previous = series
        .bars
        .len()
        .checked_sub(2)
        .map(|idx| series.bars[idx].close)
        .unwrap_or(last.close);
    Some(Quote::from_closes(&series.ticker, previous, last.close))
}
