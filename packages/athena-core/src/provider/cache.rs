//! Time-to-live cache in front of another provider.

use super::{PriceProvider, ProviderResult};
use crate::types::{Interval, Period, PriceSeries, Quote};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

type HistoryKey = (String, Period, Interval);

#[derive(Debug, Clone)]
struct CacheEntry<T> {
    value: T,
    stored_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// Fresh value for `key`; an expired entry is removed.
fn lookup<K: Eq + Hash, T: Clone>(
    map: &mut HashMap<K, CacheEntry<T>>,
    key: &K,
    ttl: Duration,
) -> Option<T> {
    if let Some(entry) = map.get(key) {
        if entry.is_fresh(ttl) {
            return Some(entry.value.clone());
        }
        map.remove(key);
    }
    None
}

/// Insert `value` after sweeping every expired entry.
fn store<K: Eq + Hash, T>(
    map: &mut HashMap<K, CacheEntry<T>>,
    key: K,
    value: T,
    ttl: Duration,
) {
    map.retain(|_, entry| entry.is_fresh(ttl));
    map.insert(
        key,
        CacheEntry {
            value,
            stored_at: Instant::now(),
        },
    );
}

/// Caches successful, non-empty results of the wrapped provider for a fixed TTL.
///
/// Histories are keyed by `(ticker, period, interval)`, quotes by ticker.
/// Failures are never cached. Expired entries are dropped when their key
/// misses and swept whenever a new entry is stored.
#[derive(Debug)]
pub struct CachedProvider<P> {
    inner: P,
    ttl: Duration,
    histories: Mutex<HashMap<HistoryKey, CacheEntry<PriceSeries>>>,
    quotes: Mutex<HashMap<String, CacheEntry<Quote>>>,
}

impl<P: PriceProvider> CachedProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            histories: Mutex::new(HashMap::new()),
            quotes: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.histories.lock().clear();
        self.quotes.lock().clear();
    }

    /// Number of unexpired histories and quotes.
    pub fn len(&self) -> usize {
        let live_histories = self
            .histories
            .lock()
            .values()
            .filter(|entry| entry.is_fresh(self.ttl))
            .count();
        let live_quotes = self
            .quotes
            .lock()
            .values()
            .filter(|entry| entry.is_fresh(self.ttl))
            .count();
        live_histories + live_quotes
    }

    /// Number of entries held in memory, expired ones included.
    #[cfg(test)]
    fn resident(&self) -> usize {
        self.histories.lock().len() + self.quotes.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: PriceProvider> PriceProvider for CachedProvider<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<PriceSeries> {
        let key = (ticker.trim().to_uppercase(), period, interval);

        if let Some(series) = lookup(&mut *self.histories.lock(), &key, self.ttl) {
            tracing::debug!(ticker = %key.0, %period, %interval, "history cache hit");
            return Ok(series);
        }

        tracing::debug!(ticker = %key.0, %period, %interval, "history cache miss");
        let series = self.inner.fetch_history(ticker, period, interval)?;
        if !series.is_empty() {
            store(&mut *self.histories.lock(), key, series.clone(), self.ttl);
        }
        Ok(series)
    }

    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote> {
        let key = ticker.trim().to_uppercase();

        if let Some(quote) = lookup(&mut *self.quotes.lock(), &key, self.ttl) {
            tracing::debug!(ticker = %key, "quote cache hit");
            return Ok(quote);
        }

        let quote = self.inner.fetch_quote(ticker)?;
        store(&mut *self.quotes.lock(), key, quote.clone(), self.ttl);
        Ok(quote)
    }
}
