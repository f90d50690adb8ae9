//! Offline provider reading `<TICKER>.csv` files from a directory.
//!
//! Expected columns (case-insensitive, any order, extras ignored):
//! `date,open,high,low,close,volume`. Dates are `YYYY-MM-DD`; anything after
//! the first ten characters (a time component) is ignored.

use super::{quote_from_series, trim_to_period, PriceProvider, ProviderError, ProviderResult};
use crate::types::{Interval, Period, PriceBar, PriceSeries, Quote};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: Option<f64>,
}

/// Provider backed by a directory of daily CSV price files.
#[derive(Debug, Clone)]
pub struct CsvDirectoryProvider {
    dir: PathBuf,
}

impl CsvDirectoryProvider {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File holding the history for `ticker`.
    pub fn path_for(&self, ticker: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", ticker.trim().to_uppercase()))
    }

    /// Read the full history for `ticker`.
    pub fn read_series(&self, ticker: &str) -> ProviderResult<PriceSeries> {
        let path = self.path_for(ticker);
        if !path.exists() {
            return Err(ProviderError::NoData(ticker.trim().to_uppercase()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(&path)
            .map_err(|e| ProviderError::Decode(format!("{}: {}", path.display(), e)))?;

        let headers: csv::StringRecord = reader
            .headers()
            .map_err(|e| ProviderError::Decode(format!("{}: {}", path.display(), e)))?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();
        reader.set_headers(headers);

        let mut bars = Vec::new();
        for (idx, record) in reader.deserialize::<CsvBar>().enumerate() {
            let row = record.map_err(|e| {
                ProviderError::Decode(format!("{} row {}: {}", path.display(), idx + 1, e))
            })?;
            let date = parse_date(&row.date).ok_or_else(|| {
                ProviderError::Decode(format!(
                    "{} row {}: bad date {:?}",
                    path.display(),
                    idx + 1,
                    row.date
                ))
            })?;

            bars.push(PriceBar {
                date,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume.unwrap_or(0.0).max(0.0).round() as u64,
            });
        }

        Ok(PriceSeries::new(ticker, bars))
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

impl PriceProvider for CsvDirectoryProvider {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<PriceSeries> {
        if interval != Interval::Daily {
            return Err(ProviderError::Unsupported(format!(
                "csv provider only serves daily bars, got {}",
                interval
            )));
        }

        let series = self.read_series(ticker)?;
        Ok(trim_to_period(series, period))
    }

    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote> {
        let series = self.read_series(ticker)?;
        quote_from_series(&series).ok_or_else(|| ProviderError::NoData(series.ticker.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_reads_history() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "MSFT.csv",
            "Date,Open,High,Low,Close,Adj_Close,Volume\n\
             2024-01-03,10,11,9,10.5,10.4,1000\n\
             2024-01-02,9,10,8,9.5,9.4,2000\n",
        );

        let provider = CsvDirectoryProvider::new(dir.path());
        let series = provider
            .fetch_history("msft", Period::Max, Interval::Daily)
            .unwrap();

        assert_eq!(series.ticker, "MSFT");
        assert_eq!(series.closes(), vec![9.5, 10.5]);
        assert_eq!(series.bars[0].volume, 2000);
    }

    #[test]
    fn test_period_trims_from_last_bar() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "X.csv",
            "date,open,high,low,close,volume\n\
             2021-01-04,1,1,1,1,0\n\
             2024-01-02 00:00:00,2,2,2,2,0\n\
             2024-02-01,3,3,3,3,0\n",
        );

        let provider = CsvDirectoryProvider::new(dir.path());
        let series = provider
            .fetch_history("X", Period::Year1, Interval::Daily)
            .unwrap();
        assert_eq!(series.closes(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_missing_file_is_no_data() {
        let dir = tempdir().unwrap();
        let provider = CsvDirectoryProvider::new(dir.path());
        assert_eq!(
            provider.fetch_history("NOPE", Period::Year1, Interval::Daily),
            Err(ProviderError::NoData("NOPE".to_string()))
        );
    }

    #[test]
    fn test_weekly_unsupported() {
        let dir = tempdir().unwrap();
        let provider = CsvDirectoryProvider::new(dir.path());
        assert!(matches!(
            provider.fetch_history("X", Period::Year1, Interval::Weekly),
            Err(ProviderError::Unsupported(_))
        ));
    }

    #[test]
    fn test_bad_row_is_decode_error() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "BAD.csv",
            "date,open,high,low,close,volume\n2024-01-02,1,1,1,abc,0\n",
        );
        let provider = CsvDirectoryProvider::new(dir.path());
        assert!(matches!(
            provider.fetch_history("BAD", Period::Max, Interval::Daily),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_quote_from_last_two_bars() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "Q.csv",
            "date,open,high,low,close,volume\n\
             2024-01-02,1,1,1,100,0\n\
             2024-01-03,1,1,1,102,0\n",
        );
        let quote = CsvDirectoryProvider::new(dir.path())
            .fetch_quote("q")
            .unwrap();
        assert_eq!(quote.last_price, 102.0);
        assert_eq!(quote.change, 2.0);
        assert!((quote.change_percent - 2.0).abs() < 1e-12);
    }
}
