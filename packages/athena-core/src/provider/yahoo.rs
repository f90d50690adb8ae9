//! Yahoo Finance chart API provider.
//!
//! Uses the public `v8/finance/chart` endpoint with a blocking HTTP client.
//! Response decoding is kept in [`parse_chart`] so it can be exercised without
//! the network.

use super::{PriceProvider, ProviderError, ProviderResult};
use crate::types::{Interval, Period, PriceBar, PriceSeries, Quote};
use chrono::{DateTime, NaiveDate};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Decoded chart response: the bar history plus quote metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPayload {
    pub series: PriceSeries,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub chart_previous_close: Option<f64>,
}

impl ChartPayload {
    /// Latest quote implied by the payload.
    ///
    /// The previous close is taken from the second-to-last bar when there is
    /// one, otherwise from the metadata.
    pub fn quote(&self) -> ProviderResult<Quote> {
        let ticker = &self.series.ticker;
        let last_price = self
            .regular_market_price
            .or_else(|| self.series.last_close())
            .ok_or_else(|| ProviderError::NoData(ticker.clone()))?;

        let bars = &self.series.bars;
        let previous = bars
            .len()
            .checked_sub(2)
            .map(|idx| bars[idx].close)
            .or(self.previous_close)
            .or(self.chart_previous_close)
            .unwrap_or(last_price);

        Ok(Quote::from_closes(ticker, previous, last_price))
    }
}

/// Decode a chart API body for `ticker`.
///
/// Bars with any missing OHLC field are skipped. Timestamps are shifted by
/// the exchange's GMT offset before taking the calendar date.
pub fn parse_chart(ticker: &str, body: &str) -> ProviderResult<ChartPayload> {
    let response: ChartResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    if let Some(error) = response.chart.error {
        return Err(ProviderError::Api {
            code: error.code,
            description: error.description,
        });
    }

    let data = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::NoData(ticker.to_uppercase()))?;

    let block = data.indicators.quote.into_iter().next().unwrap_or_default();
    let offset = data.meta.gmtoffset;

    let mut bars = Vec::with_capacity(data.timestamp.len());
    for (i, &ts) in data.timestamp.iter().enumerate() {
        let field = |values: &[Option<f64>]| values.get(i).copied().flatten();
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&block.open),
            field(&block.high),
            field(&block.low),
            field(&block.close),
        ) else {
            continue;
        };
        let Some(date) = timestamp_to_date(ts, offset) else {
            continue;
        };
        let volume = field(&block.volume).unwrap_or(0.0).max(0.0).round() as u64;

        bars.push(PriceBar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    Ok(ChartPayload {
        series: PriceSeries::new(ticker, bars),
        regular_market_price: data.meta.regular_market_price,
        previous_close: data.meta.previous_close,
        chart_previous_close: data.meta.chart_previous_close,
    })
}

fn timestamp_to_date(ts: i64, gmtoffset: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts + gmtoffset, 0).map(|dt| dt.date_naive())
}

/// Yahoo Finance chart client.
#[derive(Debug, Clone)]
pub struct YahooProvider {
    base_url: String,
    client: Client,
}

impl YahooProvider {
    /// Create a client against `base_url` (the `.../v8/finance/chart` root).
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Build the chart URL, percent-encoding the ticker (e.g. `^GSPC`).
    pub fn chart_url(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| ProviderError::Unsupported(format!("bad base url: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| ProviderError::Unsupported(format!("bad base url: {}", self.base_url)))?
            .push(&ticker.trim().to_uppercase());

        url.query_pairs_mut()
            .append_pair("range", period.as_str())
            .append_pair("interval", interval.as_str());

        Ok(url)
    }

    fn fetch_chart(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<ChartPayload> {
        let url = self.chart_url(ticker, period, interval)?;
        tracing::debug!(%url, "fetching chart");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        match parse_chart(ticker, &body) {
            Err(ProviderError::Decode(_)) if !status.is_success() => Err(ProviderError::Transport(
                format!("HTTP {} for {}", status, ticker),
            )),
            other => other,
        }
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch_history(
        &self,
        ticker: &str,
        period: Period,
        interval: Interval,
    ) -> ProviderResult<PriceSeries> {
        Ok(self.fetch_chart(ticker, period, interval)?.series)
    }

    fn fetch_quote(&self, ticker: &str) -> ProviderResult<Quote> {
        self.fetch_chart(ticker, Period::Days5, Interval::Daily)?.quote()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-01-02 and 2024-01-03 14:30 UTC, NYSE offset -5h
    const CHART_OK: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "symbol": "AAPL",
                    "regularMarketPrice": 186.5,
                    "chartPreviousClose": 190.0,
                    "gmtoffset": -18000
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.15, 184.22, 182.15],
                        "high": [188.44, 185.88, 183.09],
                        "low": [183.89, 183.43, 180.88],
                        "close": [185.64, 184.25, null],
                        "volume": [82488700, 58414500, 71983600]
                    }],
                    "adjclose": [{ "adjclose": [185.1, 183.7, 181.4] }]
                }
            }],
            "error": null
        }
    }"#;

    const CHART_ERR: &str = r#"{
        "chart": {
            "result": null,
            "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
        }
    }"#;

    fn provider() -> YahooProvider {
        YahooProvider::new(
            "https://query1.finance.yahoo.com/v8/finance/chart/",
            Duration::from_secs(5),
            "athena-test",
        )
        .unwrap()
    }

    #[test]
    fn test_parse_chart_bars() {
        let payload = parse_chart("aapl", CHART_OK).unwrap();
        let series = payload.series;

        assert_eq!(series.ticker, "AAPL");
        // Third bar has a null close and is skipped
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.dates(),
            vec![
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
            ]
        );
        assert_eq!(series.closes(), vec![185.64, 184.25]);
        assert_eq!(series.bars[0].volume, 82_488_700);
    }

    #[test]
    fn test_parse_chart_quote() {
        let quote = parse_chart("AAPL", CHART_OK).unwrap().quote().unwrap();

        assert_eq!(quote.last_price, 186.5);
        // Previous close comes from the second-to-last bar
        assert!((quote.change - (186.5 - 185.64)).abs() < 1e-9);
    }

    #[test]
    fn test_parse_chart_quote_from_meta() {
        let body = r#"{"chart":{"result":[{"meta":{"regularMarketPrice":10.0,"previousClose":8.0},
            "timestamp":[],"indicators":{"quote":[{}]}}],"error":null}}"#;
        let payload = parse_chart("X", body).unwrap();
        assert!(payload.series.is_empty());

        let quote = payload.quote().unwrap();
        assert_eq!(quote.change, 2.0);
        assert_eq!(quote.change_percent, 25.0);
    }

    #[test]
    fn test_parse_chart_api_error() {
        let err = parse_chart("ZZZZ", CHART_ERR).unwrap_err();
        assert!(matches!(err, ProviderError::Api { ref code, .. } if code == "Not Found"));
    }

    #[test]
    fn test_parse_chart_garbage() {
        assert!(matches!(
            parse_chart("X", "<html>rate limited</html>"),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_chart_url_encodes_index_ticker() {
        let url = provider()
            .chart_url("^gspc", Period::Year3, Interval::Daily)
            .unwrap();
        assert!(url.path().starts_with("/v8/finance/chart/"));
        assert!(url.path().ends_with("GSPC"));
        assert_eq!(url.query(), Some("range=3y&interval=1d"));
    }
}
