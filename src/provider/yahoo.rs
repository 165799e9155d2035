use crate::model::{FetchError, PriceBar};
use crate::provider::MarketDataProvider;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo Finance v8 chart API response envelope.
#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: ChartOutcome,
}

#[derive(Debug, Deserialize)]
struct ChartOutcome {
    result: Option<Vec<ChartSeries>>,
    error: Option<ChartApiError>,
}

#[derive(Debug, Deserialize)]
struct ChartApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartSeries {
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<QuoteColumns>,
    adjclose: Option<Vec<AdjCloseColumn>>,
}

#[derive(Debug, Deserialize)]
struct QuoteColumns {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    adjclose: Vec<Option<f64>>,
}

/// Fetches daily OHLCV bars from the Yahoo Finance chart endpoint.
///
/// One request per symbol, no retries: a failed symbol is reported to the
/// caller, which logs it and moves on to the next ticker.
pub struct YahooProvider {
    client: Client,
}

impl YahooProvider {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;
        Ok(Self { client })
    }

    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        // The API takes unix-second bounds; cover the whole end day.
        let period1 = start.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc().timestamp();
        let period2 = end.and_hms_opt(23, 59, 59).unwrap_or_default().and_utc().timestamp();
        format!(
            "https://query1.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={period1}&period2={period2}&interval=1d&includeAdjustedClose=true"
        )
    }

    fn bars_from_response(symbol: &str, envelope: ChartEnvelope) -> Result<Vec<PriceBar>, FetchError> {
        let result = envelope.chart.result.ok_or_else(|| match envelope.chart.error {
            Some(err) if err.code == "Not Found" => FetchError::SymbolNotFound(symbol.to_string()),
            Some(err) => FetchError::InvalidResponse(format!("{}: {}", err.code, err.description)),
            None => FetchError::InvalidResponse("empty result with no error".to_string()),
        })?;

        let series = result
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::InvalidResponse("result array is empty".to_string()))?;

        let timestamps = series
            .timestamp
            .ok_or_else(|| FetchError::InvalidResponse("no timestamps".to_string()))?;

        let quote = series
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::InvalidResponse("no quote columns".to_string()))?;

        let adj_closes = series
            .indicators
            .adjclose
            .and_then(|cols| cols.into_iter().next())
            .map(|col| col.adjclose);

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| FetchError::InvalidResponse(format!("invalid timestamp: {ts}")))?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();
            let adj_close = adj_closes.as_ref().and_then(|col| col.get(i).copied().flatten());

            // All-null rows are non-trading days.
            if open.is_none() && high.is_none() && low.is_none() && close.is_none() && volume.is_none() {
                continue;
            }

            bars.push(PriceBar {
                date,
                symbol: symbol.to_string(),
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                // Yahoo omits adjclose for some instruments; fall back to close.
                adj_close: adj_close.or(close).unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0) as i64,
            });
        }

        if bars.is_empty() {
            return Err(FetchError::NoData(symbol.to_string()));
        }
        Ok(bars)
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, FetchError> {
        let url = Self::chart_url(symbol, start, end);
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::SymbolNotFound(symbol.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::InvalidResponse(format!("HTTP {status} for {symbol}")));
        }

        let envelope: ChartEnvelope = response.json().await?;
        Self::bars_from_response(symbol, envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixture(timestamps: &str, quote: &str, adjclose: &str) -> ChartEnvelope {
        let json = format!(
            r#"{{"chart":{{"result":[{{"timestamp":{timestamps},
                "indicators":{{"quote":[{quote}],"adjclose":[{adjclose}]}}}}],"error":null}}}}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn parses_bars_and_skips_all_null_rows() {
        // 2024-01-02 and 2024-01-04 trade; 2024-01-03 is all null.
        let envelope = fixture(
            "[1704153600, 1704240000, 1704326400]",
            r#"{"open":[10.0,null,11.0],"high":[10.5,null,11.5],
                "low":[9.5,null,10.5],"close":[10.2,null,11.2],
                "volume":[1000,null,2000]}"#,
            r#"{"adjclose":[10.1,null,11.1]}"#,
        );

        let bars = YahooProvider::bars_from_response("AAPL", envelope).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[0].symbol, "AAPL");
        assert_eq!(bars[0].adj_close, 10.1);
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(bars[1].volume, 2000);
    }

    #[test]
    fn missing_adjclose_falls_back_to_close() {
        let json = r#"{"chart":{"result":[{"timestamp":[1704153600],
            "indicators":{"quote":[{"open":[10.0],"high":[10.5],"low":[9.5],
            "close":[10.2],"volume":[1000]}]}}],"error":null}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();

        let bars = YahooProvider::bars_from_response("XOM", envelope).unwrap();
        assert_eq!(bars[0].adj_close, 10.2);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let json = r#"{"chart":{"result":null,
            "error":{"code":"Not Found","description":"No data found"}}}"#;
        let envelope: ChartEnvelope = serde_json::from_str(json).unwrap();

        match YahooProvider::bars_from_response("NOPE", envelope) {
            Err(FetchError::SymbolNotFound(symbol)) => assert_eq!(symbol, "NOPE"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn chart_url_covers_whole_end_day() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let url = YahooProvider::chart_url("MSFT", start, end);
        assert!(url.contains("/v8/finance/chart/MSFT"));
        assert!(url.contains("period1=1704067200"));
        assert!(url.contains("period2=1706745599"));
        assert!(url.contains("interval=1d"));
    }
}
