//! Yahoo Finance closing prices.
//!
//! Reads daily closes from the v8 chart API. Adjusted closes are preferred
//! when the response carries them. Rate limits and server errors are retried
//! under a [`RetryPolicy`]; an HTTP 403 trips the circuit breaker at once.

use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{ClosePoint, PriceError, PriceProvider, PriceSeries};
use crate::retry::{CancelToken, RetryPolicy, Sleeper, ThreadSleeper};

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
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
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjCloseData>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseData {
    adjclose: Vec<Option<f64>>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
    cancel: CancelToken,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()?;

        Ok(Self {
            client,
            circuit_breaker,
            policy: RetryPolicy {
                base_delay: Duration::from_millis(500),
                multiplier: 2.0,
                max_delay: Duration::from_secs(30),
                max_attempts: Some(4),
                jitter: 0.0,
            },
            sleeper: Arc::new(ThreadSleeper::default()),
            cancel: CancelToken::new(),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Chart API URL for `[start, end)`.
    pub fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp();
        format!(
            "https://query2.finance.yahoo.com/v8/finance/chart/{symbol}\
             ?period1={start_ts}&period2={end_ts}&interval=1d\
             &includeAdjustedClose=true"
        )
    }

    /// Parse a chart API body into ascending closes.
    pub fn parse_chart(symbol: &str, body: &str) -> Result<PriceSeries, PriceError> {
        let resp: ChartResponse = serde_json::from_str(body).map_err(|e| {
            PriceError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;

        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => PriceError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => PriceError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => PriceError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| PriceError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data.timestamp.unwrap_or_default();
        let closes = data
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close)
            .ok_or_else(|| PriceError::ResponseFormatChanged("no quote data".into()))?;
        let adj = data
            .indicators
            .adjclose
            .and_then(|v| v.into_iter().next())
            .map(|a| a.adjclose);

        let mut points = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.date_naive())
                .ok_or_else(|| PriceError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            let value = adj
                .as_ref()
                .and_then(|v| v.get(i).copied().flatten())
                .or_else(|| closes.get(i).copied().flatten());

            // Non-trading rows come back as nulls.
            if let Some(close) = value {
                points.push(ClosePoint { date, close });
            }
        }

        if points.is_empty() {
            return Err(PriceError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        points.sort_by_key(|p| p.date);
        points.dedup_by_key(|p| p.date);

        Ok(PriceSeries {
            symbol: symbol.to_string(),
            closes: points,
        })
    }

    fn fetch_with_retry(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, PriceError> {
        let url = Self::chart_url(symbol, start, end);
        let mut attempts = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(PriceError::Cancelled);
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(PriceError::CircuitBreakerTripped);
            }

            attempts += 1;
            let err = match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(PriceError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        PriceError::RateLimited {
                            retry_after_secs: retry_after,
                        }
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(PriceError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    } else if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        PriceError::Other(format!("HTTP {status} for {symbol}"))
                    } else {
                        let body = resp
                            .text()
                            .map_err(|e| PriceError::NetworkUnreachable(e.to_string()))?;
                        let series = Self::parse_chart(symbol, &body)?;
                        self.circuit_breaker.record_success();
                        return Ok(series);
                    }
                }
                Err(e) if e.is_connect() || e.is_timeout() => PriceError::NetworkUnreachable(e.to_string()),
                Err(e) => return Err(PriceError::NetworkUnreachable(e.to_string())),
            };

            if !self.policy.allows_attempt(attempts) {
                return Err(err);
            }
            let delay = self.policy.delay(attempts);
            tracing::warn!(symbol, attempt = attempts, delay_ms = delay.as_millis() as u64, "{err}, retrying");
            if self.sleeper.sleep(delay, &self.cancel).is_err() {
                return Err(PriceError::Cancelled);
            }
        }
    }
}

impl PriceProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, PriceError> {
        self.fetch_with_retry(symbol, start, end)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
            .and_utc()
            .timestamp()
    }

    #[test]
    fn chart_url_uses_epoch_bounds() {
        let url = YahooProvider::chart_url(
            "AAPL",
            NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2021, 1, 2).unwrap(),
        );
        assert!(url.contains("/chart/AAPL?period1=1609459200&period2=1609545600"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn prefers_adjusted_close_and_skips_nulls() {
        let body = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{},{},{}],
                "indicators":{{"quote":[{{"close":[100.0,null,102.0]}}],
                "adjclose":[{{"adjclose":[99.0,null,101.0]}}]}}}}],"error":null}}}}"#,
            ts(2024, 1, 2),
            ts(2024, 1, 3),
            ts(2024, 1, 4)
        );
        let series = YahooProvider::parse_chart("AAPL", &body).unwrap();
        assert_eq!(series.closes.len(), 2);
        assert_eq!(series.closes[0].close, 99.0);
        assert_eq!(series.closes[1].date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
    }

    #[test]
    fn falls_back_to_raw_close() {
        let body = format!(
            r#"{{"chart":{{"result":[{{"timestamp":[{}],
                "indicators":{{"quote":[{{"close":[50.5]}}]}}}}],"error":null}}}}"#,
            ts(2024, 1, 2)
        );
        let series = YahooProvider::parse_chart("XYZ", &body).unwrap();
        assert_eq!(series.closes[0].close, 50.5);
    }

    #[test]
    fn not_found_error_maps_to_symbol_not_found() {
        let body = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found"}}}"#;
        assert!(matches!(
            YahooProvider::parse_chart("NOPE", body),
            Err(PriceError::SymbolNotFound { .. })
        ));
    }

    #[test]
    fn garbage_is_format_change() {
        assert!(matches!(
            YahooProvider::parse_chart("AAPL", "<html>"),
            Err(PriceError::ResponseFormatChanged(_))
        ));
    }
}
