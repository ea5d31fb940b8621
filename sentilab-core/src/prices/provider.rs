//! Price provider trait and its error type.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One daily close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    pub date: NaiveDate,
    pub close: f64,
}

/// Closing prices for one ticker, ascending by date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub symbol: String,
    pub closes: Vec<ClosePoint>,
}

#[derive(Debug, Error)]
pub enum PriceError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: price provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("price fetch cancelled")]
    Cancelled,

    #[error("price error: {0}")]
    Other(String),
}

/// Source of daily closing prices over `[start, end)`.
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch_closes(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<PriceSeries, PriceError>;

    /// False while the provider refuses requests (e.g. breaker open).
    fn is_available(&self) -> bool;
}
