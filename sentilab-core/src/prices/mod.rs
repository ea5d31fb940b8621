//! Historical closing prices and daily returns.
//!
//! Feeds the returns table that sentiment output is correlated against.

pub mod circuit_breaker;
pub mod provider;
pub mod returns;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use provider::{ClosePoint, PriceError, PriceProvider, PriceSeries};
pub use returns::{daily_returns, ReturnPoint, ReturnsTable};
pub use yahoo::YahooProvider;
