//! Returns orchestrator: fetch closes per ticker and build the wide returns table.

use chrono::NaiveDate;

use sentilab_core::prices::{PriceError, PriceProvider, ReturnsTable};
use sentilab_core::CancelToken;

/// Large-cap tickers across sectors, plus the mega-cap tech names.
pub const DEFAULT_RETURN_TICKERS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "NVDA", "AMD", "INTC", "CSCO", //
    "XOM", "CVX", "COP", "SLB", "HAL", "OXY", "VLO", "MPC", "PSX", "EOG", //
    "JPM", "BAC", "WFC", "C", "GS", "MS", "PFE", "JNJ", "MRK", "LLY", //
    "PG", "KO", "PEP", "WMT", "TGT", "COST", "HD", "LOW", "DIS", "NFLX", //
    "T", "VZ", "CMCSA", "TMUS", "BA", "CAT", "GE", "MMM", "UPS",
];

pub fn default_return_tickers() -> Vec<String> {
    DEFAULT_RETURN_TICKERS.iter().map(|s| s.to_string()).collect()
}

/// Outcome of a returns batch. Tickers that failed or had too few closes are
/// listed in `skipped` and have no column in `table`.
#[derive(Debug)]
pub struct ReturnsSummary {
    pub table: ReturnsTable,
    pub skipped: Vec<(String, PriceError)>,
    pub cancelled: bool,
}

impl ReturnsSummary {
    pub fn all_succeeded(&self) -> bool {
        self.skipped.is_empty() && !self.cancelled
    }
}

/// Fetch closes for `[start, end)` for each ticker in order.
///
/// Once the provider reports itself unavailable (circuit breaker open) the
/// remaining tickers are skipped without a request.
pub fn collect_returns(
    provider: &dyn PriceProvider,
    tickers: &[String],
    start: NaiveDate,
    end: NaiveDate,
    cancel: &CancelToken,
) -> ReturnsSummary {
    let total = tickers.len();
    let mut table = ReturnsTable::new();
    let mut skipped: Vec<(String, PriceError)> = Vec::new();
    let mut cancelled = false;

    for (i, ticker) in tickers.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        tracing::info!(ticker = %ticker, provider = provider.name(), "[{}/{}] fetching closes", i + 1, total);

        match provider.fetch_closes(ticker, start, end) {
            Ok(series) => {
                if !table.add_series(&series) {
                    skipped.push((
                        ticker.clone(),
                        PriceError::Other(format!("{} close(s), need at least 2", series.closes.len())),
                    ));
                }
            }
            Err(PriceError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(e) => {
                tracing::error!(ticker = %ticker, error = %e, "failed to fetch closes");
                skipped.push((ticker.clone(), e));
            }
        }

        if !provider.is_available() {
            tracing::error!(remaining = total - i - 1, "price provider unavailable, skipping remaining tickers");
            for rest in &tickers[(i + 1)..] {
                skipped.push((rest.clone(), PriceError::CircuitBreakerTripped));
            }
            break;
        }
    }

    tracing::info!(
        tickers = table.tickers().len(),
        rows = table.len(),
        skipped = skipped.len(),
        cancelled,
        "returns batch complete"
    );

    ReturnsSummary {
        table,
        skipped,
        cancelled,
    }
}
