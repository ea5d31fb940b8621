//! Fetch error taxonomy.

use thiserror::Error;

/// Everything that can go wrong while retrieving one feed query.
///
/// The first four variants are transient and retried by the fetcher.
/// `FeedParseError` is a hard failure of the unit. `RetriesExhausted` and
/// `Cancelled` are produced by the retry loop itself.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network unreachable")]
    ConnectivityUnavailable,

    #[error("feed request timed out")]
    FetchTimeout,

    #[error("feed request returned HTTP {status}")]
    FetchHttpError { status: u16 },

    #[error("transport error: {0}")]
    FetchTransportError(String),

    #[error("malformed feed: {0}")]
    FeedParseError(String),

    #[error("gave up after {attempts} attempts, last error: {last}")]
    RetriesExhausted { attempts: u32, last: Box<FetchError> },

    #[error("fetch cancelled")]
    Cancelled,
}

impl FetchError {
    /// Whether the retry loop should try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::ConnectivityUnavailable
                | FetchError::FetchTimeout
                | FetchError::FetchHttpError { .. }
                | FetchError::FetchTransportError(_)
        )
    }

    /// Map a reqwest transport failure onto the taxonomy.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::FetchTimeout
        } else if let Some(status) = err.status() {
            FetchError::FetchHttpError { status: status.as_u16() }
        } else if err.is_connect() {
            FetchError::ConnectivityUnavailable
        } else {
            FetchError::FetchTransportError(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_are_retryable() {
        assert!(FetchError::ConnectivityUnavailable.is_retryable());
        assert!(FetchError::FetchTimeout.is_retryable());
        assert!(FetchError::FetchHttpError { status: 503 }.is_retryable());
        assert!(FetchError::FetchHttpError { status: 404 }.is_retryable());
        assert!(FetchError::FetchTransportError("reset".into()).is_retryable());
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!FetchError::FeedParseError("bad xml".into()).is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
        let exhausted = FetchError::RetriesExhausted {
            attempts: 3,
            last: Box::new(FetchError::FetchTimeout),
        };
        assert!(!exhausted.is_retryable());
        assert!(exhausted.to_string().contains("3 attempts"));
    }
}
