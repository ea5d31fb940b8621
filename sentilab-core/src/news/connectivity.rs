//! Network reachability gate consulted before every fetch attempt.
//!
//! A positive answer does not guarantee the following request succeeds.

use std::time::Duration;

pub const DEFAULT_PROBE_URL: &str = "http://www.google.com";

pub trait ConnectivityProbe: Send + Sync {
    fn is_reachable(&self) -> bool;
}

/// Probe that issues a bounded-timeout GET. Any HTTP response counts as reachable.
pub struct HttpProbe {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(super::source::USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn default_endpoint() -> Result<Self, reqwest::Error> {
        Self::new(DEFAULT_PROBE_URL, Duration::from_secs(10))
    }
}

impl ConnectivityProbe for HttpProbe {
    fn is_reachable(&self) -> bool {
        match self.client.get(&self.url).send() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "connectivity probe failed");
                false
            }
        }
    }
}

/// Probe that always reports the network as up.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysReachable;

impl ConnectivityProbe for AlwaysReachable {
    fn is_reachable(&self) -> bool {
        true
    }
}
