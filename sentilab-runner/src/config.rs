//! Run configuration, loaded from TOML.
//!
//! Only `instruments`, `start_date` and `end_date` are required; every other
//! field falls back to the defaults below. A loaded config is validated before
//! it is handed to the driver, and its blake3 fingerprint ends up in the run
//! manifest so two outputs can be traced back to identical settings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use sentilab_core::{ClassificationConfig, RetryPolicy, ThresholdError};

use crate::driver::UnitFailurePolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("invalid classification settings: {0}")]
    Classification(#[from] ThresholdError),

    #[error("instrument list is empty")]
    NoInstruments,

    #[error("instrument at position {0} is blank")]
    BlankInstrument(usize),

    #[error("start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("workers must be at least 1")]
    NoWorkers,

    #[error("invalid retry settings: {0}")]
    InvalidRetry(String),
}

/// The default universe: the seven mega-cap tech names plus bitcoin.
pub fn default_instruments() -> Vec<String> {
    ["AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "BTC"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_output() -> PathBuf {
    PathBuf::from("data/sentiment_analysis.csv")
}

fn default_workers() -> usize {
    1
}

/// Longest delay, in seconds, a config file may ask for between attempts.
pub const MAX_RETRY_DELAY_SECS: f64 = 24.0 * 60.0 * 60.0;

/// Backoff settings as they appear in the config file.
///
/// `max_attempts = 0` means retry until cancelled. Both delays are capped at
/// [`MAX_RETRY_DELAY_SECS`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub base_delay_secs: f64,
    pub multiplier: f64,
    pub max_delay_secs: f64,
    pub max_attempts: u32,
    pub jitter: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_delay_secs: 60.0,
            multiplier: 2.0,
            max_delay_secs: 900.0,
            max_attempts: 8,
            jitter: 0.0,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let in_range = |v: f64| (0.0..=MAX_RETRY_DELAY_SECS).contains(&v);
        if !in_range(self.base_delay_secs) {
            return Err(ConfigError::InvalidRetry(format!(
                "base_delay_secs must be within [0, {MAX_RETRY_DELAY_SECS}], got {}",
                self.base_delay_secs
            )));
        }
        if !in_range(self.max_delay_secs) {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_secs must be within [0, {MAX_RETRY_DELAY_SECS}], got {}",
                self.max_delay_secs
            )));
        }
        if self.max_delay_secs < self.base_delay_secs {
            return Err(ConfigError::InvalidRetry(format!(
                "max_delay_secs ({}) must be at least base_delay_secs ({})",
                self.max_delay_secs, self.base_delay_secs
            )));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::InvalidRetry(format!(
                "multiplier must be >= 1.0, got {}",
                self.multiplier
            )));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(ConfigError::InvalidRetry(format!(
                "jitter must be within [0, 1], got {}",
                self.jitter
            )));
        }
        Ok(())
    }

    /// Convert to the fetcher's policy, validating first.
    pub fn to_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.validate()?;
        Ok(RetryPolicy {
            base_delay: secs_to_duration("base_delay_secs", self.base_delay_secs)?,
            multiplier: self.multiplier,
            max_delay: secs_to_duration("max_delay_secs", self.max_delay_secs)?,
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            jitter: self.jitter,
        })
    }
}

fn secs_to_duration(field: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| ConfigError::InvalidRetry(format!("{field} = {secs} is not a valid duration: {e}")))
}

/// Everything needed to reproduce one sentiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub instruments: Vec<String>,

    /// First business day considered (inclusive).
    pub start_date: NaiveDate,

    /// Last business day considered (inclusive).
    pub end_date: NaiveDate,

    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// 1 runs units strictly in order on the calling thread.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub on_unit_error: UnitFailurePolicy,

    /// Log a VADER score next to every canonical score.
    #[serde(default)]
    pub diagnostics: bool,

    #[serde(default)]
    pub classification: ClassificationConfig,

    #[serde(default)]
    pub retry: RetrySettings,
}

impl RunConfig {
    /// Config over the default universe with every optional field defaulted.
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            instruments: default_instruments(),
            start_date,
            end_date,
            output: default_output(),
            workers: default_workers(),
            on_unit_error: UnitFailurePolicy::default(),
            diagnostics: false,
            classification: ClassificationConfig::default(),
            retry: RetrySettings::default(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse without validating; the CLI applies flag overrides before [`RunConfig::validate`].
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instruments.is_empty() {
            return Err(ConfigError::NoInstruments);
        }
        if let Some(pos) = self.instruments.iter().position(|s| s.trim().is_empty()) {
            return Err(ConfigError::BlankInstrument(pos));
        }
        if self.start_date > self.end_date {
            return Err(ConfigError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        // Re-run the constructor checks in case the struct was assembled by hand.
        ClassificationConfig::new(
            self.classification.bull_threshold(),
            self.classification.bear_threshold(),
            self.classification.lookback_days(),
        )?;
        self.retry.validate()
    }

    pub fn retry_policy(&self) -> Result<RetryPolicy, ConfigError> {
        self.retry.to_policy()
    }

    /// blake3 hex digest of the canonical JSON form of this config.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
