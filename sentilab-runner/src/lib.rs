//! SentiLab Runner: run orchestration on top of `sentilab-core`.
//!
//! This crate provides:
//! - TOML run configuration with validation and a blake3 fingerprint
//! - The date-range driver (sequential or on a private rayon pool)
//! - Progress telemetry through an injected trait
//! - CSV export of day records and return tables, plus a JSON run manifest
//! - The multi-ticker returns batch

pub mod config;
pub mod driver;
pub mod export;
pub mod returns;

pub use config::{default_instruments, ConfigError, RetrySettings, RunConfig, MAX_RETRY_DELAY_SECS};
pub use driver::{
    DateRangeDriver, DriverError, RunProgress, RunReport, TracingProgress, UnitFailure, UnitFailurePolicy,
};
pub use export::{
    load_manifest, manifest_path_for, save_manifest, save_returns_csv, save_sentiment_csv, ExportError,
    RunManifest, SCHEMA_VERSION,
};
pub use returns::{collect_returns, default_return_tickers, ReturnsSummary};
