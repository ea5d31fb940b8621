//! SentiLab Core: news retrieval, deduplication, polarity scoring, daily classification.
//!
//! This crate contains the sentiment pipeline for one instrument-day:
//! - Domain types (articles, labels, day records)
//! - Query expansion and stable `(url, title)` dedup
//! - Feed sources and a retrying, cancellable fetcher gated by a connectivity probe
//! - Lexicon polarity scorer, with VADER as an optional diagnostic
//! - Threshold classification with a fixed majority tie-break
//! - Business-day calendar
//! - Closing prices and daily returns for the correlation table

pub mod calendar;
pub mod classify;
pub mod domain;
pub mod news;
pub mod pipeline;
pub mod prices;
pub mod retry;
pub mod sentiment;

pub use classify::{classify, ClassificationConfig, LabelCounts, ThresholdError};
pub use domain::{Article, ArticleId, DayFragment, DayRecord, ScoredArticle, SentimentLabel};
pub use pipeline::{DayPipeline, UnitOutput};
pub use retry::{CancelToken, RetryPolicy};
