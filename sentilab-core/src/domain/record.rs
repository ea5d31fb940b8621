use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SentimentLabel;

/// Classifier output for one instrument-day, before instrument and date are attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFragment {
    pub average_score: f64,
    pub dominant_average_label: SentimentLabel,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub dominant_majority_label: SentimentLabel,
    pub article_count: usize,
}

impl DayFragment {
    /// Fragment for a day with no articles.
    pub fn empty() -> Self {
        Self {
            average_score: 0.0,
            dominant_average_label: SentimentLabel::Neutral,
            bullish_count: 0,
            bearish_count: 0,
            neutral_count: 0,
            dominant_majority_label: SentimentLabel::Neutral,
            article_count: 0,
        }
    }

    pub fn into_record(self, instrument: impl Into<String>, date: NaiveDate) -> DayRecord {
        DayRecord {
            instrument: instrument.into(),
            date,
            average_score: self.average_score,
            dominant_average_label: self.dominant_average_label,
            bullish_count: self.bullish_count,
            bearish_count: self.bearish_count,
            neutral_count: self.neutral_count,
            dominant_majority_label: self.dominant_majority_label,
            article_count: self.article_count,
        }
    }
}

/// One persisted row: the sentiment summary of one instrument on one business day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    pub instrument: String,
    pub date: NaiveDate,
    pub average_score: f64,
    pub dominant_average_label: SentimentLabel,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub neutral_count: usize,
    pub dominant_majority_label: SentimentLabel,
    pub article_count: usize,
}
