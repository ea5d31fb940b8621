//! Daily classification: per-article labels, mean label, and majority label.
//!
//! Thresholds are inclusive in both directions: a score equal to
//! `bull_threshold` is bullish, a score equal to `bear_threshold` is bearish.
//! `ClassificationConfig` cannot be built with `bear_threshold >= bull_threshold`,
//! so the two rules never overlap.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DayFragment, SentimentLabel};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ThresholdError {
    #[error("bear threshold {bear} must be strictly below bull threshold {bull}")]
    Contradictory { bull: f64, bear: f64 },

    #[error("thresholds must be finite (bull={bull}, bear={bear})")]
    NotFinite { bull: f64, bear: f64 },

    #[error("lookback_days must be at least 1, got {0}")]
    InvalidLookback(u32),
}

/// Thresholds and news window for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawClassificationConfig")]
pub struct ClassificationConfig {
    bull_threshold: f64,
    bear_threshold: f64,
    lookback_days: u32,
}

#[derive(Deserialize)]
struct RawClassificationConfig {
    #[serde(default = "default_bull")]
    bull_threshold: f64,
    #[serde(default = "default_bear")]
    bear_threshold: f64,
    #[serde(default = "default_lookback")]
    lookback_days: u32,
}

fn default_bull() -> f64 {
    0.05
}

fn default_bear() -> f64 {
    -0.025
}

fn default_lookback() -> u32 {
    1
}

impl TryFrom<RawClassificationConfig> for ClassificationConfig {
    type Error = ThresholdError;

    fn try_from(raw: RawClassificationConfig) -> Result<Self, Self::Error> {
        Self::new(raw.bull_threshold, raw.bear_threshold, raw.lookback_days)
    }
}

impl ClassificationConfig {
    pub fn new(bull_threshold: f64, bear_threshold: f64, lookback_days: u32) -> Result<Self, ThresholdError> {
        if !bull_threshold.is_finite() || !bear_threshold.is_finite() {
            return Err(ThresholdError::NotFinite {
                bull: bull_threshold,
                bear: bear_threshold,
            });
        }
        if bear_threshold >= bull_threshold {
            return Err(ThresholdError::Contradictory {
                bull: bull_threshold,
                bear: bear_threshold,
            });
        }
        if lookback_days == 0 {
            return Err(ThresholdError::InvalidLookback(lookback_days));
        }
        Ok(Self {
            bull_threshold,
            bear_threshold,
            lookback_days,
        })
    }

    pub fn bull_threshold(&self) -> f64 {
        self.bull_threshold
    }

    pub fn bear_threshold(&self) -> f64 {
        self.bear_threshold
    }

    pub fn lookback_days(&self) -> u32 {
        self.lookback_days
    }

    /// Label a single score (or a mean of scores).
    pub fn label(&self, score: f64) -> SentimentLabel {
        if score >= self.bull_threshold {
            SentimentLabel::Bullish
        } else if score <= self.bear_threshold {
            SentimentLabel::Bearish
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            bull_threshold: default_bull(),
            bear_threshold: default_bear(),
            lookback_days: default_lookback(),
        }
    }
}

/// Per-label article counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelCounts {
    pub bullish: usize,
    pub bearish: usize,
    pub neutral: usize,
}

impl LabelCounts {
    pub fn tally(labels: impl IntoIterator<Item = SentimentLabel>) -> Self {
        let mut counts = Self::default();
        for label in labels {
            match label {
                SentimentLabel::Bullish => counts.bullish += 1,
                SentimentLabel::Bearish => counts.bearish += 1,
                SentimentLabel::Neutral => counts.neutral += 1,
            }
        }
        counts
    }

    pub fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Bullish => self.bullish,
            SentimentLabel::Bearish => self.bearish,
            SentimentLabel::Neutral => self.neutral,
        }
    }

    pub fn total(&self) -> usize {
        self.bullish + self.bearish + self.neutral
    }

    /// Plurality label; exact ties go to the earlier entry of
    /// [`SentimentLabel::PRIORITY`]. Neutral when nothing was counted.
    pub fn majority(&self) -> SentimentLabel {
        if self.total() == 0 {
            return SentimentLabel::Neutral;
        }
        let mut best = SentimentLabel::PRIORITY[0];
        for label in SentimentLabel::PRIORITY.into_iter().skip(1) {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }
}

/// Per-article labels for a slice of scores.
pub fn label_scores(scores: &[f64], config: &ClassificationConfig) -> Vec<SentimentLabel> {
    scores.iter().map(|&s| config.label(s)).collect()
}

/// Fold one instrument-day's scores into a [`DayFragment`].
pub fn classify(scores: &[f64], config: &ClassificationConfig) -> DayFragment {
    if scores.is_empty() {
        return DayFragment::empty();
    }

    let average_score = scores.iter().sum::<f64>() / scores.len() as f64;
    let counts = LabelCounts::tally(scores.iter().map(|&s| config.label(s)));

    DayFragment {
        average_score,
        dominant_average_label: config.label(average_score),
        bullish_count: counts.bullish,
        bearish_count: counts.bearish,
        neutral_count: counts.neutral,
        dominant_majority_label: counts.majority(),
        article_count: scores.len(),
    }
}
