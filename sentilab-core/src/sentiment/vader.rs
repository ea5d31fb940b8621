//! VADER compound score, used as a diagnostic second opinion.

use vader_sentiment::SentimentIntensityAnalyzer;

use super::SentimentScorer;

pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn name(&self) -> &str {
        "vader"
    }

    fn score_text(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }
        let scores = self.analyzer.polarity_scores(text);
        scores.get("compound").copied().unwrap_or(0.0).clamp(-1.0, 1.0)
    }
}
