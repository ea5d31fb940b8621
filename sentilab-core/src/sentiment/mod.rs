//! Polarity scoring.
//!
//! Only one scorer is canonical per run; its output is what gets classified
//! and persisted. A second scorer may run alongside for logging only.

pub mod lexicon;
pub mod vader;

pub use lexicon::LexiconScorer;
pub use vader::VaderScorer;

use crate::domain::Article;

/// Pure text → polarity mapping in `[-1, 1]`.
pub trait SentimentScorer: Send + Sync {
    fn name(&self) -> &str;

    fn score_text(&self, text: &str) -> f64;

    /// Score an article's title and summary.
    fn score(&self, article: &Article) -> f64 {
        self.score_text(&article.text())
    }
}

/// Canonical scorer plus an optional diagnostic scorer whose output is only logged.
pub struct ScoringPipeline {
    canonical: Box<dyn SentimentScorer>,
    diagnostic: Option<Box<dyn SentimentScorer>>,
}

impl ScoringPipeline {
    pub fn new(canonical: Box<dyn SentimentScorer>) -> Self {
        Self {
            canonical,
            diagnostic: None,
        }
    }

    pub fn with_diagnostic(mut self, diagnostic: Box<dyn SentimentScorer>) -> Self {
        self.diagnostic = Some(diagnostic);
        self
    }

    pub fn canonical_name(&self) -> &str {
        self.canonical.name()
    }

    pub fn score(&self, article: &Article) -> f64 {
        let text = article.text();
        let polarity = self.canonical.score_text(&text);
        if let Some(diag) = &self.diagnostic {
            let other = diag.score_text(&text);
            let preview: String = text.chars().take(50).collect();
            tracing::debug!(
                text = %preview,
                canonical = polarity,
                scorer = diag.name(),
                diagnostic = other,
                "scored article"
            );
        }
        polarity
    }
}

impl Default for ScoringPipeline {
    fn default() -> Self {
        Self::new(Box::new(LexiconScorer::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Constant(f64);

    impl SentimentScorer for Constant {
        fn name(&self) -> &str {
            "constant"
        }

        fn score_text(&self, _text: &str) -> f64 {
            self.0
        }
    }

    #[test]
    fn diagnostic_never_changes_canonical_score() {
        let article = Article::new("u", "Shares jump", "");
        let plain = ScoringPipeline::new(Box::new(Constant(0.25)));
        let with_diag =
            ScoringPipeline::new(Box::new(Constant(0.25))).with_diagnostic(Box::new(Constant(-0.9)));
        assert_eq!(plain.score(&article), 0.25);
        assert_eq!(with_diag.score(&article), 0.25);
    }
}
