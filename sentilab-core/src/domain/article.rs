use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SentimentLabel;

/// Deduplication key of an article: `(url, title)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArticleId {
    pub url: String,
    pub title: String,
}

/// A single feed entry.
///
/// Identity is `(url, title)`; `summary` and `published` never take part in
/// equality of the dedup key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
}

impl Article {
    pub fn new(url: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            summary: summary.into(),
            published: None,
        }
    }

    pub fn id(&self) -> ArticleId {
        ArticleId {
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }

    /// Text handed to the scorer: title and summary joined by a space.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }
}

/// An article together with its canonical polarity and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub article: Article,
    pub polarity: f64,
    pub label: SentimentLabel,
}
