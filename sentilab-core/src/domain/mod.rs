//! Domain types for SentiLab

pub mod article;
pub mod label;
pub mod record;

pub use article::{Article, ArticleId, ScoredArticle};
pub use label::SentimentLabel;
pub use record::{DayFragment, DayRecord};

/// Symbol type alias
pub type Symbol = String;
