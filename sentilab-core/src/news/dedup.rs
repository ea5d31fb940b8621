//! Stable first-occurrence deduplication on `(url, title)`.

use std::collections::HashSet;

use crate::domain::{Article, ArticleId};

pub fn dedup(articles: impl IntoIterator<Item = Article>) -> Vec<Article> {
    let mut seen: HashSet<ArticleId> = HashSet::new();
    articles
        .into_iter()
        .filter(|a| seen.insert(a.id()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_occurrence() {
        let articles = vec![
            Article::new("u1", "A", "first"),
            Article::new("u2", "B", ""),
            Article::new("u1", "A", "second copy"),
            Article::new("u1", "C", ""),
        ];
        let out = dedup(articles);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].summary, "first");
        assert_eq!(out[1].title, "B");
        assert_eq!(out[2].title, "C");
    }

    #[test]
    fn same_title_different_url_is_distinct() {
        let out = dedup(vec![Article::new("u1", "A", ""), Article::new("u2", "A", "")]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn empty_input() {
        assert!(dedup(Vec::new()).is_empty());
    }
}
