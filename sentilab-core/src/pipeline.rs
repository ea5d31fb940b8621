//! One instrument-day through the whole chain:
//! expand → fetch ×6 → dedup → score → classify.

use chrono::NaiveDate;

use crate::classify::{classify, ClassificationConfig};
use crate::domain::{Article, DayRecord, ScoredArticle};
use crate::news::{dedup, expand, FetchError, NewsFetcher};
use crate::sentiment::ScoringPipeline;

/// Everything produced for one (instrument, day) unit.
#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub record: DayRecord,
    pub articles: Vec<ScoredArticle>,
    /// Raw entries across all query variants, before dedup.
    pub fetched: usize,
}

pub struct DayPipeline<'a> {
    fetcher: &'a dyn NewsFetcher,
    scorer: &'a ScoringPipeline,
    config: ClassificationConfig,
}

impl<'a> DayPipeline<'a> {
    pub fn new(fetcher: &'a dyn NewsFetcher, scorer: &'a ScoringPipeline, config: ClassificationConfig) -> Self {
        Self {
            fetcher,
            scorer,
            config,
        }
    }

    /// Fetch all six query variants for one unit and merge them.
    ///
    /// The first failing query aborts the unit; partial results are discarded so
    /// the dedup step always sees the full set.
    pub fn gather(&self, instrument: &str, date: NaiveDate) -> Result<(Vec<Article>, usize), FetchError> {
        let mut all = Vec::new();
        for query in expand(instrument) {
            let batch = self.fetcher.fetch(&query, date, self.config.lookback_days())?;
            all.extend(batch);
        }
        let fetched = all.len();
        Ok((dedup(all), fetched))
    }

    pub fn run(&self, instrument: &str, date: NaiveDate) -> Result<UnitOutput, FetchError> {
        let (unique, fetched) = self.gather(instrument, date)?;

        let articles: Vec<ScoredArticle> = unique
            .into_iter()
            .map(|article| {
                let polarity = self.scorer.score(&article);
                ScoredArticle {
                    label: self.config.label(polarity),
                    polarity,
                    article,
                }
            })
            .collect();

        let scores: Vec<f64> = articles.iter().map(|a| a.polarity).collect();
        let fragment = classify(&scores, &self.config);

        if fragment.article_count == 0 {
            tracing::warn!(instrument, %date, "no articles found");
        } else {
            tracing::info!(
                instrument,
                %date,
                avg = fragment.average_score,
                bull = fragment.bullish_count,
                bear = fragment.bearish_count,
                neutral = fragment.neutral_count,
                "classified day"
            );
        }

        Ok(UnitOutput {
            record: fragment.into_record(instrument, date),
            articles,
            fetched,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SentimentLabel;
    use crate::sentiment::SentimentScorer;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns canned articles keyed by query text; unknown queries are empty.
    #[derive(Default)]
    struct Canned {
        by_query: HashMap<String, Vec<Article>>,
        seen: Mutex<Vec<(String, NaiveDate, u32)>>,
    }

    impl NewsFetcher for Canned {
        fn fetch(&self, query: &str, window_end: NaiveDate, lookback_days: u32) -> Result<Vec<Article>, FetchError> {
            self.seen.lock().unwrap().push((query.to_string(), window_end, lookback_days));
            Ok(self.by_query.get(query).cloned().unwrap_or_default())
        }
    }

    /// Scorer that reads the polarity straight out of the summary text.
    struct SummaryIsScore;

    impl SentimentScorer for SummaryIsScore {
        fn name(&self) -> &str {
            "summary"
        }

        fn score_text(&self, text: &str) -> f64 {
            text.split_whitespace().last().and_then(|s| s.parse().ok()).unwrap_or(0.0)
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()
    }

    #[test]
    fn acme_single_variant_scenario() {
        let mut canned = Canned::default();
        canned.by_query.insert(
            "ACME News".into(),
            vec![
                Article::new("u1", "a", "0.2"),
                Article::new("u2", "b", "-0.1"),
                Article::new("u3", "c", "0.06"),
            ],
        );
        let scorer = ScoringPipeline::new(Box::new(SummaryIsScore));
        let config = ClassificationConfig::new(0.05, -0.025, 1).unwrap();

        let out = DayPipeline::new(&canned, &scorer, config).run("ACME", day()).unwrap();

        let labels: Vec<_> = out.articles.iter().map(|a| a.label).collect();
        assert_eq!(
            labels,
            vec![SentimentLabel::Bullish, SentimentLabel::Bearish, SentimentLabel::Bullish]
        );
        assert!((out.record.average_score - 0.16 / 3.0).abs() < 1e-12);
        assert_eq!(out.record.dominant_average_label, SentimentLabel::Bullish);
        assert_eq!(out.record.dominant_majority_label, SentimentLabel::Bullish);
        assert_eq!(out.record.article_count, 3);
        assert_eq!(out.record.instrument, "ACME");

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 6);
        assert!(seen.iter().all(|(_, d, lb)| *d == day() && *lb == 1));
    }

    #[test]
    fn overlap_across_variants_is_collapsed() {
        let mut canned = Canned::default();
        let shared = Article::new("u1", "ACME soars", "0.5");
        canned.by_query.insert("ACME Outlook".into(), vec![shared.clone()]);
        canned.by_query.insert("ACME News".into(), vec![shared.clone(), Article::new("u2", "x", "0.0")]);
        canned.by_query.insert("ACME Report".into(), vec![shared]);

        let scorer = ScoringPipeline::new(Box::new(SummaryIsScore));
        let out = DayPipeline::new(&canned, &scorer, ClassificationConfig::default())
            .run("ACME", day())
            .unwrap();
        assert_eq!(out.fetched, 4);
        assert_eq!(out.record.article_count, 2);
    }

    #[test]
    fn no_articles_is_not_an_error() {
        let canned = Canned::default();
        let scorer = ScoringPipeline::default();
        let out = DayPipeline::new(&canned, &scorer, ClassificationConfig::default())
            .run("ACME", day())
            .unwrap();
        assert_eq!(out.record.article_count, 0);
        assert_eq!(out.record.dominant_average_label, SentimentLabel::Neutral);
        assert_eq!(out.record.dominant_majority_label, SentimentLabel::Neutral);
    }

    struct Broken;

    impl NewsFetcher for Broken {
        fn fetch(&self, _q: &str, _d: NaiveDate, _l: u32) -> Result<Vec<Article>, FetchError> {
            Err(FetchError::FeedParseError("not xml".into()))
        }
    }

    #[test]
    fn parse_failure_fails_the_unit() {
        let scorer = ScoringPipeline::default();
        let err = DayPipeline::new(&Broken, &scorer, ClassificationConfig::default())
            .run("ACME", day())
            .unwrap_err();
        assert!(matches!(err, FetchError::FeedParseError(_)));
    }
}
