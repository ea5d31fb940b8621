//! Property tests for driver output order.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use proptest::prelude::*;

use sentilab_core::news::{FetchError, NewsFetcher};
use sentilab_core::sentiment::ScoringPipeline;
use sentilab_core::{Article, ClassificationConfig};
use sentilab_runner::{DateRangeDriver, UnitFailurePolicy};

/// Same article for every query of a unit, so dedup leaves one.
/// Fails units whose day of month is a multiple of `fail_every`.
struct Fixed {
    fail_every: u32,
}

impl NewsFetcher for Fixed {
    fn fetch(&self, _query: &str, window_end: NaiveDate, _lookback: u32) -> Result<Vec<Article>, FetchError> {
        if self.fail_every > 0 && window_end.day() % self.fail_every == 0 {
            return Err(FetchError::FeedParseError("junk".into()));
        }
        Ok(vec![Article::new(
            format!("https://news.example.com/{window_end}"),
            "Quarterly update".to_string(),
            "steady results".to_string(),
        )])
    }
}

fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut day = start;
    while day <= end {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            out.push(day);
        }
        day += Duration::days(1);
    }
    out
}

fn instrument_list() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Z]{2,5}", 1..5)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Records come out day-major with instruments in input order, whatever the pool size.
    #[test]
    fn records_are_day_major_for_any_pool(
        names in instrument_list(),
        offset in 0i64..60,
        span in 0i64..14,
        workers in 1usize..5,
        fail_every in 0u32..6,
    ) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + Duration::days(offset);
        let end = start + Duration::days(span);
        let fetcher = Fixed { fail_every };
        let scorer = ScoringPipeline::default();

        let report = DateRangeDriver::new(&fetcher, &scorer, ClassificationConfig::default())
            .with_workers(workers)
            .with_failure_policy(UnitFailurePolicy::Skip)
            .run(&names, start, end)
            .unwrap();

        let expected: Vec<(String, NaiveDate)> = business_days(start, end)
            .into_iter()
            .filter(|day| fail_every == 0 || day.day() % fail_every != 0)
            .flat_map(|day| names.iter().map(move |n| (n.clone(), day)))
            .collect();
        let actual: Vec<(String, NaiveDate)> =
            report.records.iter().map(|r| (r.instrument.clone(), r.date)).collect();

        prop_assert_eq!(actual, expected);
        prop_assert_eq!(report.units_planned, business_days(start, end).len() * names.len());
        prop_assert_eq!(report.records.len() + report.failures.len(), report.units_planned);
        prop_assert!(report.records.iter().all(|r| r.article_count == 1));
    }
}
