//! Business-day calendar: Monday through Friday, no holiday exclusion.

use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Business days from `start` to `end`, both inclusive, in chronological order.
///
/// Empty when `start > end`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| is_business_day(*d))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn one_calendar_week_has_five_business_days() {
        let days = business_days(d(2024, 1, 1), d(2024, 1, 7));
        assert_eq!(days.len(), 5);
        assert_eq!(days.first(), Some(&d(2024, 1, 1)));
        assert_eq!(days.last(), Some(&d(2024, 1, 5)));
        assert!(days.iter().all(|day| is_business_day(*day)));
    }

    #[test]
    fn weekend_only_range_is_empty() {
        assert!(business_days(d(2024, 1, 6), d(2024, 1, 7)).is_empty());
    }

    #[test]
    fn reversed_range_is_empty() {
        assert!(business_days(d(2024, 1, 5), d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn holidays_are_not_excluded() {
        // 2024-12-25 is a Wednesday.
        assert_eq!(business_days(d(2024, 12, 25), d(2024, 12, 25)), vec![d(2024, 12, 25)]);
    }
}
