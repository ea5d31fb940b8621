//! Daily percentage returns and the wide date × ticker table.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::provider::PriceSeries;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReturnPoint {
    pub date: NaiveDate,
    /// Decimal return, `close_t / close_{t-1} - 1`.
    pub value: f64,
}

/// Close-to-close returns. The first close has no predecessor and yields nothing.
pub fn daily_returns(series: &PriceSeries) -> Vec<ReturnPoint> {
    series
        .closes
        .windows(2)
        .map(|w| ReturnPoint {
            date: w[1].date,
            value: w[1].close / w[0].close - 1.0,
        })
        .collect()
}

/// Returns keyed by date, one column per ticker in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReturnsTable {
    tickers: Vec<String>,
    rows: BTreeMap<NaiveDate, Vec<Option<f64>>>,
}

impl ReturnsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ticker column. Series with fewer than two closes are skipped; returns
    /// whether the column was added.
    pub fn add_series(&mut self, series: &PriceSeries) -> bool {
        if series.closes.len() < 2 {
            tracing::warn!(symbol = %series.symbol, closes = series.closes.len(), "not enough closes for returns");
            return false;
        }

        let col = self.tickers.len();
        self.tickers.push(series.symbol.clone());
        for row in self.rows.values_mut() {
            row.push(None);
        }
        for point in daily_returns(series) {
            let width = self.tickers.len();
            let row = self.rows.entry(point.date).or_insert_with(|| vec![None; width]);
            row[col] = Some(point.value);
        }
        true
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn rows(&self) -> impl Iterator<Item = (&NaiveDate, &[Option<f64>])> {
        self.rows.iter().map(|(d, r)| (d, r.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::provider::ClosePoint;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn series(symbol: &str, closes: &[(u32, f64)]) -> PriceSeries {
        PriceSeries {
            symbol: symbol.into(),
            closes: closes
                .iter()
                .map(|&(day, close)| ClosePoint { date: d(day), close })
                .collect(),
        }
    }

    #[test]
    fn returns_are_pct_change() {
        let r = daily_returns(&series("A", &[(2, 100.0), (3, 110.0), (4, 99.0)]));
        assert_eq!(r.len(), 2);
        assert_eq!(r[0].date, d(3));
        assert!((r[0].value - 0.10).abs() < 1e-12);
        assert!((r[1].value + 0.10).abs() < 1e-12);
    }

    #[test]
    fn single_close_has_no_returns() {
        assert!(daily_returns(&series("A", &[(2, 100.0)])).is_empty());
    }

    #[test]
    fn table_aligns_columns_by_date() {
        let mut table = ReturnsTable::new();
        assert!(table.add_series(&series("A", &[(2, 100.0), (3, 101.0), (4, 102.0)])));
        assert!(table.add_series(&series("B", &[(3, 50.0), (4, 55.0), (5, 44.0)])));
        assert!(!table.add_series(&series("C", &[(3, 1.0)])));

        assert_eq!(table.tickers(), ["A", "B"]);
        let rows: Vec<_> = table.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(*rows[0].0, d(3));
        assert!(rows[0].1[0].is_some());
        assert!(rows[0].1[1].is_none());
        assert!(rows[1].1.iter().all(Option::is_some));
        assert_eq!(*rows[2].0, d(5));
        assert!(rows[2].1[0].is_none());
        assert!((rows[2].1[1].unwrap() + 0.2).abs() < 1e-12);
    }
}
