//! Persisted artifacts: sentiment CSV, returns CSV, and the run manifest.
//!
//! CSV layouts are fixed; downstream notebooks join the two tables on date.
//! The manifest carries a `schema_version`, and newer versions are rejected on
//! load.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use sentilab_core::prices::ReturnsTable;
use sentilab_core::DayRecord;

use crate::config::RunConfig;
use crate::driver::{RunReport, UnitFailure};

pub const SCHEMA_VERSION: u32 = 1;

pub const SENTIMENT_HEADER: [&str; 9] = [
    "stock",
    "date",
    "average_sentiment_score",
    "dominant_sentiment_average",
    "bullish_articles",
    "bearish_articles",
    "neutral_articles",
    "dominant_sentiment_majority",
    "num_articles_fetched",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported manifest schema version {found} (max supported: {max})")]
    UnsupportedSchema { found: u32, max: u32 },
}

fn persistence(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Persistence {
        path: path.to_path_buf(),
        source,
    }
}

fn create_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir).map_err(persistence(path)),
        _ => Ok(()),
    }
}

// ─── Sentiment table ────────────────────────────────────────────────

/// Write records as CSV, header first, in the order given.
pub fn write_sentiment<W: Write>(writer: W, records: &[DayRecord]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(SENTIMENT_HEADER)?;
    for r in records {
        wtr.write_record([
            r.instrument.clone(),
            r.date.format("%Y-%m-%d").to_string(),
            r.average_score.to_string(),
            r.dominant_average_label.to_string(),
            r.bullish_count.to_string(),
            r.bearish_count.to_string(),
            r.neutral_count.to_string(),
            r.dominant_majority_label.to_string(),
            r.article_count.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn sentiment_csv(records: &[DayRecord]) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_sentiment(&mut buf, records)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the sentiment table to `path`, creating parent directories.
pub fn save_sentiment_csv(path: &Path, records: &[DayRecord]) -> Result<(), ExportError> {
    create_parent(path)?;
    let file = std::fs::File::create(path).map_err(persistence(path))?;
    write_sentiment(std::io::BufWriter::new(file), records).map_err(|e| persistence(path)(e.into()))?;
    tracing::info!(path = %path.display(), rows = records.len(), "saved sentiment table");
    Ok(())
}

// ─── Returns table ──────────────────────────────────────────────────

/// `Date` column, then one column per ticker; missing values are blank.
pub fn write_returns<W: Write>(writer: W, table: &ReturnsTable) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let mut header = vec!["Date"];
    header.extend(table.tickers().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (date, values) in table.rows() {
        let mut row = Vec::with_capacity(values.len() + 1);
        row.push(date.format("%Y-%m-%d").to_string());
        row.extend(values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn returns_csv(table: &ReturnsTable) -> csv::Result<String> {
    let mut buf = Vec::new();
    write_returns(&mut buf, table)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn save_returns_csv(path: &Path, table: &ReturnsTable) -> Result<(), ExportError> {
    create_parent(path)?;
    let file = std::fs::File::create(path).map_err(persistence(path))?;
    write_returns(std::io::BufWriter::new(file), table).map_err(|e| persistence(path)(e.into()))?;
    tracing::info!(
        path = %path.display(),
        rows = table.len(),
        tickers = table.tickers().len(),
        "saved returns table"
    );
    Ok(())
}

// ─── Run manifest ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    /// blake3 of the run config, see [`RunConfig::fingerprint`].
    pub config_fingerprint: String,
    pub instruments: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub output: PathBuf,
    pub records: usize,
    pub units_planned: usize,
    pub articles: usize,
    pub failures: Vec<UnitFailure>,
    pub cancelled: bool,
    pub aborted: bool,
    pub generated_at: DateTime<Utc>,
}

impl RunManifest {
    pub fn new(config: &RunConfig, config_fingerprint: String, report: &RunReport) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            config_fingerprint,
            instruments: config.instruments.clone(),
            start_date: config.start_date,
            end_date: config.end_date,
            output: config.output.clone(),
            records: report.records.len(),
            units_planned: report.units_planned,
            articles: report.articles(),
            failures: report.failures.clone(),
            cancelled: report.cancelled,
            aborted: report.aborted,
            generated_at: Utc::now(),
        }
    }
}

/// `data/out.csv` → `data/out.manifest.json`.
pub fn manifest_path_for(csv_path: &Path) -> PathBuf {
    let stem = csv_path.file_stem().and_then(|s| s.to_str()).unwrap_or("sentiment");
    csv_path.with_file_name(format!("{stem}.manifest.json"))
}

pub fn save_manifest(path: &Path, manifest: &RunManifest) -> Result<(), ExportError> {
    let json = serde_json::to_string_pretty(manifest)?;
    create_parent(path)?;
    std::fs::write(path, json).map_err(persistence(path))?;
    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<RunManifest, ExportError> {
    let json = std::fs::read_to_string(path).map_err(persistence(path))?;
    let manifest: RunManifest = serde_json::from_str(&json)?;
    if manifest.schema_version > SCHEMA_VERSION {
        return Err(ExportError::UnsupportedSchema {
            found: manifest.schema_version,
            max: SCHEMA_VERSION,
        });
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentilab_core::prices::{ClosePoint, PriceSeries};
    use sentilab_core::SentimentLabel;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn record(instrument: &str, day: u32, avg: f64) -> DayRecord {
        DayRecord {
            instrument: instrument.into(),
            date: d(day),
            average_score: avg,
            dominant_average_label: SentimentLabel::Bullish,
            bullish_count: 2,
            bearish_count: 1,
            neutral_count: 0,
            dominant_majority_label: SentimentLabel::Bullish,
            article_count: 3,
        }
    }

    #[test]
    fn sentiment_header_and_row() {
        let csv = sentiment_csv(&[record("ACME", 2, 0.16 / 3.0)]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "stock,date,average_sentiment_score,dominant_sentiment_average,bullish_articles,\
             bearish_articles,neutral_articles,dominant_sentiment_majority,num_articles_fetched"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("ACME,2024-01-02,0.0533"));
        assert!(row.ends_with(",bullish,2,1,0,bullish,3"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn empty_table_still_has_header() {
        let csv = sentiment_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn zero_score_renders_as_zero() {
        let mut r = record("BTC", 3, 0.0);
        r.dominant_average_label = SentimentLabel::Neutral;
        let csv = sentiment_csv(&[r]).unwrap();
        assert!(csv.lines().nth(1).unwrap().starts_with("BTC,2024-01-03,0,neutral,"));
    }

    #[test]
    fn returns_blank_cells() {
        let mut table = ReturnsTable::new();
        table.add_series(&PriceSeries {
            symbol: "A".into(),
            closes: vec![
                ClosePoint { date: d(2), close: 100.0 },
                ClosePoint { date: d(3), close: 125.0 },
                ClosePoint { date: d(4), close: 62.5 },
            ],
        });
        table.add_series(&PriceSeries {
            symbol: "B".into(),
            closes: vec![
                ClosePoint { date: d(3), close: 10.0 },
                ClosePoint { date: d(4), close: 15.0 },
            ],
        });
        let csv = returns_csv(&table).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, ["Date,A,B", "2024-01-03,0.25,", "2024-01-04,-0.5,0.5"]);
    }

    #[test]
    fn manifest_path_sits_next_to_csv() {
        assert_eq!(
            manifest_path_for(Path::new("data/sentiment_analysis.csv")),
            PathBuf::from("data/sentiment_analysis.manifest.json")
        );
    }
}
