//! Date-range driver: business days × instruments → ordered day records.
//!
//! Every (day, instrument) pair is one unit. Units run through
//! [`DayPipeline`] either sequentially or on a private rayon pool; in both
//! modes results are collected by unit index (`day * n_instruments +
//! instrument`), so the output is day-major, instrument-minor, in the
//! caller's instrument order, whatever order the units finish in.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;

use sentilab_core::calendar::business_days;
use sentilab_core::news::{FetchError, NewsFetcher};
use sentilab_core::sentiment::ScoringPipeline;
use sentilab_core::{CancelToken, ClassificationConfig, DayPipeline, DayRecord};

/// What to do when a unit fails after its fetcher has given up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitFailurePolicy {
    /// Record the failure, emit no row for the unit, keep going.
    #[default]
    Skip,
    /// Record the failure and start no further units.
    Abort,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A unit that produced no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitFailure {
    pub instrument: String,
    pub date: NaiveDate,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Completed units, day-major then instrument order.
    pub records: Vec<DayRecord>,
    pub failures: Vec<UnitFailure>,
    pub cancelled: bool,
    /// Set when a failure stopped the run under [`UnitFailurePolicy::Abort`].
    pub aborted: bool,
    /// Units the date range called for, including ones never started.
    pub units_planned: usize,
}

impl RunReport {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && !self.aborted && self.records.len() == self.units_planned
    }

    pub fn articles(&self) -> usize {
        self.records.iter().map(|r| r.article_count).sum()
    }
}

/// Telemetry hooks for a run. All methods default to no-ops.
///
/// With more than one worker the unit callbacks arrive from pool threads in
/// completion order; `index` is the unit's position in the output.
pub trait RunProgress: Send + Sync {
    fn on_unit_start(&self, _instrument: &str, _date: NaiveDate, _index: usize, _total: usize) {}

    fn on_unit_complete(
        &self,
        _instrument: &str,
        _date: NaiveDate,
        _index: usize,
        _total: usize,
        _result: &Result<DayRecord, FetchError>,
    ) {
    }

    /// Every instrument for `date` has finished (successfully or not).
    fn on_day_complete(&self, _date: NaiveDate, _articles: usize) {}

    fn on_run_complete(&self, _report: &RunReport) {}
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl RunProgress for TracingProgress {
    fn on_unit_start(&self, instrument: &str, date: NaiveDate, index: usize, total: usize) {
        tracing::debug!(instrument, %date, "[{}/{}] starting unit", index + 1, total);
    }

    fn on_unit_complete(
        &self,
        instrument: &str,
        date: NaiveDate,
        index: usize,
        total: usize,
        result: &Result<DayRecord, FetchError>,
    ) {
        // failures are logged by the driver itself
        if let Ok(record) = result {
            tracing::debug!(
                instrument,
                %date,
                articles = record.article_count,
                "[{}/{}] unit done",
                index + 1,
                total
            );
        }
    }

    fn on_day_complete(&self, date: NaiveDate, articles: usize) {
        tracing::info!(%date, articles, "finished analysis for date");
    }

    fn on_run_complete(&self, report: &RunReport) {
        tracing::info!(
            records = report.records.len(),
            planned = report.units_planned,
            failures = report.failures.len(),
            cancelled = report.cancelled,
            aborted = report.aborted,
            "run complete"
        );
    }
}

enum UnitOutcome {
    Done(DayRecord),
    Failed(UnitFailure),
    NotRun,
}

/// Per-day bookkeeping so `on_day_complete` fires exactly once per finished day.
struct DayTally {
    remaining: AtomicUsize,
    articles: AtomicUsize,
}

pub struct DateRangeDriver<'a> {
    fetcher: &'a dyn NewsFetcher,
    scorer: &'a ScoringPipeline,
    config: ClassificationConfig,
    workers: usize,
    on_error: UnitFailurePolicy,
    cancel: CancelToken,
    progress: Option<&'a dyn RunProgress>,
}

impl<'a> DateRangeDriver<'a> {
    pub fn new(fetcher: &'a dyn NewsFetcher, scorer: &'a ScoringPipeline, config: ClassificationConfig) -> Self {
        Self {
            fetcher,
            scorer,
            config,
            workers: 1,
            on_error: UnitFailurePolicy::default(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    /// Values below 1 are treated as 1.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_failure_policy(mut self, policy: UnitFailurePolicy) -> Self {
        self.on_error = policy;
        self
    }

    /// Share the token with the fetcher so cancellation also cuts backoff sleeps short.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn RunProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Run every business day in `[start, end]` for every instrument.
    ///
    /// A reversed range yields an empty report.
    pub fn run(&self, instruments: &[String], start: NaiveDate, end: NaiveDate) -> Result<RunReport, DriverError> {
        let days = business_days(start, end);
        let units: Vec<(NaiveDate, &str)> = days
            .iter()
            .flat_map(|&day| instruments.iter().map(move |inst| (day, inst.as_str())))
            .collect();
        let total = units.len();

        tracing::info!(
            days = days.len(),
            instruments = instruments.len(),
            units = total,
            workers = self.workers,
            %start,
            %end,
            "starting sentiment run"
        );

        let tallies: Vec<DayTally> = days
            .iter()
            .map(|_| DayTally {
                remaining: AtomicUsize::new(instruments.len()),
                articles: AtomicUsize::new(0),
            })
            .collect();
        let stop = AtomicBool::new(false);

        let run_unit = |(index, &(date, instrument)): (usize, &(NaiveDate, &str))| {
            self.run_unit(instrument, date, index, total, &stop, &tallies[index / instruments.len()])
        };

        let outcomes: Vec<UnitOutcome> = if self.workers > 1 {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(self.workers).build()?;
            pool.install(|| units.par_iter().enumerate().map(run_unit).collect())
        } else {
            units.iter().enumerate().map(run_unit).collect()
        };

        let mut report = RunReport {
            units_planned: total,
            aborted: stop.load(Ordering::SeqCst),
            ..RunReport::default()
        };
        for outcome in outcomes {
            match outcome {
                UnitOutcome::Done(record) => report.records.push(record),
                UnitOutcome::Failed(failure) => report.failures.push(failure),
                UnitOutcome::NotRun => {}
            }
        }
        report.cancelled = self.cancel.is_cancelled();

        if let Some(p) = self.progress {
            p.on_run_complete(&report);
        }
        Ok(report)
    }

    fn run_unit(
        &self,
        instrument: &str,
        date: NaiveDate,
        index: usize,
        total: usize,
        stop: &AtomicBool,
        tally: &DayTally,
    ) -> UnitOutcome {
        if self.cancel.is_cancelled() || stop.load(Ordering::SeqCst) {
            return UnitOutcome::NotRun;
        }
        if let Some(p) = self.progress {
            p.on_unit_start(instrument, date, index, total);
        }

        let pipeline = DayPipeline::new(self.fetcher, self.scorer, self.config);
        let result = pipeline.run(instrument, date).map(|out| out.record);

        // A unit interrupted by cancellation is neither a record nor a failure.
        if matches!(result, Err(FetchError::Cancelled)) {
            return UnitOutcome::NotRun;
        }
        if let Some(p) = self.progress {
            p.on_unit_complete(instrument, date, index, total, &result);
        }

        let articles = result.as_ref().map_or(0, |r| r.article_count);
        tally.articles.fetch_add(articles, Ordering::SeqCst);
        if tally.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            if let Some(p) = self.progress {
                p.on_day_complete(date, tally.articles.load(Ordering::SeqCst));
            }
        }

        match result {
            Ok(record) => UnitOutcome::Done(record),
            Err(e) => {
                tracing::error!(instrument, %date, error = %e, "unit failed");
                if self.on_error == UnitFailurePolicy::Abort {
                    stop.store(true, Ordering::SeqCst);
                }
                UnitOutcome::Failed(UnitFailure {
                    instrument: instrument.to_string(),
                    date,
                    error: e.to_string(),
                })
            }
        }
    }
}
