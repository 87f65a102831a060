//! Collection run orchestration.
//!
//! One run reads the identifier list from a freshly opened sink, looks up
//! each identifier in source order, and appends the resulting rows in
//! batches. A failing identifier or a failed batch is recorded in the
//! [`RunReport`] and never aborts the run; only initialization failures end
//! it early in [`RunState::Failed`].

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use skutrack_core::{validate, AppConfig, Identifier, RetryPolicy, SalesMode, Sleeper};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::batch::BatchWriter;
use crate::error::CollectError;
use crate::pacing::{PacingSettings, RequestPacer};
use crate::ports::{MetricSource, RowSink, SinkConnector};
use crate::row::OutputRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Initializing,
    Processing,
    Draining,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Initializing => "initializing",
            RunState::Processing => "processing",
            RunState::Draining => "draining",
            RunState::Done => "done",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Narrowed settings for one collector, derived from [`AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectorSettings {
    pub batch_size: usize,
    pub sales_mode: SalesMode,
    pub skip_existing: bool,
    pub pacing: PacingSettings,
    pub sink_retry: RetryPolicy,
}

impl CollectorSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            sales_mode: config.sales_mode,
            skip_existing: config.skip_existing,
            pacing: PacingSettings {
                quota_per_window: config.quota_per_window,
                cooldown: Duration::from_secs(config.quota_cooldown_secs),
                inter_request_delay: Duration::from_millis(config.inter_request_delay_ms),
            },
            sink_retry: config.sink_retry_policy(),
        }
    }
}

/// Outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub target_date: NaiveDate,
    pub state: RunState,
    /// Valid identifiers read from the sink.
    pub identifiers: usize,
    pub rows_written: usize,
    /// The source had no data for the target date.
    pub absent: Vec<Identifier>,
    /// Already recorded for the target date (only with `skip_existing`).
    pub skipped: Vec<Identifier>,
    /// The lookup failed after retries.
    pub failed: Vec<Identifier>,
    /// Fetched, but the batch holding their rows could not be written.
    pub lost: Vec<Identifier>,
    /// Fetched, but the write of their batch has an unknown outcome; check
    /// the sheet before re-running for this date.
    pub unconfirmed: Vec<Identifier>,
    pub error: Option<String>,
}

impl RunReport {
    fn new(target_date: NaiveDate) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            target_date,
            state: RunState::Idle,
            identifiers: 0,
            rows_written: 0,
            absent: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            lost: Vec::new(),
            unconfirmed: Vec::new(),
            error: None,
        }
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(run_id = %self.run_id, from = %self.state, to = %next, "run state");
        self.state = next;
    }
}

/// Yesterday's date in UTC relative to `now`.
#[must_use]
pub fn default_target_date(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    today.pred_opt().unwrap_or(today)
}

/// Drives collection runs against a metric source and a sink.
pub struct Collector<M, C, S> {
    source: M,
    connector: C,
    sleeper: S,
    settings: CollectorSettings,
    /// Held for the duration of [`Collector::run_exclusive`].
    running: Mutex<()>,
}

impl<M, C, S> Collector<M, C, S>
where
    M: MetricSource,
    C: SinkConnector,
    S: Sleeper,
{
    pub fn new(source: M, connector: C, sleeper: S, settings: CollectorSettings) -> Self {
        Self {
            source,
            connector,
            sleeper,
            settings,
            running: Mutex::new(()),
        }
    }

    /// Runs for `target_date` unless another exclusive run is still in
    /// progress, in which case nothing happens and `None` is returned.
    pub async fn run_exclusive(&self, target_date: NaiveDate) -> Option<RunReport> {
        let Ok(_guard) = self.running.try_lock() else {
            tracing::warn!(%target_date, "previous collection run still in progress, skipping");
            return None;
        };
        Some(self.run(target_date).await)
    }

    /// Executes one full run for `target_date`.
    ///
    /// Never returns an error: the outcome, including an initialization
    /// failure, is described by the returned report.
    pub async fn run(&self, target_date: NaiveDate) -> RunReport {
        let mut report = RunReport::new(target_date);
        tracing::info!(
            run_id = %report.run_id,
            %target_date,
            mode = %self.settings.sales_mode,
            "starting collection run"
        );

        report.transition(RunState::Initializing);
        let (sink, identifiers) = match self.initialize(target_date, &mut report).await {
            Ok(ready) => ready,
            Err(e) => {
                tracing::error!(
                    run_id = %report.run_id,
                    error = %e,
                    "collection run failed to initialize"
                );
                report.error = Some(e.to_string());
                report.transition(RunState::Failed);
                return report;
            }
        };

        if identifiers.is_empty() {
            tracing::info!(run_id = %report.run_id, "no identifiers to collect");
            report.transition(RunState::Done);
            return report;
        }

        report.transition(RunState::Processing);
        let mut writer = BatchWriter::new(
            &sink,
            &self.sleeper,
            self.settings.batch_size,
            self.settings.sink_retry,
        );
        self.process(&identifiers, target_date, &mut writer, &mut report)
            .await;

        report.transition(RunState::Draining);
        if let Err(e) = writer.flush_remaining().await {
            tracing::warn!(run_id = %report.run_id, error = %e, "final batch not written");
        }
        report.rows_written = writer.rows_written();
        report.lost = writer.lost().to_vec();
        report.unconfirmed = writer.unconfirmed().to_vec();

        report.transition(RunState::Done);
        tracing::info!(
            run_id = %report.run_id,
            %target_date,
            identifiers = report.identifiers,
            rows_written = report.rows_written,
            absent = report.absent.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            lost = report.lost.len(),
            unconfirmed = report.unconfirmed.len(),
            "collection run complete"
        );
        report
    }

    /// Opens the sink and returns the identifiers a run for `target_date`
    /// would look up, without fetching anything.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::Initialize`] if the sink cannot be opened or
    /// read.
    pub async fn preview(&self, target_date: NaiveDate) -> Result<Vec<Identifier>, CollectError> {
        let mut report = RunReport::new(target_date);
        let (_, identifiers) = self.initialize(target_date, &mut report).await?;
        Ok(identifiers)
    }

    async fn initialize(
        &self,
        target_date: NaiveDate,
        report: &mut RunReport,
    ) -> Result<(C::Sink, Vec<Identifier>), CollectError> {
        let sink = self
            .connector
            .connect()
            .await
            .map_err(|e| CollectError::initialize("opening the spreadsheet", e))?;

        let raw = sink
            .read_identifiers()
            .await
            .map_err(|e| CollectError::initialize("reading identifiers", e))?;
        let mut identifiers = validate(&raw);
        report.identifiers = identifiers.len();
        tracing::info!(
            raw = raw.len(),
            valid = identifiers.len(),
            "identifier list loaded"
        );

        if self.settings.skip_existing && !identifiers.is_empty() {
            let existing = sink
                .existing_keys(target_date)
                .await
                .map_err(|e| CollectError::initialize("reading existing rows", e))?;
            let (done, todo): (Vec<_>, Vec<_>) = identifiers
                .into_iter()
                .partition(|id| existing.contains(id.as_str()));
            if !done.is_empty() {
                tracing::info!(
                    skipped = done.len(),
                    %target_date,
                    "identifiers already recorded for date"
                );
            }
            report.skipped = done;
            identifiers = todo;
        }

        Ok((sink, identifiers))
    }

    async fn process(
        &self,
        identifiers: &[Identifier],
        target_date: NaiveDate,
        writer: &mut BatchWriter<'_, C::Sink, S>,
        report: &mut RunReport,
    ) {
        let mut pacer = RequestPacer::new(self.settings.pacing);
        let last = identifiers.len().saturating_sub(1);

        for (index, identifier) in identifiers.iter().enumerate() {
            match self
                .source
                .fetch(identifier, target_date, self.settings.sales_mode)
                .await
            {
                Ok(Some(record)) => {
                    writer.append(OutputRow::build(&record, target_date, identifier));
                    if let Err(e) = writer.flush_if_full().await {
                        tracing::warn!(
                            run_id = %report.run_id,
                            error = %e,
                            "batch not written, continuing"
                        );
                    }
                }
                Ok(None) => {
                    tracing::info!(%identifier, %target_date, "no data for date");
                    report.absent.push(identifier.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        %identifier,
                        error = %e,
                        "lookup failed, skipping identifier"
                    );
                    report.failed.push(identifier.clone());
                }
            }

            if index < last {
                pacer.pause(&self.sleeper).await;
            }
        }
    }
}

#[cfg(test)]
#[path = "runner_test.rs"]
mod tests;
