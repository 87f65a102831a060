//! Seams between the collection pipeline and its remote collaborators.
//!
//! The orchestrator is generic over these traits so runs can be driven
//! against in-memory fakes in tests and the HTTP clients in production.

use std::collections::HashSet;
use std::future::Future;

use chrono::NaiveDate;
use skutrack_core::{Classify, Identifier, MetricRecord, SalesMode};

use crate::row::OutputRow;

/// Source of per-day metrics for one identifier.
pub trait MetricSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Looks up metrics for `identifier` on `date`. `Ok(None)` means the
    /// source has no data for that day.
    ///
    /// Retries are the implementation's concern; an `Err` here is final for
    /// this identifier in this run.
    fn fetch(
        &self,
        identifier: &Identifier,
        date: NaiveDate,
        mode: SalesMode,
    ) -> impl Future<Output = Result<Option<MetricRecord>, Self::Error>> + Send;
}

/// How a failed bulk write left the sink.
pub trait WriteOutcome {
    /// `true` when the sink may have stored the rows despite the error, so
    /// they must be neither retried nor reported as missing.
    fn may_have_written(&self) -> bool;
}

/// An open handle on the spreadsheet that holds identifiers and results.
pub trait RowSink: Send + Sync {
    type Error: Classify + WriteOutcome + std::error::Error + Send + Sync + 'static;

    /// Raw identifier cells, header row already removed.
    fn read_identifiers(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send;

    /// Identifiers that already have a row for `date`.
    fn existing_keys(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send;

    /// Appends all `rows` in a single bulk call and returns how many landed.
    ///
    /// The call is not idempotent. Errors whose verdict allows a retry must
    /// guarantee nothing was stored.
    fn append_rows(
        &self,
        rows: &[OutputRow],
    ) -> impl Future<Output = Result<usize, Self::Error>> + Send;
}

/// Opens a fresh [`RowSink`] at the start of every run.
pub trait SinkConnector: Send + Sync {
    type Sink: RowSink;
    type Error: std::error::Error + Send + Sync + 'static;

    fn connect(&self) -> impl Future<Output = Result<Self::Sink, Self::Error>> + Send;
}
