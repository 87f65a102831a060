//! In-memory port implementations for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::future::{ready, Future};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use skutrack_core::{Classify, Identifier, MetricRecord, SalesMode, Verdict};
use thiserror::Error;

use crate::ports::{MetricSource, RowSink, SinkConnector, WriteOutcome};
use crate::row::OutputRow;

#[derive(Debug, Error)]
pub(crate) enum FakeError {
    #[error("transient failure")]
    Transient,
    #[error("permanent failure")]
    Permanent,
    #[error("write outcome unknown")]
    Unconfirmed,
}

impl Classify for FakeError {
    fn verdict(&self) -> Verdict {
        match self {
            FakeError::Transient => Verdict::Retry,
            FakeError::Permanent | FakeError::Unconfirmed => Verdict::Fatal,
        }
    }
}

impl WriteOutcome for FakeError {
    fn may_have_written(&self) -> bool {
        matches!(self, FakeError::Unconfirmed)
    }
}

pub(crate) fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
}

pub(crate) fn record(date: NaiveDate, price: i64, sales: i64) -> MetricRecord {
    MetricRecord {
        date,
        price: Some(Decimal::from(price)),
        final_price: None,
        sales,
    }
}

pub(crate) fn row(id: &str, sales: i64) -> OutputRow {
    OutputRow {
        date: date(2),
        identifier: Identifier::parse(id).unwrap(),
        price: None,
        final_price: None,
        sales,
    }
}

#[derive(Default)]
pub(crate) struct FakeSink {
    pub identifiers: Vec<String>,
    pub existing: HashMap<NaiveDate, HashSet<String>>,
    pub fail_read: bool,
    /// Transient append failures to return before succeeding.
    pub append_failures: AtomicUsize,
    pub append_always_fails: bool,
    /// Every append fails with an unknown outcome.
    pub append_unconfirmed: bool,
    pub appends: Mutex<Vec<Vec<OutputRow>>>,
    pub append_attempts: AtomicUsize,
}

impl FakeSink {
    pub fn with_identifiers(ids: &[&str]) -> Self {
        Self {
            identifiers: ids.iter().map(|s| (*s).to_owned()).collect(),
            ..Self::default()
        }
    }

    pub fn appended(&self) -> Vec<Vec<OutputRow>> {
        self.appends.lock().unwrap().clone()
    }

    pub fn appended_rows(&self) -> Vec<OutputRow> {
        self.appended().into_iter().flatten().collect()
    }
}

impl RowSink for Arc<FakeSink> {
    type Error = FakeError;

    fn read_identifiers(&self) -> impl Future<Output = Result<Vec<String>, FakeError>> + Send {
        ready(if self.fail_read {
            Err(FakeError::Permanent)
        } else {
            Ok(self.identifiers.clone())
        })
    }

    fn existing_keys(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<HashSet<String>, FakeError>> + Send {
        ready(Ok(self.existing.get(&date).cloned().unwrap_or_default()))
    }

    fn append_rows(
        &self,
        rows: &[OutputRow],
    ) -> impl Future<Output = Result<usize, FakeError>> + Send {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        if self.append_unconfirmed {
            return ready(Err(FakeError::Unconfirmed));
        }
        if self.append_always_fails {
            return ready(Err(FakeError::Transient));
        }
        let remaining = self.append_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.append_failures.store(remaining - 1, Ordering::SeqCst);
            return ready(Err(FakeError::Transient));
        }
        self.appends.lock().unwrap().push(rows.to_vec());
        ready(Ok(rows.len()))
    }
}

pub(crate) struct FakeConnector {
    pub sink: Arc<FakeSink>,
    pub fail: AtomicBool,
    pub connects: AtomicUsize,
}

impl FakeConnector {
    pub fn new(sink: FakeSink) -> Self {
        Self {
            sink: Arc::new(sink),
            fail: AtomicBool::new(false),
            connects: AtomicUsize::new(0),
        }
    }
}

impl SinkConnector for FakeConnector {
    type Sink = Arc<FakeSink>;
    type Error = FakeError;

    fn connect(&self) -> impl Future<Output = Result<Arc<FakeSink>, FakeError>> + Send {
        self.connects.fetch_add(1, Ordering::SeqCst);
        ready(if self.fail.load(Ordering::SeqCst) {
            Err(FakeError::Permanent)
        } else {
            Ok(Arc::clone(&self.sink))
        })
    }
}

/// Metric source answering from a fixed table. Identifiers not in the
/// table are absent; identifiers in `failing` return an error.
#[derive(Default)]
pub(crate) struct FakeSource {
    pub records: HashMap<String, MetricRecord>,
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<(String, NaiveDate, SalesMode)>>,
}

impl FakeSource {
    pub fn with(mut self, id: &str, record: MetricRecord) -> Self {
        self.records.insert(id.to_owned(), record);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_owned());
        self
    }

    pub fn called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _, _)| id.clone())
            .collect()
    }
}

impl MetricSource for FakeSource {
    type Error = FakeError;

    fn fetch(
        &self,
        identifier: &Identifier,
        date: NaiveDate,
        mode: SalesMode,
    ) -> impl Future<Output = Result<Option<MetricRecord>, FakeError>> + Send {
        let id = identifier.to_string();
        self.calls.lock().unwrap().push((id.clone(), date, mode));
        ready(if self.failing.contains(&id) {
            Err(FakeError::Permanent)
        } else {
            Ok(self.records.get(&id).cloned())
        })
    }
}

pub(crate) fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
