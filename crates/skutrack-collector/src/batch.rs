//! Bounded row buffer flushed to the sink in bulk.

use skutrack_core::{Identifier, RetryPolicy, Sleeper};

use crate::error::CollectError;
use crate::ports::{RowSink, WriteOutcome};
use crate::row::OutputRow;

/// Accumulates rows and writes them with one bulk append per full batch.
///
/// A flush that still fails after the retry policy is exhausted drops its
/// rows from the buffer and records their identifiers as lost, so the fetch
/// loop can carry on with an empty batch. A failure the sink reports as
/// possibly applied is never retried; its identifiers are recorded as
/// unconfirmed instead.
pub struct BatchWriter<'a, K, S> {
    sink: &'a K,
    sleeper: &'a S,
    retry: RetryPolicy,
    capacity: usize,
    buffer: Vec<OutputRow>,
    rows_written: usize,
    lost: Vec<Identifier>,
    unconfirmed: Vec<Identifier>,
}

impl<'a, K: RowSink, S: Sleeper> BatchWriter<'a, K, S> {
    /// `capacity` below one is treated as one.
    pub fn new(sink: &'a K, sleeper: &'a S, capacity: usize, retry: RetryPolicy) -> Self {
        let capacity = capacity.max(1);
        Self {
            sink,
            sleeper,
            retry,
            capacity,
            buffer: Vec::with_capacity(capacity),
            rows_written: 0,
            lost: Vec::new(),
            unconfirmed: Vec::new(),
        }
    }

    pub fn append(&mut self, row: OutputRow) {
        self.buffer.push(row);
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Identifiers whose rows were dropped after a failed flush.
    #[must_use]
    pub fn lost(&self) -> &[Identifier] {
        &self.lost
    }

    /// Identifiers whose rows may or may not have reached the sink.
    #[must_use]
    pub fn unconfirmed(&self) -> &[Identifier] {
        &self.unconfirmed
    }

    /// Flushes when the buffer has reached capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CollectError::SinkWrite`] if the bulk append fails after all
    /// retries, or [`CollectError::SinkUnconfirmed`] if its outcome is
    /// unknown. The buffer is empty afterwards either way.
    pub async fn flush_if_full(&mut self) -> Result<(), CollectError> {
        if self.buffer.len() >= self.capacity {
            self.flush().await
        } else {
            Ok(())
        }
    }

    /// Flushes whatever is buffered. No sink call is made for an empty buffer.
    ///
    /// # Errors
    ///
    /// Same as [`Self::flush_if_full`].
    pub async fn flush_remaining(&mut self) -> Result<(), CollectError> {
        self.flush().await
    }

    async fn flush(&mut self) -> Result<(), CollectError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let rows = std::mem::take(&mut self.buffer);
        let sink = self.sink;
        let result = self
            .retry
            .run(self.sleeper, "sheet append", || sink.append_rows(&rows))
            .await;

        match result {
            Ok(written) => {
                self.rows_written += written;
                tracing::info!(
                    rows = written,
                    total_written = self.rows_written,
                    "batch written to sheet"
                );
                Ok(())
            }
            Err(e) if e.may_have_written() => {
                let identifiers = joined(&rows);
                tracing::error!(
                    rows = rows.len(),
                    identifiers = %identifiers,
                    error = %e,
                    "batch write unconfirmed, rows may be in the sheet"
                );
                let count = rows.len();
                self.unconfirmed
                    .extend(rows.into_iter().map(|r| r.identifier));
                Err(CollectError::SinkUnconfirmed {
                    rows: count,
                    source: Box::new(e),
                })
            }
            Err(e) => {
                let identifiers = joined(&rows);
                tracing::error!(
                    rows = rows.len(),
                    identifiers = %identifiers,
                    error = %e,
                    "batch write failed, rows lost"
                );
                let count = rows.len();
                self.lost.extend(rows.into_iter().map(|r| r.identifier));
                Err(CollectError::SinkWrite {
                    rows: count,
                    source: Box::new(e),
                })
            }
        }
    }
}

fn joined(rows: &[OutputRow]) -> String {
    rows.iter()
        .map(|r| r.identifier.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod tests;
