use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use skutrack_core::RecordingSleeper;

use super::*;
use crate::testing::{row, secs, FakeSink};

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, secs(2), secs(10))
}

#[tokio::test]
async fn one_call_per_full_batch_plus_remainder() {
    let sink = Arc::new(FakeSink::default());
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 2, policy());

    for i in 0..5 {
        writer.append(row(&format!("{}", 100 + i), i));
        writer.flush_if_full().await.unwrap();
    }
    writer.flush_remaining().await.unwrap();

    let batches = sink.appended();
    let sizes: Vec<usize> = batches.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    assert_eq!(writer.rows_written(), 5);
    assert!(writer.lost().is_empty());
}

#[tokio::test]
async fn empty_buffer_makes_no_call() {
    let sink = Arc::new(FakeSink::default());
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 20, policy());

    writer.flush_remaining().await.unwrap();
    writer.flush_if_full().await.unwrap();

    assert_eq!(sink.append_attempts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partial_batch_is_not_flushed_early() {
    let sink = Arc::new(FakeSink::default());
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 3, policy());

    writer.append(row("1", 1));
    writer.append(row("2", 2));
    writer.flush_if_full().await.unwrap();

    assert_eq!(writer.pending(), 2);
    assert!(sink.appended().is_empty());
}

#[tokio::test]
async fn zero_capacity_flushes_every_row() {
    let sink = Arc::new(FakeSink::default());
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 0, policy());

    writer.append(row("1", 1));
    writer.flush_if_full().await.unwrap();

    assert_eq!(sink.appended().len(), 1);
}

#[tokio::test]
async fn transient_sink_failure_is_retried_with_backoff() {
    let sink = Arc::new(FakeSink::default());
    sink.append_failures.store(1, Ordering::SeqCst);
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 1, policy());

    writer.append(row("111", 10));
    writer.flush_if_full().await.unwrap();

    assert_eq!(sink.append_attempts.load(Ordering::SeqCst), 2);
    assert_eq!(sleeper.calls(), vec![Duration::from_secs(2)]);
    assert_eq!(writer.rows_written(), 1);
}

#[tokio::test]
async fn exhausted_sink_failure_surfaces_lost_identifiers() {
    let sink = Arc::new(FakeSink {
        append_always_fails: true,
        ..FakeSink::default()
    });
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 2, policy());

    writer.append(row("111", 1));
    writer.append(row("222", 2));
    let err = writer.flush_if_full().await.unwrap_err();

    assert!(
        matches!(err, CollectError::SinkWrite { rows: 2, .. }),
        "got: {err:?}"
    );
    assert_eq!(sink.append_attempts.load(Ordering::SeqCst), 3);
    let lost: Vec<&str> = writer.lost().iter().map(Identifier::as_str).collect();
    assert_eq!(lost, vec!["111", "222"]);
    assert_eq!(writer.pending(), 0, "failed rows leave the buffer");
    assert_eq!(writer.rows_written(), 0);
}

#[tokio::test]
async fn unconfirmed_write_is_not_retried_or_reported_lost() {
    let sink = Arc::new(FakeSink {
        append_unconfirmed: true,
        ..FakeSink::default()
    });
    let sleeper = RecordingSleeper::new();
    let mut writer = BatchWriter::new(&sink, &sleeper, 1, policy());

    writer.append(row("111", 1));
    let err = writer.flush_if_full().await.unwrap_err();

    assert!(
        matches!(err, CollectError::SinkUnconfirmed { rows: 1, .. }),
        "got: {err:?}"
    );
    assert_eq!(sink.append_attempts.load(Ordering::SeqCst), 1);
    assert!(sleeper.calls().is_empty());
    assert!(writer.lost().is_empty());
    let unconfirmed: Vec<&str> = writer.unconfirmed().iter().map(Identifier::as_str).collect();
    assert_eq!(unconfirmed, vec!["111"]);
    assert_eq!(writer.pending(), 0);
}
