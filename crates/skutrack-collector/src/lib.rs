//! Batch-fetch-and-reconcile pipeline: reads identifiers from the sink, looks
//! up metrics one identifier at a time, and appends dated rows in batches.

pub mod adapters;
pub mod batch;
pub mod error;
pub mod pacing;
pub mod ports;
pub mod row;
pub mod runner;

pub use adapters::{MpstatsSource, SheetsConnector, SheetsSink};
pub use batch::BatchWriter;
pub use error::CollectError;
pub use pacing::{PacingSettings, RequestPacer};
pub use ports::{MetricSource, RowSink, SinkConnector, WriteOutcome};
pub use row::OutputRow;
pub use runner::{default_target_date, Collector, CollectorSettings, RunReport, RunState};

#[cfg(test)]
mod testing;
