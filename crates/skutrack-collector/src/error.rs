use thiserror::Error;

/// Boxed error from a port implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum CollectError {
    /// Opening the sink or reading the identifier list failed; the run
    /// cannot start.
    #[error("run initialization failed while {stage}: {source}")]
    Initialize {
        stage: &'static str,
        #[source]
        source: BoxError,
    },

    /// A bulk append failed after every retry. The rows were not written.
    #[error("failed to write {rows} rows to the sink: {source}")]
    SinkWrite {
        rows: usize,
        #[source]
        source: BoxError,
    },

    /// A bulk append failed in a way that leaves its outcome unknown; the
    /// rows may be in the sink.
    #[error("write of {rows} rows to the sink is unconfirmed: {source}")]
    SinkUnconfirmed {
        rows: usize,
        #[source]
        source: BoxError,
    },
}

impl CollectError {
    pub(crate) fn initialize<E>(stage: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Initialize {
            stage,
            source: Box::new(source),
        }
    }
}
