//! Suspension points for pacing and back-off.
//!
//! Every deliberate wait in a collection run (inter-request delay, quota
//! cooldown, retry back-off) goes through a [`Sleeper`] so tests can observe
//! the requested durations without actually waiting.

use std::future::Future;
use std::time::Duration;

pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Records every requested duration and returns immediately.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    calls: std::sync::Arc<std::sync::Mutex<Vec<Duration>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl RecordingSleeper {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in call order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock was poisoned by a panicking test thread.
    #[must_use]
    pub fn calls(&self) -> Vec<Duration> {
        self.calls.lock().expect("sleeper lock poisoned").clone()
    }

    /// Sum of all requested durations.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.calls().iter().sum()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.calls
            .lock()
            .expect("sleeper lock poisoned")
            .push(duration);
        std::future::ready(())
    }
}
