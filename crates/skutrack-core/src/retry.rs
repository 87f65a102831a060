//! Retry with capped exponential back-off.
//!
//! Errors describe themselves through [`Classify`]; [`RetryPolicy::run`] wraps
//! a single-attempt operation and owns every sleep between attempts. The
//! operation itself never sleeps or loops.

use std::future::Future;
use std::time::Duration;

use crate::sleep::Sleeper;

/// What the retry loop should do with a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Give up immediately; retrying cannot change the outcome.
    Fatal,
    /// Retry after the policy's back-off delay.
    Retry,
    /// Retry after at least the given delay (e.g. a server-supplied
    /// `Retry-After`), or the back-off delay if that is longer.
    RetryAfter(Duration),
}

pub trait Classify {
    fn verdict(&self) -> Verdict;
}

/// Attempt budget and back-off schedule.
///
/// With `base_delay = 2s` and `max_delay = 10s` the waits between attempts are
/// 2s, 4s, 8s, 10s, 10s, ...
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Zero behaves like one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    #[must_use]
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            max_delay,
        }
    }

    /// A policy that tries exactly once.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO)
    }

    /// Back-off before retry number `retry` (1-based): `base * 2^(retry-1)`,
    /// capped at `max_delay`.
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay)
    }

    /// Delay before retry number `retry` for the given verdict, or `None` when
    /// the verdict forbids retrying.
    #[must_use]
    pub fn delay_for(&self, retry: u32, verdict: Verdict) -> Option<Duration> {
        match verdict {
            Verdict::Fatal => None,
            Verdict::Retry => Some(self.backoff(retry)),
            Verdict::RetryAfter(hint) => Some(hint.max(self.backoff(retry))),
        }
    }

    /// Runs `operation` until it succeeds, returns a fatal error, or the
    /// attempt budget is spent. The last error is returned on exhaustion.
    ///
    /// # Errors
    ///
    /// Returns the operation's error when it is [`Verdict::Fatal`] or when
    /// `max_attempts` attempts have all failed.
    pub async fn run<T, E, F, Fut, S>(
        &self,
        sleeper: &S,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + std::fmt::Display,
        S: Sleeper,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1u32;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if attempt >= max_attempts {
                        return Err(err);
                    }
                    let Some(delay) = self.delay_for(attempt, err.verdict()) else {
                        return Err(err);
                    };
                    tracing::warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "transient error, retrying after back-off"
                    );
                    sleeper.sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::sleep::RecordingSleeper;

    #[derive(Debug)]
    enum TestError {
        Transient,
        Throttled(u64),
        Broken,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Classify for TestError {
        fn verdict(&self) -> Verdict {
            match self {
                TestError::Transient => Verdict::Retry,
                TestError::Throttled(secs) => Verdict::RetryAfter(Duration::from_secs(*secs)),
                TestError::Broken => Verdict::Fatal,
            }
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(2), Duration::from_secs(10))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let p = policy();
        assert_eq!(p.backoff(1), Duration::from_secs(2));
        assert_eq!(p.backoff(2), Duration::from_secs(4));
        assert_eq!(p.backoff(3), Duration::from_secs(8));
        assert_eq!(p.backoff(4), Duration::from_secs(10));
        assert_eq!(p.backoff(40), Duration::from_secs(10));
    }

    #[test]
    fn retry_after_acts_as_a_floor() {
        let p = policy();
        assert_eq!(
            p.delay_for(1, Verdict::RetryAfter(Duration::from_secs(60))),
            Some(Duration::from_secs(60))
        );
        assert_eq!(
            p.delay_for(2, Verdict::RetryAfter(Duration::from_secs(1))),
            Some(Duration::from_secs(4))
        );
        assert_eq!(p.delay_for(1, Verdict::Fatal), None);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let sleeper = RecordingSleeper::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = policy()
            .run(&sleeper, "test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, TestError>(42)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn retries_then_succeeds_with_growing_delays() {
        let sleeper = RecordingSleeper::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = policy()
            .run(&sleeper, "test", || {
                let c = Arc::clone(&c);
                async move {
                    if c.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TestError::Transient)
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.calls(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let sleeper = RecordingSleeper::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = policy()
            .run(&sleeper, "test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(TestError::Throttled(0))
                }
            })
            .await;
        assert!(matches!(result, Err(TestError::Throttled(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly 3 attempts");
        assert_eq!(sleeper.calls().len(), 2, "no sleep after the last attempt");
    }

    #[tokio::test]
    async fn fatal_error_is_not_retried() {
        let sleeper = RecordingSleeper::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = policy()
            .run(&sleeper, "test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(TestError::Broken)
                }
            })
            .await;
        assert!(matches!(result, Err(TestError::Broken)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(sleeper.calls().is_empty());
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let sleeper = RecordingSleeper::new();
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let _ = RetryPolicy::new(0, Duration::ZERO, Duration::ZERO)
            .run(&sleeper, "test", || {
                let c = Arc::clone(&c);
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    Err::<u32, _>(TestError::Transient)
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
