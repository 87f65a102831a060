//! Request pacing against the metrics API's per-window quota.

use std::time::Duration;

use skutrack_core::Sleeper;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingSettings {
    /// Lookups allowed before a cooldown. Zero behaves like one.
    pub quota_per_window: u32,
    pub cooldown: Duration,
    pub inter_request_delay: Duration,
}

/// Counts lookups and decides how long to wait before the next one.
///
/// Every lookup is followed by the inter-request delay, except the one that
/// exhausts the quota, which is followed by the cooldown instead.
#[derive(Debug)]
pub struct RequestPacer {
    settings: PacingSettings,
    in_window: u32,
}

impl RequestPacer {
    #[must_use]
    pub fn new(settings: PacingSettings) -> Self {
        Self {
            settings,
            in_window: 0,
        }
    }

    /// Records one lookup and returns the pause owed before the next.
    pub fn record_request(&mut self) -> Duration {
        self.in_window += 1;
        if self.in_window >= self.settings.quota_per_window.max(1) {
            self.in_window = 0;
            self.settings.cooldown
        } else {
            self.settings.inter_request_delay
        }
    }

    /// Records one lookup and sleeps for the owed pause.
    pub async fn pause<S: Sleeper>(&mut self, sleeper: &S) {
        let pause = self.record_request();
        if self.in_window == 0 {
            tracing::info!(
                quota = self.settings.quota_per_window,
                cooldown_secs = pause.as_secs(),
                "request quota reached, cooling down"
            );
        }
        if !pause.is_zero() {
            sleeper.sleep(pause).await;
        }
    }
}
