use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::retry::RetryPolicy;

/// How the sales column is computed for a target date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesMode {
    /// Sales as reported by the single-day snapshot.
    Daily,
    /// Target-day sales minus prior-day sales.
    Delta,
}

impl std::fmt::Display for SalesMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SalesMode::Daily => write!(f, "daily"),
            SalesMode::Delta => write!(f, "delta"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub spreadsheet_id: String,
    pub mpstats_api_key: String,
    pub credentials_path: PathBuf,
    pub log_level: String,
    pub mpstats_base_url: String,
    pub sheets_base_url: String,
    pub identifiers_sheet: String,
    pub data_sheet: String,
    pub sales_mode: SalesMode,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub batch_size: usize,
    pub quota_per_window: u32,
    pub quota_cooldown_secs: u64,
    pub inter_request_delay_ms: u64,
    pub fetch_max_attempts: u32,
    pub fetch_backoff_base_secs: u64,
    pub fetch_backoff_cap_secs: u64,
    pub rate_limit_default_secs: u64,
    pub sink_max_attempts: u32,
    /// Wall-clock time (UTC) of the daily scheduled run.
    pub daily_at: NaiveTime,
    pub skip_existing: bool,
}

impl AppConfig {
    /// Retry policy wrapped around every metrics lookup.
    #[must_use]
    pub fn fetch_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.fetch_max_attempts,
            Duration::from_secs(self.fetch_backoff_base_secs),
            Duration::from_secs(self.fetch_backoff_cap_secs),
        )
    }

    /// Retry policy wrapped around every bulk append to the data sheet.
    #[must_use]
    pub fn sink_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.sink_max_attempts,
            Duration::from_secs(self.fetch_backoff_base_secs),
            Duration::from_secs(self.fetch_backoff_cap_secs),
        )
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("spreadsheet_id", &"[redacted]")
            .field("mpstats_api_key", &"[redacted]")
            .field("credentials_path", &self.credentials_path)
            .field("log_level", &self.log_level)
            .field("mpstats_base_url", &self.mpstats_base_url)
            .field("sheets_base_url", &self.sheets_base_url)
            .field("identifiers_sheet", &self.identifiers_sheet)
            .field("data_sheet", &self.data_sheet)
            .field("sales_mode", &self.sales_mode)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("batch_size", &self.batch_size)
            .field("quota_per_window", &self.quota_per_window)
            .field("quota_cooldown_secs", &self.quota_cooldown_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("fetch_max_attempts", &self.fetch_max_attempts)
            .field("fetch_backoff_base_secs", &self.fetch_backoff_base_secs)
            .field("fetch_backoff_cap_secs", &self.fetch_backoff_cap_secs)
            .field("rate_limit_default_secs", &self.rate_limit_default_secs)
            .field("sink_max_attempts", &self.sink_max_attempts)
            .field("daily_at", &self.daily_at)
            .field("skip_existing", &self.skip_existing)
            .finish()
    }
}
