//! HTTP client for the MPStats per-item statistics API.
//!
//! Each public fetch method performs one logical lookup wrapped in the
//! configured [`RetryPolicy`]. The single-attempt request never sleeps; it
//! reports rate limiting as [`MpstatsError::RateLimited`] and the policy
//! decides how long to wait.

use std::time::Duration;

use chrono::{Days, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use skutrack_core::{Identifier, MetricRecord, RetryPolicy, SalesMode, Sleeper};

use crate::delta::sales_delta;
use crate::error::MpstatsError;
use crate::types::{parse_records, DayRecord};

const DEFAULT_BASE_URL: &str = "https://mpstats.io/api/wb/get/item";
const TOKEN_HEADER: &str = "X-Mpstats-TOKEN";
const DEFAULT_RATE_LIMIT_SECS: u64 = 60;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Per-item endpoints used by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endpoint {
    /// Single-day snapshot, queried with `d`.
    BalanceByDay,
    /// Date range, queried with `d1` and `d2`.
    Sales,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::BalanceByDay => "balance_by_day",
            Endpoint::Sales => "sales",
        }
    }
}

/// Client for the MPStats item API.
///
/// Use [`MpstatsClient::new`] for production or
/// [`MpstatsClient::with_base_url`] to point at a mock server in tests.
pub struct MpstatsClient {
    client: Client,
    api_key: String,
    base_url: Url,
    retry: RetryPolicy,
    rate_limit_default_secs: u64,
}

impl MpstatsClient {
    /// Creates a new client pointed at the production MPStats API.
    ///
    /// # Errors
    ///
    /// Returns [`MpstatsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, MpstatsError> {
        Self::with_base_url(api_key, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`MpstatsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`MpstatsError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, MpstatsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // Exactly one trailing slash so `Url::join` appends to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| MpstatsError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
            retry: RetryPolicy::no_retry(),
            rate_limit_default_secs: DEFAULT_RATE_LIMIT_SECS,
        })
    }

    /// Sets the retry policy applied to every lookup.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the wait used when a 429 response carries no usable `Retry-After`.
    #[must_use]
    pub fn with_rate_limit_default_secs(mut self, secs: u64) -> Self {
        self.rate_limit_default_secs = secs;
        self
    }

    /// Fetches the metrics for `identifier` on `date` in the given mode.
    ///
    /// # Errors
    ///
    /// See [`Self::fetch_day`] and [`Self::fetch_delta`].
    pub async fn fetch<S: Sleeper>(
        &self,
        sleeper: &S,
        identifier: &Identifier,
        date: NaiveDate,
        mode: SalesMode,
    ) -> Result<Option<MetricRecord>, MpstatsError> {
        match mode {
            SalesMode::Daily => self.fetch_day(sleeper, identifier, date).await,
            SalesMode::Delta => self.fetch_delta(sleeper, identifier, date).await,
        }
    }

    /// Fetches the `balance_by_day` snapshot for `identifier` on `date`.
    ///
    /// Returns `Ok(None)` when the API has no record for that date. A record
    /// without a `date` field is taken as the requested day.
    ///
    /// # Errors
    ///
    /// - [`MpstatsError::RateLimited`]: HTTP 429 after all retries.
    /// - [`MpstatsError::UnexpectedStatus`]: other non-2xx status.
    /// - [`MpstatsError::Http`]: network failure after all retries.
    /// - [`MpstatsError::Deserialize`]: body is not a record array.
    pub async fn fetch_day<S: Sleeper>(
        &self,
        sleeper: &S,
        identifier: &Identifier,
        date: NaiveDate,
    ) -> Result<Option<MetricRecord>, MpstatsError> {
        let d = date.format(DATE_FORMAT).to_string();
        let url = self.endpoint_url(identifier, Endpoint::BalanceByDay, &[("d", &d)])?;
        let records = self.request_with_retry(sleeper, identifier, &url).await?;

        let record = records
            .iter()
            .find(|r| r.date == Some(date))
            .or_else(|| records.iter().find(|r| r.date.is_none()))
            .cloned()
            .map(|r| r.into_metric(date));

        if record.is_none() {
            tracing::debug!(%identifier, %date, "no balance record for date");
        }
        Ok(record)
    }

    /// Fetches a two-day `sales` range ending at `date` and returns the
    /// day-over-day sales delta. See [`sales_delta`] for the combination rules.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch_day`].
    pub async fn fetch_delta<S: Sleeper>(
        &self,
        sleeper: &S,
        identifier: &Identifier,
        date: NaiveDate,
    ) -> Result<Option<MetricRecord>, MpstatsError> {
        let prior_date = date.checked_sub_days(Days::new(1)).unwrap_or(date);
        let d1 = prior_date.format(DATE_FORMAT).to_string();
        let d2 = date.format(DATE_FORMAT).to_string();
        let url = self.endpoint_url(identifier, Endpoint::Sales, &[("d1", &d1), ("d2", &d2)])?;
        let records = self.request_with_retry(sleeper, identifier, &url).await?;

        let pick = |day: NaiveDate| -> Option<MetricRecord> {
            records
                .iter()
                .find(|r| r.date == Some(day))
                .map(|r| r.clone().into_metric(day))
        };
        let target = pick(date);
        let prior = pick(prior_date);

        let record = sales_delta(date, target.as_ref(), prior.as_ref());
        if record.is_none() {
            tracing::debug!(%identifier, %date, "no sales records for either day");
        }
        Ok(record)
    }

    /// Builds `{base}/{identifier}/{endpoint}?{params}`.
    fn endpoint_url(
        &self,
        identifier: &Identifier,
        endpoint: Endpoint,
        params: &[(&str, &str)],
    ) -> Result<Url, MpstatsError> {
        let mut url = self
            .base_url
            .join(&format!("{identifier}/{}", endpoint.path()))
            .map_err(|e| MpstatsError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in params {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    async fn request_with_retry<S: Sleeper>(
        &self,
        sleeper: &S,
        identifier: &Identifier,
        url: &Url,
    ) -> Result<Vec<DayRecord>, MpstatsError> {
        self.retry
            .run(sleeper, "mpstats lookup", || self.request_records(identifier, url))
            .await
    }

    /// One GET attempt: maps 429 and other non-2xx statuses to typed errors
    /// and parses the body as a record array.
    async fn request_records(
        &self,
        identifier: &Identifier,
        url: &Url,
    ) -> Result<Vec<DayRecord>, MpstatsError> {
        let response = self
            .client
            .get(url.clone())
            .header(TOKEN_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(self.rate_limit_default_secs);
            return Err(MpstatsError::RateLimited {
                identifier: identifier.to_string(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(MpstatsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        parse_records(&body).map_err(|e| MpstatsError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}
