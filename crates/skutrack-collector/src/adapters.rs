//! Production port implementations over the MPStats and Sheets clients.

use std::collections::HashSet;
use std::future::Future;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde_json::Value;
use skutrack_core::{AppConfig, Identifier, MetricRecord, SalesMode, Sleeper, TokioSleeper};
use skutrack_mpstats::{MpstatsClient, MpstatsError};
use skutrack_sheets::{a1_range, load_access_token, SheetsClient, SheetsError};

use crate::ports::{MetricSource, RowSink, SinkConnector, WriteOutcome};
use crate::row::{OutputRow, DATE_FORMAT};

/// [`MetricSource`] backed by [`MpstatsClient`]. Retry back-off waits go
/// through `sleeper`.
pub struct MpstatsSource<S = TokioSleeper> {
    client: MpstatsClient,
    sleeper: S,
}

impl MpstatsSource<TokioSleeper> {
    /// Builds the client with the configured base URL, retry policy and
    /// rate-limit default.
    ///
    /// # Errors
    ///
    /// Returns [`MpstatsError`] if the HTTP client cannot be built or the
    /// base URL is invalid.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, MpstatsError> {
        let client = MpstatsClient::with_base_url(
            &config.mpstats_api_key,
            config.request_timeout_secs,
            &config.user_agent,
            &config.mpstats_base_url,
        )?
        .with_retry_policy(config.fetch_retry_policy())
        .with_rate_limit_default_secs(config.rate_limit_default_secs);
        Ok(Self::new(client, TokioSleeper))
    }
}

impl<S: Sleeper> MpstatsSource<S> {
    pub fn new(client: MpstatsClient, sleeper: S) -> Self {
        Self { client, sleeper }
    }
}

impl<S: Sleeper> MetricSource for MpstatsSource<S> {
    type Error = MpstatsError;

    fn fetch(
        &self,
        identifier: &Identifier,
        date: NaiveDate,
        mode: SalesMode,
    ) -> impl Future<Output = Result<Option<MetricRecord>, MpstatsError>> + Send {
        self.client.fetch(&self.sleeper, identifier, date, mode)
    }
}

/// Opens a [`SheetsSink`], reloading the bearer token from disk each time.
#[derive(Debug, Clone)]
pub struct SheetsConnector {
    pub credentials_path: PathBuf,
    pub base_url: String,
    pub spreadsheet_id: String,
    pub identifiers_sheet: String,
    pub data_sheet: String,
    pub timeout_secs: u64,
    /// Wait applied to a 429 without a usable `Retry-After`.
    pub rate_limit_default_secs: u64,
    pub user_agent: String,
}

impl SheetsConnector {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            credentials_path: config.credentials_path.clone(),
            base_url: config.sheets_base_url.clone(),
            spreadsheet_id: config.spreadsheet_id.clone(),
            identifiers_sheet: config.identifiers_sheet.clone(),
            data_sheet: config.data_sheet.clone(),
            timeout_secs: config.request_timeout_secs,
            rate_limit_default_secs: config.rate_limit_default_secs,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl SinkConnector for SheetsConnector {
    type Sink = SheetsSink;
    type Error = SheetsError;

    fn connect(&self) -> impl Future<Output = Result<SheetsSink, SheetsError>> + Send {
        async move {
            let token = load_access_token(&self.credentials_path).await?;
            let client = SheetsClient::with_base_url(
                &self.base_url,
                &self.spreadsheet_id,
                &token,
                self.timeout_secs,
                &self.user_agent,
            )?
            .with_rate_limit_default_secs(self.rate_limit_default_secs);
            client.verify_access().await?;
            tracing::debug!("spreadsheet access verified");
            Ok(SheetsSink {
                client,
                identifiers_range: a1_range(&self.identifiers_sheet, "A:A"),
                keys_range: a1_range(&self.data_sheet, "A:B"),
                append_range: a1_range(&self.data_sheet, "A:E"),
            })
        }
    }
}

/// Identifiers in column A of one sheet; results appended to columns A:E of
/// another.
pub struct SheetsSink {
    client: SheetsClient,
    identifiers_range: String,
    keys_range: String,
    append_range: String,
}

impl RowSink for SheetsSink {
    type Error = SheetsError;

    fn read_identifiers(&self) -> impl Future<Output = Result<Vec<String>, SheetsError>> + Send {
        self.client.read_column_without_header(&self.identifiers_range)
    }

    fn existing_keys(
        &self,
        date: NaiveDate,
    ) -> impl Future<Output = Result<HashSet<String>, SheetsError>> + Send {
        async move {
            let wanted = date.format(DATE_FORMAT).to_string();
            let rows = self.client.read_rows(&self.keys_range).await?;
            Ok(rows
                .into_iter()
                .filter(|row| row.first().is_some_and(|d| d.trim() == wanted))
                .filter_map(|row| row.get(1).map(|id| id.trim().to_owned()))
                .collect())
        }
    }

    fn append_rows(
        &self,
        rows: &[OutputRow],
    ) -> impl Future<Output = Result<usize, SheetsError>> + Send {
        let cells: Vec<Vec<Value>> = rows.iter().map(OutputRow::to_cells).collect();
        self.client.append_rows(&self.append_range, cells)
    }
}

impl WriteOutcome for SheetsError {
    fn may_have_written(&self) -> bool {
        matches!(self, SheetsError::WriteUnconfirmed { .. })
    }
}
