//! HTTP client for the Google Sheets v4 `values` API.

mod values;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};

use crate::error::SheetsError;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Longest error body excerpt carried in [`SheetsError::UnexpectedStatus`].
const MAX_ERROR_BODY_CHARS: usize = 300;
const DEFAULT_RATE_LIMIT_SECS: u64 = 60;

/// Client bound to one spreadsheet and one bearer token.
///
/// A fresh client is built for every collection run so token rotation on disk
/// is picked up without restarting the process.
pub struct SheetsClient {
    client: Client,
    base_url: Url,
    spreadsheet_id: String,
    access_token: String,
    rate_limit_default_secs: u64,
}

impl SheetsClient {
    /// Creates a client for the production Sheets API.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        spreadsheet_id: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SheetsError> {
        Self::with_base_url(
            DEFAULT_BASE_URL,
            spreadsheet_id,
            access_token,
            timeout_secs,
            user_agent,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::Http`] if the `reqwest::Client` cannot be
    /// constructed, or [`SheetsError::InvalidBaseUrl`] if `base_url` cannot
    /// carry path segments.
    pub fn with_base_url(
        base_url: &str,
        spreadsheet_id: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let invalid = |reason: String| SheetsError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason,
        };
        let parsed =
            Url::parse(base_url.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("URL cannot be a base".to_owned()));
        }

        Ok(Self {
            client,
            base_url: parsed,
            spreadsheet_id: spreadsheet_id.to_owned(),
            access_token: access_token.to_owned(),
            rate_limit_default_secs: DEFAULT_RATE_LIMIT_SECS,
        })
    }

    /// Sets the wait used when a 429 response carries no usable `Retry-After`.
    #[must_use]
    pub fn with_rate_limit_default_secs(mut self, secs: u64) -> Self {
        self.rate_limit_default_secs = secs;
        self
    }

    #[must_use]
    pub fn spreadsheet_id(&self) -> &str {
        &self.spreadsheet_id
    }

    /// Confirms the spreadsheet exists and the token can read it.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::UnexpectedStatus`] for 401/403/404 and other
    /// non-2xx responses, or [`SheetsError::Http`] on network failure.
    pub async fn verify_access(&self) -> Result<(), SheetsError> {
        let mut url = self.spreadsheet_url(&[]);
        url.query_pairs_mut().append_pair("fields", "spreadsheetId");
        let response = self.send(self.client.get(url.clone()), &url).await?;
        // Drain the body so the connection can be reused.
        response.bytes().await?;
        Ok(())
    }

    /// `{base}/spreadsheets/{id}/{extra...}` with every segment escaped.
    fn spreadsheet_url(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `with_base_url` rejects cannot-be-a-base URLs, so segments are available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("spreadsheets")
                .push(&self.spreadsheet_id)
                .extend(extra);
        }
        url
    }

    /// Attaches auth, sends, and maps non-2xx statuses to typed errors.
    async fn send(&self, request: RequestBuilder, url: &Url) -> Result<Response, SheetsError> {
        let response = request
            .bearer_auth(&self.access_token)
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
            return Err(SheetsError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
            return Err(SheetsError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
                message,
            });
        }

        Ok(response)
    }
}

#[cfg(test)]
#[path = "../client_test.rs"]
mod tests;
