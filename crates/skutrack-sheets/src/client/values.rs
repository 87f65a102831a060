//! Range reads and appends.

use serde_json::Value;

use crate::error::SheetsError;
use crate::types::{AppendResponse, ValueRange};

use super::SheetsClient;

impl SheetsClient {
    /// Reads a range and returns its rows as display strings.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::UnexpectedStatus`] on a non-2xx response,
    /// [`SheetsError::Http`] on network failure, or
    /// [`SheetsError::Deserialize`] if the body is not a `ValueRange`.
    pub async fn read_rows(&self, range: &str) -> Result<Vec<Vec<String>>, SheetsError> {
        let url = self.spreadsheet_url(&["values", range]);
        let response = self.send(self.client.get(url.clone()), &url).await?;
        let body = response.text().await?;
        let parsed: ValueRange =
            serde_json::from_str(&body).map_err(|e| SheetsError::Deserialize {
                context: format!("values.get({range})"),
                source: e,
            })?;
        Ok(parsed.string_rows())
    }

    /// Reads the first cell of every row in `range`, skipping the header row.
    ///
    /// Rows with no cells yield an empty string so positions are preserved
    /// for the caller's own filtering.
    ///
    /// # Errors
    ///
    /// Same as [`Self::read_rows`].
    pub async fn read_column_without_header(
        &self,
        range: &str,
    ) -> Result<Vec<String>, SheetsError> {
        let rows = self.read_rows(range).await?;
        Ok(rows
            .into_iter()
            .skip(1)
            .map(|row| row.into_iter().next().unwrap_or_default())
            .collect())
    }

    /// Appends `rows` after the last row of the table at `range` in one call.
    ///
    /// Values are stored as given (`RAW`), so text such as ISO dates is not
    /// reinterpreted by the sheet's locale. The Sheets API applies a single
    /// `values:append` atomically: either every row lands or the call fails.
    /// Returns the number of rows the API reports as written, or `rows.len()`
    /// when the response omits it.
    ///
    /// # Errors
    ///
    /// Returns [`SheetsError::RateLimited`] on 429,
    /// [`SheetsError::UnexpectedStatus`] on other non-2xx responses,
    /// or [`SheetsError::WriteUnconfirmed`] when the request fails in transit
    /// (timeout, dropped connection) and the server may have stored the rows.
    /// Once a 2xx status arrives the call succeeds even if the body cannot be
    /// read.
    pub async fn append_rows(
        &self,
        range: &str,
        rows: Vec<Vec<Value>>,
    ) -> Result<usize, SheetsError> {
        let row_count = rows.len();
        let mut url = self.spreadsheet_url(&["values", &format!("{range}:append")]);
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        let body = ValueRange {
            values: rows,
            ..ValueRange::default()
        };
        let request = self.client.post(url.clone()).json(&body);
        // Only a failed connect proves the request never reached the server;
        // any other transport failure may follow a committed append.
        let response = self.send(request, &url).await.map_err(|e| match e {
            SheetsError::Http(source) if !source.is_connect() => SheetsError::WriteUnconfirmed {
                range: range.to_owned(),
                source,
            },
            other => other,
        })?;

        // A 2xx status means the rows are stored; an unreadable body only
        // loses the update summary.
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(range, error = %e, "append response body unreadable");
                String::new()
            }
        };

        let written = if text.trim().is_empty() {
            None
        } else {
            match serde_json::from_str::<AppendResponse>(&text) {
                Ok(parsed) => parsed
                    .updates
                    .and_then(|u| u.updated_rows)
                    .and_then(|n| usize::try_from(n).ok()),
                Err(e) => {
                    tracing::warn!(range, error = %e, "append response body malformed");
                    None
                }
            }
        };

        tracing::debug!(range, rows = row_count, "appended rows to sheet");
        Ok(written.unwrap_or(row_count))
    }
}
