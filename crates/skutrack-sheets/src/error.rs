use std::path::PathBuf;
use std::time::Duration;

use skutrack_core::{Classify, Verdict};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rate limited by Sheets API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}: {message}")]
    UnexpectedStatus {
        status: u16,
        url: String,
        message: String,
    },

    #[error("cannot load credentials from {}: {reason}", path.display())]
    Credentials { path: PathBuf, reason: String },

    /// The append request failed in transit, so the server may or may not
    /// have stored the rows.
    #[error("append to {range} unconfirmed: {source}")]
    WriteUnconfirmed {
        range: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("invalid Sheets base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl Classify for SheetsError {
    fn verdict(&self) -> Verdict {
        match self {
            SheetsError::Http(_) => Verdict::Retry,
            SheetsError::RateLimited { retry_after_secs } => {
                Verdict::RetryAfter(Duration::from_secs(*retry_after_secs))
            }
            SheetsError::UnexpectedStatus { status, .. } if *status >= 500 => Verdict::Retry,
            SheetsError::UnexpectedStatus { .. }
            | SheetsError::Deserialize { .. }
            | SheetsError::Credentials { .. }
            | SheetsError::WriteUnconfirmed { .. }
            | SheetsError::InvalidBaseUrl { .. } => Verdict::Fatal,
        }
    }
}
