use std::time::Duration;

use skutrack_core::{Classify, Verdict};
use thiserror::Error;

/// Errors returned by the MPStats API client.
#[derive(Debug, Error)]
pub enum MpstatsError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP 429; the server asked us to wait before the next request.
    #[error("rate limited while fetching {identifier} (retry after {retry_after_secs}s)")]
    RateLimited {
        identifier: String,
        retry_after_secs: u64,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{base_url}': {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

/// **Retriable:** transport failures, 429 (after the server-supplied delay),
/// and 5xx responses.
///
/// **Not retriable:** other non-2xx statuses, malformed bodies, and bad
/// configuration.
impl Classify for MpstatsError {
    fn verdict(&self) -> Verdict {
        match self {
            MpstatsError::Http(_) => Verdict::Retry,
            MpstatsError::RateLimited {
                retry_after_secs, ..
            } => Verdict::RetryAfter(Duration::from_secs(*retry_after_secs)),
            MpstatsError::UnexpectedStatus { status, .. } if *status >= 500 => Verdict::Retry,
            MpstatsError::UnexpectedStatus { .. }
            | MpstatsError::Deserialize { .. }
            | MpstatsError::InvalidBaseUrl { .. } => Verdict::Fatal,
        }
    }
}
