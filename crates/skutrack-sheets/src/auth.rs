//! Bearer-token loading for the Sheets API.
//!
//! The credential file holds either a JSON object with an `access_token`
//! field or the raw token text. Minting tokens from a service-account key is
//! left to an external refresher that rewrites the file.

use std::path::Path;

use serde::Deserialize;

use crate::error::SheetsError;

#[derive(Deserialize)]
struct TokenFile {
    access_token: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Reads the bearer token from `path`.
///
/// # Errors
///
/// Returns [`SheetsError::Credentials`] if the file cannot be read, is empty,
/// or is a JSON document without an `access_token`.
pub async fn load_access_token(path: &Path) -> Result<String, SheetsError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SheetsError::Credentials {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
    parse_token(path, &raw)
}

fn parse_token(path: &Path, raw: &str) -> Result<String, SheetsError> {
    let credentials_err = |reason: &str| SheetsError::Credentials {
        path: path.to_path_buf(),
        reason: reason.to_owned(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(credentials_err("file is empty"));
    }

    if trimmed.starts_with('{') {
        let parsed: TokenFile = serde_json::from_str(trimmed)
            .map_err(|e| credentials_err(&format!("invalid JSON: {e}")))?;
        return match parsed.access_token.map(|t| t.trim().to_owned()) {
            Some(token) if !token.is_empty() => Ok(token),
            _ if parsed.kind.as_deref() == Some("service_account") => Err(credentials_err(
                "this is a service-account key, which is never exchanged for tokens here; \
                 run a token refresher that writes {\"access_token\": ...} to this file, \
                 or point SKUTRACK_CREDENTIALS_PATH at the file it writes",
            )),
            _ => Err(credentials_err("JSON has no access_token field")),
        };
    }

    Ok(trimmed.to_owned())
}
