use std::sync::LazyLock;

use chrono::NaiveTime;
use regex::Regex;

use crate::app_config::{AppConfig, SalesMode};
use crate::ConfigError;

static SPREADSHEET_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/spreadsheets/d/([A-Za-z0-9_-]+)").expect("valid spreadsheet url regex")
});

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// The lookup is injected so the parsing rules can be exercised with a plain
/// `HashMap` in tests.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let spreadsheet_id = parse_spreadsheet_id(&require("GOOGLE_SHEETS_URL")?)?;
    let mpstats_api_key = require("MPSTATS_API_KEY")?;

    let credentials_path =
        PathBuf::from(or_default("SKUTRACK_CREDENTIALS_PATH", "credentials.json"));
    let log_level = or_default("SKUTRACK_LOG_LEVEL", "info");
    let mpstats_base_url = or_default("MPSTATS_BASE_URL", "https://mpstats.io/api/wb/get/item");
    let sheets_base_url = or_default(
        "SKUTRACK_SHEETS_BASE_URL",
        "https://sheets.googleapis.com/v4",
    );
    let identifiers_sheet = or_default("SKUTRACK_IDENTIFIERS_SHEET", "Identifiers");
    let data_sheet = or_default("SKUTRACK_DATA_SHEET", "Data");
    let sales_mode = parse_sales_mode(&or_default("SKUTRACK_SALES_MODE", "daily"))?;

    let request_timeout_secs = parse_u64("SKUTRACK_REQUEST_TIMEOUT_SECS", "10")?;
    let user_agent = or_default("SKUTRACK_USER_AGENT", "skutrack/0.1 (marketplace-metrics)");

    let batch_size = parse_positive_u32("SKUTRACK_BATCH_SIZE", "20")? as usize;
    let quota_per_window = parse_positive_u32("SKUTRACK_QUOTA_PER_WINDOW", "100")?;
    let quota_cooldown_secs = parse_u64("SKUTRACK_QUOTA_COOLDOWN_SECS", "60")?;
    let inter_request_delay_ms = parse_u64("SKUTRACK_INTER_REQUEST_DELAY_MS", "2000")?;

    let fetch_max_attempts = parse_positive_u32("SKUTRACK_FETCH_MAX_ATTEMPTS", "3")?;
    let fetch_backoff_base_secs = parse_u64("SKUTRACK_FETCH_BACKOFF_BASE_SECS", "2")?;
    let fetch_backoff_cap_secs = parse_u64("SKUTRACK_FETCH_BACKOFF_CAP_SECS", "10")?;
    let rate_limit_default_secs = parse_u64("SKUTRACK_RATE_LIMIT_DEFAULT_SECS", "60")?;
    let sink_max_attempts = parse_positive_u32("SKUTRACK_SINK_MAX_ATTEMPTS", "3")?;

    let daily_at = parse_daily_at(&or_default("SKUTRACK_DAILY_AT", "23:30"))?;
    let skip_existing = parse_bool(
        "SKUTRACK_SKIP_EXISTING",
        &or_default("SKUTRACK_SKIP_EXISTING", "false"),
    )?;

    Ok(AppConfig {
        spreadsheet_id,
        mpstats_api_key,
        credentials_path,
        log_level,
        mpstats_base_url,
        sheets_base_url,
        identifiers_sheet,
        data_sheet,
        sales_mode,
        request_timeout_secs,
        user_agent,
        batch_size,
        quota_per_window,
        quota_cooldown_secs,
        inter_request_delay_ms,
        fetch_max_attempts,
        fetch_backoff_base_secs,
        fetch_backoff_cap_secs,
        rate_limit_default_secs,
        sink_max_attempts,
        daily_at,
        skip_existing,
    })
}

/// Extract the spreadsheet id from a full Google Sheets URL, or accept a bare id.
fn parse_spreadsheet_id(raw: &str) -> Result<String, ConfigError> {
    let raw = raw.trim();
    if let Some(caps) = SPREADSHEET_URL_RE.captures(raw) {
        return Ok(caps[1].to_string());
    }
    let is_bare_id = raw
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if is_bare_id {
        return Ok(raw.to_string());
    }
    Err(ConfigError::InvalidEnvVar {
        var: "GOOGLE_SHEETS_URL".to_string(),
        reason: format!("no spreadsheet id found in '{raw}'"),
    })
}

fn parse_sales_mode(s: &str) -> Result<SalesMode, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "daily" => Ok(SalesMode::Daily),
        "delta" => Ok(SalesMode::Delta),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SKUTRACK_SALES_MODE".to_string(),
            reason: format!("expected 'daily' or 'delta', got '{other}'"),
        }),
    }
}

fn parse_daily_at(s: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|e| ConfigError::InvalidEnvVar {
        var: "SKUTRACK_DAILY_AT".to_string(),
        reason: format!("expected HH:MM, got '{s}': {e}"),
    })
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
