//! MPStats API response types.
//!
//! Both `balance_by_day` and `sales` return a bare JSON array of per-date
//! records. Fields the pipeline does not use are ignored.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use skutrack_core::MetricRecord;

/// One per-date row from the MPStats item endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub final_price: Option<Decimal>,
    #[serde(default)]
    pub sales: Option<i64>,
}

impl DayRecord {
    /// Normalize into a [`MetricRecord`] for `date`; missing sales count as 0.
    #[must_use]
    pub fn into_metric(self, date: NaiveDate) -> MetricRecord {
        MetricRecord {
            date: self.date.unwrap_or(date),
            price: self.price,
            final_price: self.final_price,
            sales: self.sales.unwrap_or(0),
        }
    }
}

/// Parse an endpoint body. An empty body or JSON `null` means "no data".
pub(crate) fn parse_records(body: &str) -> Result<Vec<DayRecord>, serde_json::Error> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let parsed: Option<Vec<DayRecord>> = serde_json::from_str(body)?;
    Ok(parsed.unwrap_or_default())
}
