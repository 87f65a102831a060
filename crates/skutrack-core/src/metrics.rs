use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Normalized per-day metrics for one identifier.
///
/// In delta mode `sales` holds the day-over-day difference and may be
/// negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub date: NaiveDate,
    pub price: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub sales: i64,
}
