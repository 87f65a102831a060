use chrono::NaiveDate;
use skutrack_core::MetricRecord;

/// Day-over-day sales for `target_date`.
///
/// Returns `None` only when both days are absent. A missing side counts as
/// zero sales. Prices always come from the target-day record; when that day
/// is absent they stay empty even if the prior day had them.
#[must_use]
pub fn sales_delta(
    target_date: NaiveDate,
    target: Option<&MetricRecord>,
    prior: Option<&MetricRecord>,
) -> Option<MetricRecord> {
    if target.is_none() && prior.is_none() {
        return None;
    }
    let target_sales = target.map_or(0, |r| r.sales);
    let prior_sales = prior.map_or(0, |r| r.sales);
    Some(MetricRecord {
        date: target_date,
        price: target.and_then(|r| r.price),
        final_price: target.and_then(|r| r.final_price),
        sales: target_sales.saturating_sub(prior_sales),
    })
}
