use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{Number, Value};
use skutrack_core::{Identifier, MetricRecord};

/// Sheet date format, also used to match existing rows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// One line of the data sheet: `date | identifier | price | final price | sales`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub date: NaiveDate,
    pub identifier: Identifier,
    pub price: Option<Decimal>,
    pub final_price: Option<Decimal>,
    pub sales: i64,
}

impl OutputRow {
    #[must_use]
    pub fn build(record: &MetricRecord, date: NaiveDate, identifier: &Identifier) -> Self {
        Self {
            date,
            identifier: identifier.clone(),
            price: record.price,
            final_price: record.final_price,
            sales: record.sales,
        }
    }

    /// Cell values in column order, written with `valueInputOption=RAW`: the
    /// date and identifier stay text, prices and sales are numbers. Missing
    /// prices become empty cells so they are never confused with a real zero.
    #[must_use]
    pub fn to_cells(&self) -> Vec<Value> {
        vec![
            Value::String(self.date.format(DATE_FORMAT).to_string()),
            Value::String(self.identifier.to_string()),
            price_cell(self.price),
            price_cell(self.final_price),
            Value::from(self.sales),
        ]
    }
}

fn price_cell(price: Option<Decimal>) -> Value {
    let Some(price) = price else {
        return Value::String(String::new());
    };
    let text = price.normalize().to_string();
    match Number::from_str(&text) {
        Ok(n) => Value::Number(n),
        Err(_) => Value::String(text),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
    }

    fn sku() -> Identifier {
        Identifier::parse("111").unwrap()
    }

    #[test]
    fn full_record_renders_all_columns() {
        let record = MetricRecord {
            date: date(),
            price: Some(Decimal::from(100)),
            final_price: Some(Decimal::from_str("89.50").unwrap()),
            sales: 10,
        };
        let row = OutputRow::build(&record, date(), &sku());
        assert_eq!(
            row.to_cells(),
            vec![
                json!("2025-03-02"),
                json!("111"),
                json!(100),
                json!(89.5),
                json!(10)
            ]
        );
    }

    #[test]
    fn missing_prices_are_empty_not_zero() {
        let record = MetricRecord {
            date: date(),
            price: None,
            final_price: None,
            sales: 0,
        };
        let cells = OutputRow::build(&record, date(), &sku()).to_cells();
        assert_eq!(cells[2], json!(""));
        assert_eq!(cells[3], json!(""));
        assert_eq!(cells[4], json!(0));
    }

    #[test]
    fn negative_delta_sales_are_kept() {
        let record = MetricRecord {
            date: date(),
            price: None,
            final_price: None,
            sales: -30,
        };
        let row = OutputRow::build(&record, date(), &sku());
        assert_eq!(row.to_cells()[4], json!(-30));
    }

    #[test]
    fn row_date_comes_from_caller() {
        let other = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let record = MetricRecord {
            date: other,
            price: None,
            final_price: None,
            sales: 1,
        };
        assert_eq!(OutputRow::build(&record, date(), &sku()).date, date());
    }
}
