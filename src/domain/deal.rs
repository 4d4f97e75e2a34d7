//! Normalized deal (fill) records.

use crate::domain::coerce::{to_decimal_or_zero, to_integer, to_text, to_timestamp};
use crate::domain::error::{RowWarning, WarningKind};
use crate::domain::extractor::{FieldRow, Normalize, NormalizeContext};
use crate::domain::field::Field;
use crate::domain::tabular::{Tabular, fmt_timestamp};
use chrono::NaiveDateTime;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct DealRecord {
    pub deal_id: i64,
    /// 0 when the deal references no order (balance operations).
    pub order_id: i64,
    pub symbol: String,
    pub deal_type: String,
    pub direction: String,
    pub volume: f64,
    pub price: f64,
    pub commission: f64,
    pub swap: f64,
    pub profit: f64,
    pub balance: f64,
    pub time: Option<NaiveDateTime>,
    pub comment: String,
}

impl Normalize for DealRecord {
    const TABLE: &'static str = "deals";

    fn normalize(
        row: &FieldRow,
        _ctx: &NormalizeContext,
        warnings: &mut Vec<RowWarning>,
    ) -> Option<Self> {
        let Some(deal_id) = to_integer(row.get(Field::DealId)) else {
            let w = RowWarning::new(
                row.source_row,
                WarningKind::MissingIdentifier,
                "deal row has no deal_id; skipped",
            );
            warn!(row = row.source_row + 1, "{}", w.message);
            warnings.push(w);
            return None;
        };

        Some(DealRecord {
            deal_id,
            order_id: to_integer(row.get(Field::OrderId)).unwrap_or(0),
            symbol: to_text(row.get(Field::Symbol)),
            deal_type: to_text(row.get(Field::Type)),
            direction: to_text(row.get(Field::Direction)),
            volume: to_decimal_or_zero(row.get(Field::Volume)),
            price: to_decimal_or_zero(row.get(Field::Price)),
            commission: to_decimal_or_zero(row.get(Field::Commission)),
            swap: to_decimal_or_zero(row.get(Field::Swap)),
            profit: to_decimal_or_zero(row.get(Field::Profit)),
            balance: to_decimal_or_zero(row.get(Field::Balance)),
            time: to_timestamp(row.get(Field::Time)),
            comment: to_text(row.get(Field::Comment)),
        })
    }
}

impl Tabular for DealRecord {
    const NAME: &'static str = "deals";

    fn columns() -> &'static [&'static str] {
        &[
            "deal_id",
            "order_id",
            "symbol",
            "type",
            "direction",
            "volume",
            "price",
            "commission",
            "swap",
            "profit",
            "balance",
            "deal_time",
            "comment",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.deal_id.to_string(),
            self.order_id.to_string(),
            self.symbol.clone(),
            self.deal_type.clone(),
            self.direction.clone(),
            self.volume.to_string(),
            self.price.to_string(),
            self.commission.to_string(),
            self.swap.to_string(),
            self.profit.to_string(),
            self.balance.to_string(),
            fmt_timestamp(self.time),
            self.comment.clone(),
        ]
    }
}
