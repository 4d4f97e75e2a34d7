//! Normalized order records.

use crate::domain::coerce::{to_decimal_or_zero, to_integer, to_text, to_timestamp};
use crate::domain::error::{RowWarning, WarningKind};
use crate::domain::extractor::{FieldRow, Normalize, NormalizeContext};
use crate::domain::field::Field;
use crate::domain::tabular::{Tabular, fmt_timestamp};
use chrono::NaiveDateTime;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRecord {
    pub order_id: i64,
    pub symbol: String,
    pub order_type: String,
    pub volume: f64,
    pub price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_time: NaiveDateTime,
    /// Close or last-modify time.
    pub time: Option<NaiveDateTime>,
    pub status: String,
    pub comment: String,
}

impl Normalize for OrderRecord {
    const TABLE: &'static str = "orders";

    fn normalize(
        row: &FieldRow,
        ctx: &NormalizeContext,
        warnings: &mut Vec<RowWarning>,
    ) -> Option<Self> {
        let Some(order_id) = to_integer(row.get(Field::OrderId)) else {
            let w = RowWarning::new(
                row.source_row,
                WarningKind::MissingIdentifier,
                "order row has no order_id; skipped",
            );
            warn!(row = row.source_row + 1, "{}", w.message);
            warnings.push(w);
            return None;
        };

        // Probable defect kept for compatibility: output depends on run time.
        let open_time = match to_timestamp(row.get(Field::OpenTime)) {
            Some(t) => t,
            None => {
                let w = RowWarning::new(
                    row.source_row,
                    WarningKind::SyntheticTimestamp,
                    format!("order {order_id} has no open time; using processing time"),
                );
                warn!(row = row.source_row + 1, order_id, "synthetic open time");
                warnings.push(w);
                ctx.fallback_time
            }
        };

        Some(OrderRecord {
            order_id,
            symbol: to_text(row.get(Field::Symbol)),
            order_type: to_text(row.get(Field::Type)),
            volume: to_decimal_or_zero(row.get(Field::Volume)),
            price: to_decimal_or_zero(row.get(Field::Price)),
            stop_loss: to_decimal_or_zero(row.get(Field::StopLoss)),
            take_profit: to_decimal_or_zero(row.get(Field::TakeProfit)),
            open_time,
            time: to_timestamp(row.get(Field::Time)),
            status: to_text(row.get(Field::Status)),
            comment: to_text(row.get(Field::Comment)),
        })
    }
}

impl Tabular for OrderRecord {
    const NAME: &'static str = "orders";

    fn columns() -> &'static [&'static str] {
        &[
            "order_id",
            "symbol",
            "type",
            "volume",
            "price",
            "sl",
            "tp",
            "open_time",
            "time",
            "status",
            "comment",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.order_id.to_string(),
            self.symbol.clone(),
            self.order_type.clone(),
            self.volume.to_string(),
            self.price.to_string(),
            self.stop_loss.to_string(),
            self.take_profit.to_string(),
            fmt_timestamp(Some(self.open_time)),
            fmt_timestamp(self.time),
            self.status.clone(),
            self.comment.clone(),
        ]
    }
}
