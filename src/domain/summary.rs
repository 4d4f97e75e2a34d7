//! Denormalized per-position summary rows.

use crate::domain::tabular::{Tabular, fmt_opt, fmt_timestamp};
use chrono::NaiveDateTime;

/// Right-side segment features of one leg.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LegFeatures {
    pub right_5min: u32,
    pub right_15min: u32,
    pub right_30min: u32,
    /// Length of the Right segment with the smallest index, rounded to cents.
    pub first_segment_length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub order_id: i64,
    /// `None` for orders no segment tied to a position.
    pub position_id: Option<i64>,
    pub symbol: String,
    pub order_type: String,
    pub volume: f64,
    pub open_price: f64,
    pub close_price: Option<f64>,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub open_time: NaiveDateTime,
    pub close_time: Option<NaiveDateTime>,
    pub status: String,
    pub commission: f64,
    pub swap: f64,
    pub profit: f64,
    pub comment: String,
    /// Unmatched orders only.
    pub both: LegFeatures,
    pub entry: LegFeatures,
    pub exit: LegFeatures,
}

impl Tabular for SummaryRecord {
    const NAME: &'static str = "trade_summary";

    fn columns() -> &'static [&'static str] {
        &[
            "order_id",
            "position_id",
            "symbol",
            "order_type",
            "volume",
            "open_price",
            "close_price",
            "sl",
            "tp",
            "open_time",
            "close_time",
            "status",
            "commission",
            "swap",
            "profit",
            "comment",
            "right_segments_5min",
            "right_segments_15min",
            "right_segments_30min",
            "first_segment_length",
            "entry_right_segments_5min",
            "entry_right_segments_15min",
            "entry_right_segments_30min",
            "exit_right_segments_5min",
            "exit_right_segments_15min",
            "exit_right_segments_30min",
            "entry_first_segment_length",
            "exit_first_segment_length",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.order_id.to_string(),
            fmt_opt(self.position_id),
            self.symbol.clone(),
            self.order_type.clone(),
            self.volume.to_string(),
            self.open_price.to_string(),
            fmt_opt(self.close_price),
            self.stop_loss.to_string(),
            self.take_profit.to_string(),
            fmt_timestamp(Some(self.open_time)),
            fmt_timestamp(self.close_time),
            self.status.clone(),
            self.commission.to_string(),
            self.swap.to_string(),
            self.profit.to_string(),
            self.comment.clone(),
            self.both.right_5min.to_string(),
            self.both.right_15min.to_string(),
            self.both.right_30min.to_string(),
            fmt_opt(self.both.first_segment_length),
            self.entry.right_5min.to_string(),
            self.entry.right_15min.to_string(),
            self.entry.right_30min.to_string(),
            self.exit.right_5min.to_string(),
            self.exit.right_15min.to_string(),
            self.exit.right_30min.to_string(),
            fmt_opt(self.entry.first_segment_length),
            fmt_opt(self.exit.first_segment_length),
        ]
    }
}
