//! Price-swing segment annotations keyed by order ticket.

use crate::domain::error::RowWarning;
use crate::domain::tabular::{Tabular, fmt_opt, fmt_timestamp};
use chrono::NaiveDateTime;
use std::fmt;

/// Side of the reference point a segment lies on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SegmentSide {
    Left,
    /// Chronologically after the reference point.
    Right,
    Other(String),
    #[default]
    Unknown,
}

impl SegmentSide {
    /// Exact match on `Left`/`Right` after trimming; other spellings are kept as `Other`.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "" => SegmentSide::Unknown,
            "Left" => SegmentSide::Left,
            "Right" => SegmentSide::Right,
            other => SegmentSide::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SegmentSide::Left => "Left",
            SegmentSide::Right => "Right",
            SegmentSide::Other(s) => s,
            SegmentSide::Unknown => "",
        }
    }
}

impl fmt::Display for SegmentSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentRecord {
    pub trade_time: Option<NaiveDateTime>,
    pub order_ticket: i64,
    /// `None` when the source had no id or a non-positive one.
    pub position_id: Option<i64>,
    pub reference_price: f64,
    pub reference_time: Option<NaiveDateTime>,
    pub reference_bar_index: i64,
    pub timeframe: String,
    pub segment_side: SegmentSide,
    pub segment_index: i64,
    pub start_price: f64,
    pub end_price: f64,
    pub amplitude: f64,
    pub direction: String,
    pub trade_action: Option<String>,
    pub trade_price: Option<f64>,
    pub trade_volume: Option<f64>,
    pub trade_comment: Option<String>,
    pub trade_status: Option<String>,
}

impl SegmentRecord {
    pub fn is_right(&self) -> bool {
        self.segment_side == SegmentSide::Right
    }

    pub fn length(&self) -> f64 {
        (self.end_price - self.start_price).abs()
    }
}

/// Segments read from one source, plus the rows that could not be used.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentBatch {
    pub records: Vec<SegmentRecord>,
    pub warnings: Vec<RowWarning>,
}

impl Tabular for SegmentRecord {
    const NAME: &'static str = "segments";

    fn columns() -> &'static [&'static str] {
        &[
            "trade_time",
            "order_ticket",
            "position_id",
            "reference_price",
            "reference_time",
            "reference_bar_index",
            "timeframe",
            "segment_side",
            "segment_index",
            "start_price",
            "end_price",
            "amplitude",
            "direction",
            "trade_action",
            "trade_price",
            "trade_volume",
            "trade_comment",
            "trade_status",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            fmt_timestamp(self.trade_time),
            self.order_ticket.to_string(),
            fmt_opt(self.position_id),
            self.reference_price.to_string(),
            fmt_timestamp(self.reference_time),
            self.reference_bar_index.to_string(),
            self.timeframe.clone(),
            self.segment_side.to_string(),
            self.segment_index.to_string(),
            self.start_price.to_string(),
            self.end_price.to_string(),
            self.amplitude.to_string(),
            self.direction.clone(),
            fmt_opt(self.trade_action.as_deref()),
            fmt_opt(self.trade_price),
            fmt_opt(self.trade_volume),
            fmt_opt(self.trade_comment.as_deref()),
            fmt_opt(self.trade_status.as_deref()),
        ]
    }
}
