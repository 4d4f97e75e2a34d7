//! Segment annotation reader for the indicator's delimited export.

use crate::adapters::text_source::read_text;
use crate::domain::coerce::{parse_decimal, parse_timestamp};
use crate::domain::error::{ReconError, RowWarning, WarningKind};
use crate::domain::segment::{SegmentBatch, SegmentRecord, SegmentSide};
use crate::ports::segment_port::SegmentPort;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

pub const REQUIRED_COLUMNS: &[&str] = &[
    "OrderTicket",
    "Timeframe",
    "SegmentSide",
    "SegmentIndex",
    "StartPrice",
    "EndPrice",
];

pub struct CsvSegmentAdapter {
    delimiter: u8,
}

/// Column lookup by header name, case-insensitive.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn from_header(header: &csv::StringRecord) -> Self {
        let mut map = HashMap::new();
        for (i, name) in header.iter().enumerate() {
            map.entry(name.trim().to_lowercase()).or_insert(i);
        }
        Columns(map)
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.0.get(&name.to_lowercase()).copied()
    }

    /// Trimmed non-empty value of `name` in `record`.
    fn value<'r>(&self, record: &'r csv::StringRecord, name: &str) -> Option<&'r str> {
        self.index(name)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

fn integer(value: Option<&str>) -> Option<i64> {
    let n = value?.replace(',', "").parse::<f64>().ok()?;
    n.is_finite().then(|| n.trunc() as i64)
}

fn decimal(value: Option<&str>) -> Option<f64> {
    value.and_then(parse_decimal)
}

impl CsvSegmentAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn parse(&self, text: &str, source_name: &str) -> Result<SegmentBatch, ReconError> {
        let source_error = |e: csv::Error| ReconError::SourceFormat {
            source_name: source_name.to_string(),
            reason: format!("CSV parse error: {e}"),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let columns = Columns::from_header(rdr.headers().map_err(source_error)?);
        if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| columns.index(c).is_none()) {
            return Err(ReconError::MissingColumn {
                source_name: source_name.to_string(),
                column: missing.to_string(),
            });
        }

        let mut batch = SegmentBatch::default();
        for (line, result) in rdr.records().enumerate() {
            let record = result.map_err(source_error)?;
            // Line 0 is the header.
            let row = line + 1;
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }

            let Some(order_ticket) = integer(columns.value(&record, "OrderTicket")) else {
                let w = RowWarning::new(
                    row,
                    WarningKind::MissingIdentifier,
                    "segment row has no usable OrderTicket; skipped",
                );
                warn!(source = source_name, row = row + 1, "{}", w.message);
                batch.warnings.push(w);
                continue;
            };

            let text = |name: &str| columns.value(&record, name).map(str::to_string);

            batch.records.push(SegmentRecord {
                trade_time: columns.value(&record, "TradeTime").and_then(parse_timestamp),
                order_ticket,
                position_id: integer(columns.value(&record, "PositionId")).filter(|id| *id > 0),
                reference_price: decimal(columns.value(&record, "ReferencePrice")).unwrap_or(0.0),
                reference_time: columns.value(&record, "ReferenceTime").and_then(parse_timestamp),
                reference_bar_index: integer(columns.value(&record, "ReferenceBarIndex")).unwrap_or(0),
                timeframe: text("Timeframe").unwrap_or_default(),
                segment_side: SegmentSide::parse(columns.value(&record, "SegmentSide").unwrap_or("")),
                segment_index: integer(columns.value(&record, "SegmentIndex")).unwrap_or(0),
                start_price: decimal(columns.value(&record, "StartPrice")).unwrap_or(0.0),
                end_price: decimal(columns.value(&record, "EndPrice")).unwrap_or(0.0),
                amplitude: decimal(columns.value(&record, "Amplitude")).unwrap_or(0.0),
                direction: text("Direction").unwrap_or_default(),
                trade_action: text("TradeAction"),
                trade_price: decimal(columns.value(&record, "TradePrice")),
                trade_volume: decimal(columns.value(&record, "TradeVolume")),
                trade_comment: text("TradeComment"),
                trade_status: text("TradeStatus"),
            });
        }

        Ok(batch)
    }
}

impl SegmentPort for CsvSegmentAdapter {
    fn read_segments(&self, path: &Path) -> Result<SegmentBatch, ReconError> {
        let text = read_text(path)?;
        let batch = self.parse(&text, &path.display().to_string())?;
        info!(
            path = %path.display(),
            segments = batch.records.len(),
            skipped = batch.warnings.len(),
            "read segments"
        );
        Ok(batch)
    }
}
