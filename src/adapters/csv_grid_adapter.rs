//! Delimited-text report decoder producing a [`Grid`].

use crate::adapters::text_source::read_text;
use crate::domain::coerce::parse_timestamp;
use crate::domain::error::ReconError;
use crate::domain::grid::{Cell, Grid};
use crate::ports::grid_port::GridPort;
use std::path::Path;
use tracing::info;

pub struct CsvGridAdapter {
    delimiter: u8,
}

impl CsvGridAdapter {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Parses already-decoded text. Row widths may differ.
    pub fn parse(&self, text: &str, source_name: &str) -> Result<Grid, ReconError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| ReconError::SourceFormat {
                source_name: source_name.to_string(),
                reason: format!("CSV parse error: {e}"),
            })?;
            rows.push(record.iter().map(classify).collect());
        }
        Ok(Grid::new(rows))
    }
}

/// Blank, timestamp, finite number, or text, in that order.
pub fn classify(raw: &str) -> Cell {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Cell::Empty;
    }
    if let Some(dt) = parse_timestamp(trimmed) {
        return Cell::DateTime(dt);
    }
    if trimmed.bytes().any(|b| b.is_ascii_digit()) {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
    }
    Cell::Text(trimmed.to_string())
}

impl GridPort for CsvGridAdapter {
    fn read_grid(&self, path: &Path) -> Result<Grid, ReconError> {
        let text = read_text(path)?;
        let grid = self.parse(&text, &path.display().to_string())?;
        info!(path = %path.display(), rows = grid.row_count(), "read report grid");
        Ok(grid)
    }
}
