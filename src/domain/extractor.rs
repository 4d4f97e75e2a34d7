//! Row extraction and normalization for one located table.
//!
//! Rows between the header and the table end are filtered for sparsity,
//! width-reconciled against the column mapping, projected onto the table's
//! canonical fields, and handed to a [`Normalize`] implementation that builds
//! the typed record.

use crate::domain::column_mapper::{ColumnMapping, header_labels};
use crate::domain::dialect::TableDialect;
use crate::domain::error::{RowWarning, WarningKind};
use crate::domain::field::Field;
use crate::domain::grid::{Cell, Grid, non_empty_count};
use crate::domain::header_locator::TableBoundary;
use chrono::NaiveDateTime;
use tracing::{debug, info};

/// Rows with fewer non-empty cells than this are separator rows.
pub const DEFAULT_MIN_NON_EMPTY: usize = 2;

static EMPTY: Cell = Cell::Empty;

/// One accepted data row projected onto a table's canonical fields.
///
/// Holds exactly one value per schema field, in schema order, whatever the
/// width of the raw row was.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    /// Zero-based grid row the values came from.
    pub source_row: usize,
    values: Vec<(Field, Cell)>,
}

impl FieldRow {
    /// Builds a row over `schema`; fields missing from `pairs` are empty and
    /// the first pair for a field wins.
    pub fn from_pairs(source_row: usize, schema: &[Field], pairs: Vec<(Field, Cell)>) -> Self {
        let values = schema
            .iter()
            .map(|field| {
                let cell = pairs
                    .iter()
                    .find(|(f, c)| f == field && c.is_present())
                    .map(|(_, c)| c.clone())
                    .unwrap_or_default();
                (*field, cell)
            })
            .collect();
        Self { source_row, values }
    }

    pub fn get(&self, field: Field) -> &Cell {
        self.values
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, c)| c)
            .unwrap_or(&EMPTY)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.values.iter().map(|(f, _)| *f)
    }
}

/// Pads with empty cells or truncates so the row is exactly `width` wide.
pub fn reconcile_width(row: &[Cell], width: usize) -> Vec<Cell> {
    let mut cells: Vec<Cell> = row.iter().take(width).cloned().collect();
    cells.resize(width, Cell::Empty);
    cells
}

/// Projects one raw row onto `schema` through `mapping`.
///
/// A field mapped by several columns takes the first present cell.
pub fn project_row(
    source_row: usize,
    row: &[Cell],
    mapping: &ColumnMapping,
    schema: &[Field],
) -> FieldRow {
    let cells = reconcile_width(row, mapping.width());
    let pairs = cells
        .into_iter()
        .enumerate()
        .filter_map(|(i, cell)| mapping.field_at(i).map(|f| (f, cell)))
        .collect();
    FieldRow::from_pairs(source_row, schema, pairs)
}

/// Accepted rows of a located table, before typing.
pub fn extract_rows(
    grid: &Grid,
    boundary: &TableBoundary,
    mapping: &ColumnMapping,
    schema: &[Field],
    min_non_empty: usize,
) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    for r in boundary.data_rows() {
        let Some(raw) = grid.row(r) else { break };
        if non_empty_count(raw) < min_non_empty {
            debug!(row = r + 1, "skipping sparse row");
            continue;
        }
        rows.push(project_row(r, raw, mapping, schema));
    }
    rows
}

/// Inputs the normalizers may need beyond the row itself.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext {
    /// Substituted for an order's missing open time.
    pub fallback_time: NaiveDateTime,
}

/// Typed record built from a [`FieldRow`].
pub trait Normalize: Sized {
    const TABLE: &'static str;

    /// Returns `None` (after recording a warning) when the row must be dropped.
    fn normalize(
        row: &FieldRow,
        ctx: &NormalizeContext,
        warnings: &mut Vec<RowWarning>,
    ) -> Option<Self>;
}

/// Records of one table plus every row-level problem met on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub records: Vec<T>,
    pub warnings: Vec<RowWarning>,
    pub mapping: ColumnMapping,
}

impl<T> Extraction<T> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Maps the header at `boundary`, then extracts and normalizes the data rows.
pub fn extract_table<T: Normalize>(
    grid: &Grid,
    boundary: &TableBoundary,
    dialect: &TableDialect,
    min_non_empty: usize,
    ctx: &NormalizeContext,
) -> Extraction<T> {
    let labels = grid.row(boundary.header_row).map(header_labels).unwrap_or_default();
    let mapping = dialect.rules.map_labels(&labels);
    let unmapped = mapping.unmapped_labels();
    if !unmapped.is_empty() {
        debug!(table = T::TABLE, ?unmapped, "header labels without a field");
    }

    let rows = extract_rows(grid, boundary, &mapping, dialect.schema, min_non_empty);
    let mut warnings = Vec::new();
    let records: Vec<T> = rows
        .iter()
        .filter_map(|row| T::normalize(row, ctx, &mut warnings))
        .collect();

    info!(
        table = T::TABLE,
        records = records.len(),
        skipped = warnings
            .iter()
            .filter(|w| w.kind == WarningKind::MissingIdentifier)
            .count(),
        "extracted table"
    );

    Extraction {
        records,
        warnings,
        mapping,
    }
}
