//! Header row detection over an unstructured grid.
//!
//! A row is scored by how many keywords of a table's [`KeywordSet`] occur as
//! substrings of its lowercased, space-joined non-empty cells. Two policies
//! decide which scoring row starts a table:
//!
//! - [`HeaderPolicy::Flexible`]: the first row reaching the threshold is the
//!   column-label row.
//! - [`HeaderPolicy::StrictPair`]: a row carrying the section's discriminating
//!   literal starts the table only if the *next* row passes the keyword check
//!   and its first label names the expected first column. The exporter writes
//!   the section title one row above the labels.

use crate::domain::grid::{Cell, Grid};
use std::str::FromStr;
use tracing::{debug, info};

pub const DEFAULT_HEADER_THRESHOLD: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderPolicy {
    #[default]
    Flexible,
    StrictPair,
}

impl FromStr for HeaderPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flexible" => Ok(HeaderPolicy::Flexible),
            "strict" | "strict_pair" | "strict-pair" => Ok(HeaderPolicy::StrictPair),
            other => Err(format!("unknown header mode '{other}'")),
        }
    }
}

/// Keyword vocabulary for one logical table.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordSet {
    pub keywords: Vec<String>,
    /// At least one of these must occur; empty means no requirement.
    pub required: Vec<String>,
    /// A row containing any of these is never this table's header.
    pub excluded: Vec<String>,
    pub threshold: usize,
}

impl KeywordSet {
    pub fn new(keywords: &[&str], required: &[&str]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            required: required.iter().map(|k| k.to_lowercase()).collect(),
            excluded: Vec::new(),
            threshold: DEFAULT_HEADER_THRESHOLD,
        }
    }

    pub fn with_excluded(mut self, excluded: &[&str]) -> Self {
        self.excluded = excluded.iter().map(|k| k.to_lowercase()).collect();
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    /// Number of distinct keywords found in `row_text` (already lowercased).
    pub fn score(&self, row_text: &str) -> usize {
        self.keywords
            .iter()
            .filter(|k| row_text.contains(k.as_str()))
            .count()
    }

    pub fn matches(&self, row_text: &str) -> bool {
        let required_ok =
            self.required.is_empty() || self.required.iter().any(|r| row_text.contains(r.as_str()));
        let excluded = self.excluded.iter().any(|e| row_text.contains(e.as_str()));
        required_ok && !excluded && self.score(row_text) >= self.threshold
    }
}

/// Literals used by the strict-pair policy.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMarker {
    /// Text of the section title row (e.g. "orders").
    pub section_literals: Vec<String>,
    /// Expected text of the first column label on the following row.
    pub first_column_literals: Vec<String>,
}

impl SectionMarker {
    pub fn new(section: &[&str], first_column: &[&str]) -> Self {
        Self {
            section_literals: section.iter().map(|s| s.to_lowercase()).collect(),
            first_column_literals: first_column.iter().map(|s| s.to_lowercase()).collect(),
        }
    }
}

/// Where a logical table lives inside the grid.
///
/// Invariant: `start_row <= header_row < first_data_row <= end_row`.
/// `end_row` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableBoundary {
    pub start_row: usize,
    pub header_row: usize,
    pub first_data_row: usize,
    pub end_row: usize,
}

impl TableBoundary {
    pub fn new(start_row: usize, header_row: usize, end_row: usize) -> Self {
        let first_data_row = header_row + 1;
        let end_row = end_row.max(first_data_row);
        debug_assert!(start_row <= header_row);
        Self {
            start_row,
            header_row,
            first_data_row,
            end_row,
        }
    }

    pub fn data_rows(&self) -> std::ops::Range<usize> {
        self.first_data_row..self.end_row
    }
}

/// Start of a table before its end is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMatch {
    pub start_row: usize,
    pub header_row: usize,
}

/// Lowercased, space-joined text of a row's non-empty cells.
pub fn row_text(row: &[Cell]) -> String {
    row.iter()
        .filter_map(Cell::display_text)
        .map(|s| s.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_label(row: &[Cell]) -> Option<String> {
    row.iter()
        .find_map(Cell::display_text)
        .map(|s| s.trim().to_lowercase())
}

/// Scans for the first qualifying header at or after `from_row`.
pub fn find_header(
    grid: &Grid,
    keywords: &KeywordSet,
    marker: &SectionMarker,
    policy: HeaderPolicy,
    from_row: usize,
) -> Option<HeaderMatch> {
    for r in from_row..grid.row_count() {
        let row = grid.row(r)?;
        match policy {
            HeaderPolicy::Flexible => {
                if keywords.matches(&row_text(row)) {
                    return Some(HeaderMatch {
                        start_row: r,
                        header_row: r,
                    });
                }
            }
            HeaderPolicy::StrictPair => {
                let text = row_text(row);
                if !marker
                    .section_literals
                    .iter()
                    .any(|lit| text.contains(lit.as_str()))
                {
                    continue;
                }
                let Some(next) = grid.row(r + 1) else {
                    continue;
                };
                if confirms_header(next, keywords, marker) {
                    return Some(HeaderMatch {
                        start_row: r,
                        header_row: r + 1,
                    });
                }
                debug!(row = r + 1, "section literal without a confirming label row");
            }
        }
    }
    None
}

fn confirms_header(row: &[Cell], keywords: &KeywordSet, marker: &SectionMarker) -> bool {
    let first_ok = first_label(row).is_some_and(|label| {
        marker
            .first_column_literals
            .iter()
            .any(|lit| label.contains(lit.as_str()))
    });
    first_ok && keywords.matches(&row_text(row))
}

/// Detection inputs for the two tables of a report.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    pub name: &'static str,
    pub keywords: KeywordSet,
    pub marker: SectionMarker,
}

/// Orders and deals boundaries of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportLayout {
    pub orders: Option<TableBoundary>,
    pub deals: Option<TableBoundary>,
}

/// Locates the orders section, then the deals section below it.
///
/// The deals scan starts after the orders header so a shared vocabulary
/// cannot make both sections resolve to the same row. Orders end where the
/// deals section starts.
pub fn locate_sections(
    grid: &Grid,
    orders: &SectionSpec,
    deals: &SectionSpec,
    policy: HeaderPolicy,
) -> ReportLayout {
    let orders_match = find_header(grid, &orders.keywords, &orders.marker, policy, 0);
    let deals_from = orders_match.map(|m| m.header_row + 1).unwrap_or(0);
    let deals_match = find_header(grid, &deals.keywords, &deals.marker, policy, deals_from);

    if let Some(m) = orders_match {
        info!(table = orders.name, row = m.header_row + 1, "found header row");
    }
    if let Some(m) = deals_match {
        info!(table = deals.name, row = m.header_row + 1, "found header row");
    }

    let total = grid.row_count();
    let orders_boundary = orders_match.map(|m| {
        let end = deals_match
            .filter(|d| d.start_row > m.header_row)
            .map(|d| d.start_row)
            .unwrap_or(total);
        TableBoundary::new(m.start_row, m.header_row, end)
    });
    let deals_boundary = deals_match.map(|m| TableBoundary::new(m.start_row, m.header_row, total));

    ReportLayout {
        orders: orders_boundary,
        deals: deals_boundary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<Cell> {
        cells
            .iter()
            .map(|c| if c.is_empty() { Cell::Empty } else { Cell::from(*c) })
            .collect()
    }

    fn order_keywords() -> KeywordSet {
        KeywordSet::new(&["order", "time", "type", "volume", "price"], &["order"])
    }

    fn deal_keywords() -> KeywordSet {
        KeywordSet::new(&["deal", "order", "time", "type", "profit"], &["deal"])
    }

    fn orders_spec() -> SectionSpec {
        SectionSpec {
            name: "orders",
            keywords: order_keywords(),
            marker: SectionMarker::new(&["orders"], &["open time"]),
        }
    }

    fn deals_spec() -> SectionSpec {
        SectionSpec {
            name: "deals",
            keywords: deal_keywords(),
            marker: SectionMarker::new(&["deals"], &["time"]),
        }
    }

    fn sample_grid() -> Grid {
        Grid::new(vec![
            text_row(&["Strategy Tester Report"]),
            text_row(&["Orders"]),
            text_row(&["Open Time", "Order", "Symbol", "Type", "Volume", "Price"]),
            text_row(&["2024.01.01 10:00:00", "100", "EURUSD", "buy", "0.1", "1.1"]),
            text_row(&[""]),
            text_row(&["Deals"]),
            text_row(&["Time", "Deal", "Symbol", "Type", "Order", "Profit"]),
            text_row(&["2024.01.01 10:00:00", "2", "EURUSD", "buy", "100", "0"]),
        ])
    }

    #[test]
    fn score_counts_distinct_keywords() {
        let ks = order_keywords();
        assert_eq!(ks.score("open time order symbol type"), 3);
        assert_eq!(ks.score("nothing here"), 0);
    }

    #[test]
    fn required_literal_gates_a_match() {
        let ks = deal_keywords();
        assert!(!ks.matches("open time order type volume"));
        assert!(ks.matches("time deal type order"));
    }

    #[test]
    fn excluded_literal_vetoes_a_match() {
        let ks = order_keywords().with_excluded(&["deal"]);
        assert!(ks.matches("open time order type volume price"));
        assert!(!ks.matches("time deal symbol type volume price order"));
    }

    #[test]
    fn threshold_is_configurable() {
        let ks = order_keywords().with_threshold(5);
        assert!(!ks.matches("order time type volume"));
        assert!(ks.matches("order time type volume price"));
    }

    #[test]
    fn row_text_skips_empty_and_lowercases() {
        let row = vec![Cell::from("Open Time"), Cell::Empty, Cell::Number(5.0)];
        assert_eq!(row_text(&row), "open time 5");
    }

    #[test]
    fn flexible_mode_uses_label_row() {
        let layout = locate_sections(
            &sample_grid(),
            &orders_spec(),
            &deals_spec(),
            HeaderPolicy::Flexible,
        );
        let orders = layout.orders.unwrap();
        let deals = layout.deals.unwrap();
        assert_eq!(orders.header_row, 2);
        assert_eq!(orders.start_row, 2);
        assert_eq!(deals.header_row, 6);
        assert_eq!(orders.end_row, 6);
        assert_eq!(deals.end_row, 8);
        assert!(orders.header_row < deals.header_row);
    }

    #[test]
    fn strict_mode_pairs_title_with_label_row() {
        let layout = locate_sections(
            &sample_grid(),
            &orders_spec(),
            &deals_spec(),
            HeaderPolicy::StrictPair,
        );
        let orders = layout.orders.unwrap();
        let deals = layout.deals.unwrap();
        assert_eq!((orders.start_row, orders.header_row), (1, 2));
        assert_eq!((deals.start_row, deals.header_row), (5, 6));
        assert_eq!(orders.end_row, 5);
        assert_eq!(orders.first_data_row, 3);
    }

    #[test]
    fn strict_mode_rejects_title_without_label_row() {
        let grid = Grid::new(vec![
            text_row(&["Orders"]),
            text_row(&["2024.01.01 10:00:00", "100", "EURUSD"]),
        ]);
        let found = find_header(
            &grid,
            &order_keywords(),
            &orders_spec().marker,
            HeaderPolicy::StrictPair,
            0,
        );
        assert!(found.is_none());
    }

    #[test]
    fn missing_orders_header_leaves_boundary_undefined() {
        let grid = Grid::new(vec![text_row(&["nothing", "to", "see"])]);
        let layout = locate_sections(&grid, &orders_spec(), &deals_spec(), HeaderPolicy::Flexible);
        assert_eq!(layout, ReportLayout::default());
    }

    #[test]
    fn deals_missing_keeps_orders_to_end_of_grid() {
        let grid = Grid::new(vec![
            text_row(&["Open Time", "Order", "Symbol", "Type", "Volume", "Price"]),
            text_row(&["2024.01.01 10:00:00", "100", "EURUSD", "buy", "0.1", "1.1"]),
        ]);
        let layout = locate_sections(&grid, &orders_spec(), &deals_spec(), HeaderPolicy::Flexible);
        assert!(layout.deals.is_none());
        assert_eq!(layout.orders.unwrap().end_row, 2);
    }

    #[test]
    fn boundary_invariant_holds_for_trailing_header() {
        let b = TableBoundary::new(4, 4, 5);
        assert!(b.start_row <= b.header_row);
        assert!(b.header_row < b.first_data_row);
        assert!(b.first_data_row <= b.end_row);
        assert!(b.data_rows().is_empty());
    }

    #[test]
    fn policy_parses_from_config_text() {
        assert_eq!("Flexible".parse::<HeaderPolicy>(), Ok(HeaderPolicy::Flexible));
        assert_eq!("strict".parse::<HeaderPolicy>(), Ok(HeaderPolicy::StrictPair));
        assert!("fuzzy".parse::<HeaderPolicy>().is_err());
    }
}
