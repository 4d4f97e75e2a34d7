//! Header label to canonical field mapping.
//!
//! Rules are evaluated top to bottom for each label and the first hit wins,
//! so a specific rule (`开价时间` → `open_time`) must sit above the general
//! one it overlaps (`时间` → `time`). [`RuleTable::new`] keeps that order
//! exactly as given.

use crate::domain::field::Field;
use crate::domain::grid::Cell;

/// Placeholder label for a header cell with no text.
pub fn placeholder_label(column: usize) -> String {
    format!("column_{column}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappingRule {
    pub include: String,
    pub exclude: Option<String>,
    pub field: Field,
}

impl MappingRule {
    pub fn new(include: &str, exclude: Option<&str>, field: Field) -> Self {
        Self {
            include: include.to_lowercase(),
            exclude: exclude.map(str::to_lowercase),
            field,
        }
    }

    /// `label` must already be lowercased.
    pub fn applies_to(&self, label: &str) -> bool {
        label.contains(self.include.as_str())
            && self
                .exclude
                .as_deref()
                .is_none_or(|ex| !label.contains(ex))
    }
}

/// Ordered mapping rules for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    rules: Vec<MappingRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    pub fn map_label(&self, label: &str) -> Option<Field> {
        let label = label.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.applies_to(&label))
            .map(|rule| rule.field)
    }

    pub fn map_labels<S: AsRef<str>>(&self, labels: &[S]) -> ColumnMapping {
        ColumnMapping {
            labels: labels.iter().map(|l| l.as_ref().to_string()).collect(),
            fields: labels.iter().map(|l| self.map_label(l.as_ref())).collect(),
        }
    }
}

/// Positional mapping: column index to canonical field (or unmapped).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnMapping {
    labels: Vec<String>,
    fields: Vec<Option<Field>>,
}

impl ColumnMapping {
    pub fn width(&self) -> usize {
        self.fields.len()
    }

    pub fn field_at(&self, column: usize) -> Option<Field> {
        self.fields.get(column).copied().flatten()
    }

    pub fn label_at(&self, column: usize) -> Option<&str> {
        self.labels.get(column).map(String::as_str)
    }

    /// Columns mapped to `field`, left to right.
    pub fn columns_for(&self, field: Field) -> impl Iterator<Item = usize> + '_ {
        self.fields
            .iter()
            .enumerate()
            .filter(move |(_, f)| **f == Some(field))
            .map(|(i, _)| i)
    }

    pub fn mapped_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.fields.iter().flatten().copied()
    }

    pub fn unmapped_labels(&self) -> Vec<&str> {
        self.fields
            .iter()
            .zip(&self.labels)
            .filter(|(f, _)| f.is_none())
            .map(|(_, l)| l.as_str())
            .collect()
    }
}

/// Header labels of a row, with blank cells replaced by [`placeholder_label`].
pub fn header_labels(row: &[Cell]) -> Vec<String> {
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            cell.display_text()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| placeholder_label(i))
        })
        .collect()
}
