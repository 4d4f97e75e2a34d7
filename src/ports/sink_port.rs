//! Flat-file sink port trait.

use crate::domain::error::ReconError;
use crate::domain::tabular::Tabular;
use std::path::PathBuf;

pub trait SinkPort {
    /// Writes one relation and returns where it went.
    fn write_table(
        &self,
        name: &str,
        columns: &[&str],
        rows: &[Vec<String>],
    ) -> Result<PathBuf, ReconError>;
}

/// Renders `records` through [`Tabular`] and hands them to `sink`.
pub fn write_relation<T: Tabular>(
    sink: &dyn SinkPort,
    records: &[T],
) -> Result<PathBuf, ReconError> {
    let rows: Vec<Vec<String>> = records.iter().map(Tabular::row).collect();
    sink.write_table(T::NAME, T::columns(), &rows)
}
