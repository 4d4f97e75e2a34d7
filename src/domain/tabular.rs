//! Flat row rendering shared by the file sink and tests.

use chrono::NaiveDateTime;

pub const TIMESTAMP_OUTPUT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A record with a fixed, named column list.
pub trait Tabular {
    /// Relation name, also used as the default file stem.
    const NAME: &'static str;

    fn columns() -> &'static [&'static str];

    /// One rendered value per entry of [`Tabular::columns`].
    fn row(&self) -> Vec<String>;
}

pub fn fmt_timestamp(value: Option<NaiveDateTime>) -> String {
    value
        .map(|dt| dt.format(TIMESTAMP_OUTPUT_FORMAT).to_string())
        .unwrap_or_default()
}

pub fn fmt_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
