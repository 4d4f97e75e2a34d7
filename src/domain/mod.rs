//! Core domain types and logic.

pub mod error;
pub mod grid;
pub mod field;
pub mod coerce;
pub mod header_locator;
pub mod column_mapper;
pub mod dialect;
pub mod tabular;
pub mod extractor;
pub mod order;
pub mod deal;
pub mod segment;
pub mod summary;
pub mod report;
pub mod reconcile;
pub mod settings;
pub mod config_validation;
