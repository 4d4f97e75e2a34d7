//! Concrete adapter implementations for ports.

#[cfg(feature = "postgres")]
pub mod postgres_adapter;
#[cfg(feature = "sqlite")]
pub mod sqlite_adapter;
pub mod csv_grid_adapter;
pub mod csv_segment_adapter;
pub mod csv_sink_adapter;
pub mod file_config_adapter;
pub mod text_source;
