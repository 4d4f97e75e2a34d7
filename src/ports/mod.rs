//! Port traits at the I/O seams.

pub mod config_port;
pub mod grid_port;
pub mod segment_port;
pub mod sink_port;
pub mod store_port;
