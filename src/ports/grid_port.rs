//! Report grid source port trait.

use crate::domain::error::ReconError;
use crate::domain::grid::Grid;
use std::path::Path;

/// Decodes a report export into a fully materialized [`Grid`].
pub trait GridPort {
    fn read_grid(&self, path: &Path) -> Result<Grid, ReconError>;
}
