//! Segment annotation source port trait.

use crate::domain::error::ReconError;
use crate::domain::segment::SegmentBatch;
use std::path::Path;

pub trait SegmentPort {
    /// Reads every segment row. Unusable rows become warnings in the batch.
    fn read_segments(&self, path: &Path) -> Result<SegmentBatch, ReconError>;
}
