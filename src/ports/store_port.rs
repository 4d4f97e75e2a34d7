//! Destination store port trait.
//!
//! Every write is atomic per relation: either all rows land or none do.

use crate::domain::deal::DealRecord;
use crate::domain::error::ReconError;
use crate::domain::order::OrderRecord;
use crate::domain::segment::SegmentRecord;
use crate::domain::summary::SummaryRecord;

pub trait StorePort {
    fn initialize_schema(&self) -> Result<(), ReconError>;

    /// Inserts, or updates every non-key column of an existing `order_id`.
    fn upsert_orders(&self, orders: &[OrderRecord]) -> Result<usize, ReconError>;

    /// Inserts, or updates every non-key column of an existing `deal_id`.
    fn upsert_deals(&self, deals: &[DealRecord]) -> Result<usize, ReconError>;

    /// Clears and refills the segment table in one transaction.
    fn replace_segments(&self, segments: &[SegmentRecord]) -> Result<usize, ReconError>;

    /// Clears and refills the summary table in one transaction.
    fn replace_summary(&self, summary: &[SummaryRecord]) -> Result<usize, ReconError>;

    fn load_orders(&self) -> Result<Vec<OrderRecord>, ReconError>;
    fn load_deals(&self) -> Result<Vec<DealRecord>, ReconError>;
    fn load_segments(&self) -> Result<Vec<SegmentRecord>, ReconError>;
    fn load_summary(&self) -> Result<Vec<SummaryRecord>, ReconError>;
}
