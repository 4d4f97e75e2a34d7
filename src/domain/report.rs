//! Whole-report extraction: locate both sections, then extract each.

use crate::domain::deal::DealRecord;
use crate::domain::dialect::{TableDialect, deals_dialect, orders_dialect};
use crate::domain::error::{ReconError, RowWarning};
use crate::domain::extractor::{Extraction, NormalizeContext, extract_table};
use crate::domain::grid::Grid;
use crate::domain::header_locator::{ReportLayout, locate_sections};
use crate::domain::order::OrderRecord;
use crate::domain::settings::ExtractSettings;
use tracing::warn;

/// Result of one extraction pass. A `None` table had no header.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportExtraction {
    pub layout: ReportLayout,
    pub orders: Option<Extraction<OrderRecord>>,
    pub deals: Option<Extraction<DealRecord>>,
}

impl ReportExtraction {
    pub fn orders(&self) -> &[OrderRecord] {
        self.orders.as_ref().map(|e| e.records.as_slice()).unwrap_or(&[])
    }

    pub fn deals(&self) -> &[DealRecord] {
        self.deals.as_ref().map(|e| e.records.as_slice()).unwrap_or(&[])
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RowWarning> {
        let orders = self.orders.iter().flat_map(|e| e.warnings.iter());
        let deals = self.deals.iter().flat_map(|e| e.warnings.iter());
        orders.chain(deals)
    }

    /// Turns a missing orders section into an error for callers that need it.
    pub fn require_orders(&self) -> Result<&[OrderRecord], ReconError> {
        match &self.orders {
            Some(e) => Ok(&e.records),
            None => Err(ReconError::HeaderNotFound {
                table: "orders".to_string(),
            }),
        }
    }
}

/// Dialect pair with the configured threshold applied.
pub fn dialects(settings: &ExtractSettings) -> (TableDialect, TableDialect) {
    (
        orders_dialect().with_threshold(settings.threshold),
        deals_dialect().with_threshold(settings.threshold),
    )
}

pub fn extract_report(
    grid: &Grid,
    settings: &ExtractSettings,
    ctx: &NormalizeContext,
) -> ReportExtraction {
    let (orders_dialect, deals_dialect) = dialects(settings);
    let layout = locate_sections(
        grid,
        &orders_dialect.section,
        &deals_dialect.section,
        settings.policy,
    );

    let orders = match &layout.orders {
        Some(boundary) => Some(extract_table::<OrderRecord>(
            grid,
            boundary,
            &orders_dialect,
            settings.min_non_empty,
            ctx,
        )),
        None => {
            warn!("no orders header found; orders not extracted");
            None
        }
    };

    let deals = match &layout.deals {
        Some(boundary) => Some(extract_table::<DealRecord>(
            grid,
            boundary,
            &deals_dialect,
            settings.min_non_empty,
            ctx,
        )),
        None => {
            warn!("no deals header found; deals not extracted");
            None
        }
    };

    ReportExtraction {
        layout,
        orders,
        deals,
    }
}
