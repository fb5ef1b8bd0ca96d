//! Running every view and collecting the panel outcomes.
//!
//! A view that fails becomes an unavailable panel; the remaining panels
//! are still computed.

use crate::analysis::AggregationEngine;
use crate::error::Result;
use crate::geo::{GeoSampler, PointSet};
use crate::models::{DashboardReport, PanelOutcome, ReportMetadata};
use tracing::warn;

/// Convert a view result into a panel, logging why a panel is empty.
fn panel<T>(name: &str, result: Result<T>) -> PanelOutcome<T> {
    match result {
        Ok(value) => PanelOutcome::Ready(value),
        Err(e) => {
            warn!("Panel '{}' unavailable: {}", name, e);
            PanelOutcome::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Compute every dashboard panel.
///
/// Returns the report and the map markers, which are kept out of the
/// report itself.
pub fn build_report(
    engine: &AggregationEngine,
    sampler: &GeoSampler,
    metadata: ReportMetadata,
    top_n: usize,
) -> (DashboardReport, PointSet) {
    let points = sampler.plot_points();
    let customer_map = sampler.summarize(&points);

    let report = DashboardReport {
        metadata,
        top_n,
        daily_orders: panel("daily_orders", engine.daily_orders()),
        daily_spend: panel("daily_spend", engine.daily_spend()),
        product_items: panel("product_items", engine.product_item_counts()),
        review_scores: panel("review_scores", engine.review_score_distribution()),
        customer_states: panel("customer_states", engine.state_distribution()),
        order_statuses: panel("order_statuses", engine.order_status_distribution()),
        customer_map,
    };

    (report, points)
}
