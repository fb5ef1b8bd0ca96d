//! Markdown and JSON report generation.
//!
//! This module renders a [`DashboardReport`] panel by panel. A panel
//! without data becomes a placeholder line instead of a table.

use crate::geo::PointSet;
use crate::models::{
    CustomerSpendSummary, DailyOrderSummary, DashboardReport, Distribution, OrderStatusDistribution,
    PanelOutcome, ProductItemSummary, ProductRanking, ReportMetadata, ReviewScoreDistribution,
    StateDistribution, TimeSeries,
};
use anyhow::Result;
use std::fmt::Display;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# E-Commerce Dashboard Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_table_of_contents());

    output.push_str(&panel_section(
        "Daily Orders",
        &report.daily_orders,
        generate_daily_orders_section,
    ));
    output.push_str(&panel_section(
        "Customer Spend",
        &report.daily_spend,
        generate_spend_section,
    ));
    output.push_str(&panel_section("Order Items", &report.product_items, |ranking| {
        generate_items_section(ranking, report.top_n)
    }));
    output.push_str(&panel_section(
        "Review Scores",
        &report.review_scores,
        generate_review_section,
    ));
    output.push_str(&panel_section(
        "Customer Demographics",
        &report.customer_states,
        generate_states_section,
    ));
    output.push_str(&panel_section(
        "Order Status",
        &report.order_statuses,
        generate_status_section,
    ));

    output.push_str("## Customer Map\n\n");
    output.push_str(&format!("- **Base Map:** {}\n", report.customer_map.base_image));
    output.push_str(&format!(
        "- **Customers:** {}\n",
        report.customer_map.locations
    ));
    output.push_str(&format!("- **Markers:** {}\n", report.customer_map.plotted));
    if report.customer_map.outside > 0 {
        output.push_str(&format!(
            "- **Outside Map:** {}\n",
            report.customer_map.outside
        ));
    }
    output.push('\n');

    output.push_str(&generate_footer());

    output
}

/// Render a panel heading followed by its body or a placeholder.
fn panel_section<T, F>(title: &str, outcome: &PanelOutcome<T>, body: F) -> String
where
    F: FnOnce(&T) -> String,
{
    let mut section = format!("## {}\n\n", title);
    match outcome {
        PanelOutcome::Ready(value) => section.push_str(&body(value)),
        PanelOutcome::Unavailable { reason } => {
            section.push_str(&format!("*No data in range ({}).*\n\n", reason));
        }
    }
    section
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Orders:** {}\n", metadata.orders_source));
    if let Some(ref locations) = metadata.locations_source {
        section.push_str(&format!("- **Locations:** {}\n", locations));
    }
    section.push_str(&format!(
        "- **Generated:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    match metadata.date_range {
        Some(range) => section.push_str(&format!("- **Date Range:** {}\n", range)),
        None => section.push_str("- **Date Range:** all dates\n"),
    }
    section.push_str(&format!(
        "- **Rows:** {} in range of {} loaded\n",
        metadata.rows_in_range, metadata.rows_loaded
    ));
    section.push_str(&format!(
        "- **Duration:** {:.2}s\n",
        metadata.duration_seconds
    ));
    section.push('\n');

    section
}

fn generate_table_of_contents() -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    for (title, anchor) in [
        ("Daily Orders", "daily-orders"),
        ("Customer Spend", "customer-spend"),
        ("Order Items", "order-items"),
        ("Review Scores", "review-scores"),
        ("Customer Demographics", "customer-demographics"),
        ("Order Status", "order-status"),
        ("Customer Map", "customer-map"),
    ] {
        toc.push_str(&format!("- [{}](#{})\n", title, anchor));
    }
    toc.push('\n');

    toc
}

/// Note how many rows a view left out, if any.
fn exclusion_note(excluded: usize, why: &str) -> String {
    if excluded == 0 {
        return String::new();
    }
    format!("*{} rows excluded from this view ({}).*\n\n", excluded, why)
}

fn generate_daily_orders_section(series: &TimeSeries<DailyOrderSummary>) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Total Orders:** {}\n", series.total_orders()));
    section.push_str(&format!(
        "- **Total Revenue:** {:.2}\n\n",
        series.total_revenue()
    ));
    section.push_str(&exclusion_note(series.excluded_rows, "no approval date"));

    section.push_str("| Date | Orders | Revenue |\n");
    section.push_str("|:---|---:|---:|\n");
    for row in &series.rows {
        section.push_str(&format!(
            "| {} | {} | {:.2} |\n",
            row.date, row.order_count, row.revenue
        ));
    }
    section.push('\n');

    section
}

fn generate_spend_section(series: &TimeSeries<CustomerSpendSummary>) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Total Spend:** {:.2}\n", series.total_spend()));
    section.push_str(&format!(
        "- **Average Daily Spend:** {:.2}\n\n",
        series.mean_spend()
    ));
    section.push_str(&exclusion_note(series.excluded_rows, "no approval date"));

    section.push_str("| Date | Spend |\n");
    section.push_str("|:---|---:|\n");
    for row in &series.rows {
        section.push_str(&format!("| {} | {:.2} |\n", row.date, row.total_spend));
    }
    section.push('\n');

    section
}

fn item_table(title: &str, items: &[ProductItemSummary]) -> String {
    let mut table = format!("### {}\n\n| Category | Items |\n|:---|---:|\n", title);
    for item in items {
        table.push_str(&format!("| {} | {} |\n", item.category, item.product_count));
    }
    table.push('\n');
    table
}

fn generate_items_section(ranking: &ProductRanking, top_n: usize) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Total Items:** {}\n", ranking.total_items()));
    section.push_str(&format!(
        "- **Average Items per Category:** {:.2}\n\n",
        ranking.mean_items()
    ));
    section.push_str(&item_table("Best Sellers", &ranking.top(top_n)));
    section.push_str(&item_table("Worst Sellers", &ranking.bottom(top_n)));

    section
}

/// Table of a distribution in descending count order.
fn distribution_table<K: Ord + Display>(key_header: &str, dist: &Distribution<K>) -> String {
    let mut table = format!("| {} | Count |\n|:---|---:|\n", key_header);
    for (key, count) in dist.ranked() {
        table.push_str(&format!("| {} | {} |\n", key, count));
    }
    table.push('\n');
    table
}

fn generate_review_section(reviews: &ReviewScoreDistribution) -> String {
    let mut section = String::new();

    section.push_str(&format!(
        "- **Average Review Score:** {:.2}\n",
        reviews.mean_score()
    ));
    section.push_str(&format!("- **Most Common Score:** {}\n\n", reviews.mode));
    section.push_str(&exclusion_note(reviews.excluded_rows, "no review score"));

    // Scores read best in rating order rather than by count.
    section.push_str("| Rating | Count |\n|:---|---:|\n");
    for (score, count) in reviews.counts.iter().rev() {
        section.push_str(&format!("| {} | {} |\n", score, count));
    }
    section.push('\n');

    section
}

fn generate_states_section(states: &StateDistribution) -> String {
    let mut section = format!("- **Most Common State:** {}\n\n", states.mode);
    section.push_str(&distribution_table("State", states));
    section
}

fn generate_status_section(statuses: &OrderStatusDistribution) -> String {
    let mut section = format!("- **Most Common Status:** {}\n\n", statuses.mode);
    section.push_str(&distribution_table("Status", statuses));
    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by storefront-analytics*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Serialize map markers for a rendering backend.
pub fn generate_points_json(points: &PointSet) -> Result<String> {
    serde_json::to_string_pretty(points).map_err(Into::into)
}
