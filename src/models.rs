//! Data models for the analytics core.
//!
//! This module contains the input row types, the derived views produced
//! by the aggregation engine, and the dashboard report structure.

use crate::ingest::DateRange;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One order-item-shipment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderFact {
    /// Order identifier. Repeats for orders with several items.
    pub order_id: String,
    /// Customer identifier, when the source carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    /// Approval timestamp. Rows without it are left out of time series.
    pub order_approved_at: Option<NaiveDateTime>,
    /// Item price.
    pub price: f64,
    /// Freight charged for the item.
    pub freight_value: f64,
    /// English category label.
    pub product_category_name_english: Option<String>,
    /// Review score in 1..=5.
    pub review_score: Option<u8>,
    /// Two-letter state code of the customer.
    pub customer_state: String,
    /// Order status, e.g. `delivered`.
    pub order_status: String,
}

impl OrderFact {
    /// Calendar date of approval.
    pub fn approved_date(&self) -> Option<NaiveDate> {
        self.order_approved_at.map(|ts| ts.date())
    }

    /// What the customer paid for this item, freight included.
    pub fn spend(&self) -> f64 {
        self.price + self.freight_value
    }
}

/// One unique customer with a coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerLocation {
    pub customer_unique_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Orders and revenue for one approval date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOrderSummary {
    pub date: NaiveDate,
    pub order_count: usize,
    pub revenue: f64,
}

/// Customer spend (price plus freight) for one approval date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerSpendSummary {
    pub date: NaiveDate,
    pub total_spend: f64,
}

/// Item count for one product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductItemSummary {
    pub category: String,
    pub product_count: usize,
}

/// A date-ordered series plus the number of rows left out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries<T> {
    /// One row per date, ascending.
    pub rows: Vec<T>,
    /// Rows excluded because they had no approval timestamp.
    pub excluded_rows: usize,
}

impl<T> TimeSeries<T> {
    /// Number of dates in the series.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TimeSeries<DailyOrderSummary> {
    /// Sum of `order_count` across all dates.
    pub fn total_orders(&self) -> usize {
        self.rows.iter().map(|r| r.order_count).sum()
    }

    /// Sum of `revenue` across all dates.
    pub fn total_revenue(&self) -> f64 {
        self.rows.iter().map(|r| r.revenue).sum()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

impl TimeSeries<CustomerSpendSummary> {
    /// Sum of `total_spend` across all dates.
    pub fn total_spend(&self) -> f64 {
        self.rows.iter().map(|r| r.total_spend).sum()
    }

    /// Average spend per date.
    pub fn mean_spend(&self) -> f64 {
        if self.rows.is_empty() {
            return 0.0;
        }
        self.total_spend() / self.rows.len() as f64
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.rows.iter().map(|r| r.date).collect()
    }
}

/// Item counts per category, ranked by count.
///
/// `items` is sorted by descending count; equal counts are ordered by
/// category name so that top and bottom selections are reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRanking {
    pub items: Vec<ProductItemSummary>,
}

impl ProductRanking {
    /// Categories with the most items, best first.
    pub fn top(&self, n: usize) -> Vec<ProductItemSummary> {
        self.items.iter().take(n).cloned().collect()
    }

    /// Categories with the fewest items, least first.
    pub fn bottom(&self, n: usize) -> Vec<ProductItemSummary> {
        let mut ascending = self.items.clone();
        ascending.sort_by(|a, b| {
            a.product_count
                .cmp(&b.product_count)
                .then_with(|| a.category.cmp(&b.category))
        });
        ascending.truncate(n);
        ascending
    }

    /// Total number of item rows across categories.
    pub fn total_items(&self) -> usize {
        self.items.iter().map(|i| i.product_count).sum()
    }

    /// Average number of items per category.
    pub fn mean_items(&self) -> f64 {
        if self.items.is_empty() {
            return 0.0;
        }
        self.total_items() as f64 / self.items.len() as f64
    }

    pub fn count_for(&self, category: &str) -> Option<usize> {
        self.items
            .iter()
            .find(|i| i.category == category)
            .map(|i| i.product_count)
    }
}

/// Occurrence counts per key together with the most frequent key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution<K: Ord> {
    /// Counts for every observed key.
    pub counts: BTreeMap<K, usize>,
    /// Key with the highest count; ties go to the smallest key.
    pub mode: K,
    /// Rows excluded because the key was null.
    pub excluded_rows: usize,
}

impl<K: Ord> Distribution<K> {
    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count_of(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Entries ordered by descending count, ties by ascending key.
    pub fn ranked(&self) -> Vec<(&K, usize)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(k, c)| (k, *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries
    }
}

/// Review score (1..=5) to number of reviews.
pub type ReviewScoreDistribution = Distribution<u8>;

/// State code to number of distinct orders.
pub type StateDistribution = Distribution<String>;

/// Order status to number of rows.
pub type OrderStatusDistribution = Distribution<String>;

impl Distribution<u8> {
    /// Average review score over the counted reviews.
    pub fn mean_score(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let weighted: usize = self
            .counts
            .iter()
            .map(|(score, count)| *score as usize * count)
            .sum();
        weighted as f64 / total as f64
    }
}

/// Outcome of one dashboard panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum PanelOutcome<T> {
    /// The view was computed.
    Ready(T),
    /// The view could not be computed; the panel shows a placeholder.
    Unavailable { reason: String },
}

impl<T> PanelOutcome<T> {
    pub fn is_ready(&self) -> bool {
        matches!(self, PanelOutcome::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            PanelOutcome::Ready(value) => Some(value),
            PanelOutcome::Unavailable { .. } => None,
        }
    }
}

/// Marker summary for the customer map panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapSummary {
    /// Base map image URL or path.
    pub base_image: String,
    /// Locations available before sampling.
    pub locations: usize,
    /// Markers inside the bounding box.
    pub plotted: usize,
    /// Sampled locations that fell outside the bounding box.
    pub outside: usize,
}

/// Metadata about a dashboard run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Source of the order table.
    pub orders_source: String,
    /// Source of the location table, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locations_source: Option<String>,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Approval date window applied to the orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Order rows loaded before filtering.
    pub rows_loaded: usize,
    /// Order rows remaining after the date filter.
    pub rows_in_range: usize,
    /// Wall-clock duration in seconds.
    pub duration_seconds: f64,
}

/// All dashboard panels for one filtered dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    /// How many categories the product ranking panels show.
    pub top_n: usize,
    pub daily_orders: PanelOutcome<TimeSeries<DailyOrderSummary>>,
    pub daily_spend: PanelOutcome<TimeSeries<CustomerSpendSummary>>,
    pub product_items: PanelOutcome<ProductRanking>,
    pub review_scores: PanelOutcome<ReviewScoreDistribution>,
    pub customer_states: PanelOutcome<StateDistribution>,
    pub order_statuses: PanelOutcome<OrderStatusDistribution>,
    pub customer_map: MapSummary,
}

impl DashboardReport {
    /// Names of the panels that could not be computed.
    pub fn unavailable_panels(&self) -> Vec<&'static str> {
        let panels = [
            ("daily_orders", self.daily_orders.is_ready()),
            ("daily_spend", self.daily_spend.is_ready()),
            ("product_items", self.product_items.is_ready()),
            ("review_scores", self.review_scores.is_ready()),
            ("customer_states", self.customer_states.is_ready()),
            ("order_statuses", self.order_statuses.is_ready()),
        ];
        panels
            .into_iter()
            .filter(|(_, ready)| !ready)
            .map(|(name, _)| name)
            .collect()
    }
}

impl fmt::Display for MapSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} markers ({} locations, {} outside map)",
            self.plotted, self.locations, self.outside
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn item(category: &str, count: usize) -> ProductItemSummary {
        ProductItemSummary {
            category: category.to_string(),
            product_count: count,
        }
    }

    #[test]
    fn test_order_fact_spend_and_date() {
        let fact = OrderFact {
            order_id: "o1".to_string(),
            customer_id: None,
            order_approved_at: Some(date("2018-01-01").and_hms_opt(10, 30, 0).unwrap()),
            price: 10.5,
            freight_value: 2.25,
            product_category_name_english: None,
            review_score: Some(4),
            customer_state: "SP".to_string(),
            order_status: "delivered".to_string(),
        };
        assert_eq!(fact.spend(), 12.75);
        assert_eq!(fact.approved_date(), Some(date("2018-01-01")));
    }

    #[test]
    fn test_time_series_totals() {
        let series = TimeSeries {
            rows: vec![
                DailyOrderSummary {
                    date: date("2018-01-01"),
                    order_count: 3,
                    revenue: 60.0,
                },
                DailyOrderSummary {
                    date: date("2018-01-02"),
                    order_count: 1,
                    revenue: 5.0,
                },
            ],
            excluded_rows: 0,
        };
        assert_eq!(series.total_orders(), 4);
        assert_eq!(series.total_revenue(), 65.0);

        let spend = TimeSeries {
            rows: vec![
                CustomerSpendSummary {
                    date: date("2018-01-01"),
                    total_spend: 30.0,
                },
                CustomerSpendSummary {
                    date: date("2018-01-02"),
                    total_spend: 10.0,
                },
            ],
            excluded_rows: 1,
        };
        assert_eq!(spend.total_spend(), 40.0);
        assert_eq!(spend.mean_spend(), 20.0);
    }

    #[test]
    fn test_product_ranking_top_and_bottom() {
        let ranking = ProductRanking {
            items: vec![
                item("bed_bath_table", 9),
                item("health_beauty", 7),
                item("toys", 7),
                item("art", 1),
                item("music", 1),
            ],
        };

        let top = ranking.top(2);
        assert_eq!(top[0].category, "bed_bath_table");
        assert_eq!(top[1].category, "health_beauty");

        let bottom = ranking.bottom(3);
        let names: Vec<_> = bottom.iter().map(|i| i.category.as_str()).collect();
        assert_eq!(names, vec!["art", "music", "health_beauty"]);

        assert_eq!(ranking.total_items(), 25);
        assert_eq!(ranking.mean_items(), 5.0);
        assert_eq!(ranking.count_for("toys"), Some(7));
        assert_eq!(ranking.count_for("garden"), None);
    }

    #[test]
    fn test_distribution_ranked_and_mean() {
        let dist = Distribution {
            counts: [(3u8, 1usize), (4, 1), (5, 3)].into_iter().collect(),
            mode: 5,
            excluded_rows: 0,
        };
        assert_eq!(dist.total(), 5);
        assert_eq!(dist.ranked(), vec![(&5, 3), (&3, 1), (&4, 1)]);
        assert_eq!(dist.mean_score(), 4.4);
        assert_eq!(dist.count_of(&1), 0);
    }

    #[test]
    fn test_panel_outcome_serialization() {
        let ready: PanelOutcome<usize> = PanelOutcome::Ready(3);
        let json = serde_json::to_string(&ready).unwrap();
        assert_eq!(json, r#"{"status":"ready","data":3}"#);

        let missing: PanelOutcome<usize> = PanelOutcome::Unavailable {
            reason: "empty".to_string(),
        };
        assert!(!missing.is_ready());
        assert_eq!(missing.ready(), None);
    }
}
