//! Order aggregation and distribution statistics.
//!
//! Every view is a single grouping pass over the same filtered order
//! table, so all dashboard panels agree with the selected date range.

use crate::error::{AnalyticsError, Result};
use crate::models::{
    CustomerSpendSummary, DailyOrderSummary, Distribution, OrderFact, OrderStatusDistribution,
    ProductItemSummary, ProductRanking, ReviewScoreDistribution, StateDistribution, TimeSeries,
};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Label used for rows without a product category.
pub const DEFAULT_UNKNOWN_CATEGORY: &str = "unknown";

/// Construction options for [`AggregationEngine`].
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Reject inputs with more rows than this.
    pub max_rows: Option<usize>,
    /// Bucket name for rows with a null category.
    pub unknown_category: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_rows: None,
            unknown_category: DEFAULT_UNKNOWN_CATEGORY.to_string(),
        }
    }
}

/// Derives the dashboard views from one date-filtered order table.
#[derive(Debug, Clone)]
pub struct AggregationEngine {
    orders: Vec<OrderFact>,
    unknown_category: String,
}

impl AggregationEngine {
    /// Create an engine with default options and no row ceiling.
    pub fn new(orders: Vec<OrderFact>) -> Self {
        Self {
            orders,
            unknown_category: DEFAULT_UNKNOWN_CATEGORY.to_string(),
        }
    }

    /// Create an engine, enforcing the row ceiling in `options`.
    pub fn with_options(orders: Vec<OrderFact>, options: EngineOptions) -> Result<Self> {
        if let Some(limit) = options.max_rows {
            if orders.len() > limit {
                return Err(AnalyticsError::RowLimitExceeded {
                    rows: orders.len(),
                    limit,
                });
            }
        }

        Ok(Self {
            orders,
            unknown_category: options.unknown_category,
        })
    }

    /// Rows held by the engine.
    pub fn orders(&self) -> &[OrderFact] {
        &self.orders
    }

    fn ensure_rows(&self, view: &'static str) -> Result<()> {
        if self.orders.is_empty() {
            return Err(AnalyticsError::EmptyDataset { view });
        }
        Ok(())
    }

    /// Group dated rows by approval date and fold each group with `step`.
    ///
    /// Returns the groups in ascending date order and the number of rows
    /// skipped for lacking a timestamp.
    fn group_by_date<A, F>(&self, view: &'static str, mut step: F) -> Result<(BTreeMap<NaiveDate, A>, usize)>
    where
        A: Default,
        F: FnMut(&mut A, &OrderFact),
    {
        self.ensure_rows(view)?;

        let mut groups: BTreeMap<NaiveDate, A> = BTreeMap::new();
        let mut excluded = 0;

        for order in &self.orders {
            match order.approved_date() {
                Some(date) => step(groups.entry(date).or_default(), order),
                None => excluded += 1,
            }
        }

        if groups.is_empty() {
            return Err(AnalyticsError::EmptyDataset { view });
        }

        Ok((groups, excluded))
    }

    /// Orders and revenue per approval date, ascending.
    pub fn daily_orders(&self) -> Result<TimeSeries<DailyOrderSummary>> {
        let (groups, excluded_rows) =
            self.group_by_date("daily_orders", |acc: &mut (usize, f64), order| {
                acc.0 += 1;
                acc.1 += order.price;
            })?;

        let rows: Vec<_> = groups
            .into_iter()
            .map(|(date, (order_count, revenue))| DailyOrderSummary {
                date,
                order_count,
                revenue,
            })
            .collect();

        debug!(
            "daily_orders: {} dates, {} rows excluded",
            rows.len(),
            excluded_rows
        );
        Ok(TimeSeries {
            rows,
            excluded_rows,
        })
    }

    /// Price plus freight per approval date, ascending.
    ///
    /// Uses the same exclusion rule as [`daily_orders`](Self::daily_orders)
    /// so the two series share their dates.
    pub fn daily_spend(&self) -> Result<TimeSeries<CustomerSpendSummary>> {
        let (groups, excluded_rows) = self.group_by_date("daily_spend", |acc: &mut f64, order| {
            *acc += order.spend();
        })?;

        let rows: Vec<_> = groups
            .into_iter()
            .map(|(date, total_spend)| CustomerSpendSummary { date, total_spend })
            .collect();

        debug!(
            "daily_spend: {} dates, {} rows excluded",
            rows.len(),
            excluded_rows
        );
        Ok(TimeSeries {
            rows,
            excluded_rows,
        })
    }

    /// Item rows per product category, ranked by count.
    ///
    /// Rows without a category are counted under the unknown bucket.
    pub fn product_item_counts(&self) -> Result<ProductRanking> {
        self.ensure_rows("product_items")?;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for order in &self.orders {
            let category = order
                .product_category_name_english
                .as_deref()
                .unwrap_or(&self.unknown_category);
            *counts.entry(category).or_default() += 1;
        }

        let mut items: Vec<_> = counts
            .into_iter()
            .map(|(category, product_count)| ProductItemSummary {
                category: category.to_string(),
                product_count,
            })
            .collect();
        items.sort_by(|a, b| {
            b.product_count
                .cmp(&a.product_count)
                .then_with(|| a.category.cmp(&b.category))
        });

        debug!("product_items: {} categories", items.len());
        Ok(ProductRanking { items })
    }

    /// Reviews per score and the most common score.
    ///
    /// Unreviewed rows are excluded. Ties go to the lowest score.
    pub fn review_score_distribution(&self) -> Result<ReviewScoreDistribution> {
        self.ensure_rows("review_scores")?;

        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        let mut excluded = 0;
        for order in &self.orders {
            match order.review_score {
                Some(score) => *counts.entry(score).or_default() += 1,
                None => excluded += 1,
            }
        }

        tally("review_scores", counts, excluded)
    }

    /// Distinct orders per customer state and the most common state.
    ///
    /// Ties go to the lexicographically smallest state.
    pub fn state_distribution(&self) -> Result<StateDistribution> {
        self.ensure_rows("customer_states")?;

        let mut orders_by_state: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for order in &self.orders {
            orders_by_state
                .entry(order.customer_state.as_str())
                .or_default()
                .insert(order.order_id.as_str());
        }

        let counts = orders_by_state
            .into_iter()
            .map(|(state, ids)| (state.to_string(), ids.len()))
            .collect();

        tally("customer_states", counts, 0)
    }

    /// Rows per order status and the most common status.
    ///
    /// Ties go to the lexicographically smallest status.
    pub fn order_status_distribution(&self) -> Result<OrderStatusDistribution> {
        self.ensure_rows("order_statuses")?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for order in &self.orders {
            *counts.entry(order.order_status.clone()).or_default() += 1;
        }

        tally("order_statuses", counts, 0)
    }
}

/// Attach the mode to a set of counts.
///
/// Keys are visited in ascending order and only a strictly larger count
/// replaces the current best, so ties resolve to the smallest key.
fn tally<K: Ord + Clone>(
    view: &'static str,
    counts: BTreeMap<K, usize>,
    excluded_rows: usize,
) -> Result<Distribution<K>> {
    let mut best: Option<(&K, usize)> = None;
    for (key, &count) in &counts {
        match best {
            Some((_, best_count)) if best_count >= count => {}
            _ => best = Some((key, count)),
        }
    }

    let mode = best
        .map(|(key, _)| key.clone())
        .ok_or(AnalyticsError::EmptyDataset { view })?;

    debug!(
        "{}: {} keys, {} rows excluded",
        view,
        counts.len(),
        excluded_rows
    );
    Ok(Distribution {
        counts,
        mode,
        excluded_rows,
    })
}
