//! Approval date window applied before aggregation.

use crate::error::{AnalyticsError, Result};
use crate::models::OrderFact;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive window of approval dates.
///
/// Comparison is on the calendar date only, so every order approved on
/// `end` is inside the window regardless of its time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Window spanning the earliest and latest approval dates in `orders`.
    pub fn covering(orders: &[OrderFact]) -> Option<Self> {
        let mut dates = orders.iter().filter_map(OrderFact::approved_date);
        let first = dates.next()?;
        let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start, end })
    }

    /// Window for optional `start`/`end` bounds over `orders`.
    ///
    /// A missing bound falls back to the earliest or latest approval date,
    /// clamped to the given bound so a window past either end of the data is
    /// a single empty day instead of an inverted range. No bounds means no
    /// window.
    pub fn from_bounds(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        orders: &[OrderFact],
    ) -> Result<Option<Self>> {
        let (start, end) = match (start, end, Self::covering(orders)) {
            (None, None, _) => return Ok(None),
            (Some(start), Some(end), _) => (start, end),
            (Some(start), None, Some(covering)) => (start, covering.end.max(start)),
            (None, Some(end), Some(covering)) => (covering.start.min(end), end),
            (Some(day), None, None) | (None, Some(day), None) => (day, day),
        };
        Self::new(start, end).map(Some)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Rows approved inside the window. Undated rows never match.
    pub fn filter(&self, orders: &[OrderFact]) -> Vec<OrderFact> {
        orders
            .iter()
            .filter(|o| o.approved_date().is_some_and(|d| self.contains(d)))
            .cloned()
            .collect()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn order(id: &str, approved: Option<&str>) -> OrderFact {
        OrderFact {
            order_id: id.to_string(),
            customer_id: None,
            order_approved_at: approved.map(|s| {
                chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
            }),
            price: 1.0,
            freight_value: 0.0,
            product_category_name_english: None,
            review_score: None,
            customer_state: "SP".to_string(),
            order_status: "delivered".to_string(),
        }
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        assert!(DateRange::new(date("2018-02-01"), date("2018-01-01")).is_err());
        assert!(DateRange::new(date("2018-01-01"), date("2018-01-01")).is_ok());
    }

    #[test]
    fn test_filter_is_inclusive_on_dates() {
        let orders = vec![
            order("before", Some("2017-12-31 23:59:59")),
            order("start", Some("2018-01-01 00:00:00")),
            order("end_late", Some("2018-01-31 23:30:00")),
            order("after", Some("2018-02-01 00:00:01")),
            order("undated", None),
        ];
        let range = DateRange::new(date("2018-01-01"), date("2018-01-31")).unwrap();
        let ids: Vec<_> = range
            .filter(&orders)
            .into_iter()
            .map(|o| o.order_id)
            .collect();
        assert_eq!(ids, vec!["start", "end_late"]);
    }

    #[test]
    fn test_covering_ignores_undated_rows() {
        let orders = vec![
            order("a", Some("2018-03-05 10:00:00")),
            order("b", None),
            order("c", Some("2017-11-20 08:00:00")),
        ];
        let range = DateRange::covering(&orders).unwrap();
        assert_eq!(range.start, date("2017-11-20"));
        assert_eq!(range.end, date("2018-03-05"));

        assert!(DateRange::covering(&[order("x", None)]).is_none());
    }

    #[test]
    fn test_from_bounds_fills_missing_bound_from_data() {
        let orders = vec![
            order("a", Some("2018-01-05 10:00:00")),
            order("b", Some("2018-03-20 10:00:00")),
        ];
        assert_eq!(DateRange::from_bounds(None, None, &orders).unwrap(), None);

        let range = DateRange::from_bounds(Some(date("2018-02-01")), None, &orders)
            .unwrap()
            .unwrap();
        assert_eq!(range.end, date("2018-03-20"));

        let range = DateRange::from_bounds(None, Some(date("2018-02-01")), &orders)
            .unwrap()
            .unwrap();
        assert_eq!(range.start, date("2018-01-05"));
    }

    #[test]
    fn test_from_bounds_outside_data_is_empty_window() {
        let orders = vec![
            order("a", Some("2018-01-05 10:00:00")),
            order("b", Some("2018-03-20 10:00:00")),
        ];

        let late = DateRange::from_bounds(Some(date("2030-01-01")), None, &orders)
            .unwrap()
            .unwrap();
        assert_eq!(late, DateRange::new(date("2030-01-01"), date("2030-01-01")).unwrap());
        assert!(late.filter(&orders).is_empty());

        let early = DateRange::from_bounds(None, Some(date("2010-01-01")), &orders)
            .unwrap()
            .unwrap();
        assert_eq!(early.start, date("2010-01-01"));
        assert!(early.filter(&orders).is_empty());

        let undated = DateRange::from_bounds(Some(date("2018-01-01")), None, &[order("x", None)])
            .unwrap()
            .unwrap();
        assert!(undated.filter(&[order("x", None)]).is_empty());
    }

    #[test]
    fn test_from_bounds_rejects_inverted_explicit_bounds() {
        let err = DateRange::from_bounds(
            Some(date("2018-02-01")),
            Some(date("2018-01-01")),
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, AnalyticsError::InvalidDateRange { .. }));
    }
}
