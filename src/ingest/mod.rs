//! Loading order and location tables from CSV.
//!
//! The loaders check headers before reading any row, so a missing column
//! surfaces as [`AnalyticsError::SchemaMismatch`] up front. Cell values are
//! validated against the data model while parsing.

mod locations;
mod orders;
mod range;

pub use locations::{dedup_locations, load_locations, read_locations};
pub use orders::{load_orders, read_orders};
pub use range::DateRange;

use crate::error::{AnalyticsError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::collections::HashMap;

/// Header name to column position for one table.
struct ColumnIndex {
    table: &'static str,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn from_headers(table: &'static str, headers: &StringRecord) -> Self {
        let positions = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().to_string(), i))
            .collect();
        Self { table, positions }
    }

    /// Fail with every missing column at once.
    fn require(&self, columns: &[&str]) -> Result<()> {
        let missing: Vec<String> = columns
            .iter()
            .filter(|c| !self.positions.contains_key(**c))
            .map(|c| c.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AnalyticsError::SchemaMismatch {
                table: self.table,
                missing,
            })
        }
    }

    fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    /// Position of the first alias present, for columns with several names.
    fn first_of(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|a| self.position(a))
    }
}

/// One record plus what is needed to report a bad cell.
struct Row<'a> {
    table: &'static str,
    line: u64,
    record: &'a StringRecord,
}

impl<'a> Row<'a> {
    fn new(table: &'static str, record: &'a StringRecord) -> Self {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        Self {
            table,
            line,
            record,
        }
    }

    /// Trimmed cell; empty cells read as `None`.
    fn cell(&self, position: usize) -> Option<&'a str> {
        self.record
            .get(position)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn invalid(&self, column: &'static str, value: &str, reason: &'static str) -> AnalyticsError {
        AnalyticsError::InvalidField {
            table: self.table,
            line: self.line,
            column,
            value: value.to_string(),
            reason,
        }
    }

    fn required_text(&self, position: usize, column: &'static str) -> Result<String> {
        self.cell(position)
            .map(str::to_string)
            .ok_or_else(|| self.invalid(column, "", "value is required"))
    }

    fn optional_text(&self, position: Option<usize>) -> Option<String> {
        position.and_then(|p| self.cell(p)).map(str::to_string)
    }

    /// A non-negative amount. An empty cell reads as `0.0`, so a missing
    /// price or freight adds nothing to any sum while the row still counts
    /// toward order and item totals.
    fn non_negative(&self, position: usize, column: &'static str) -> Result<f64> {
        let raw = self.cell(position).unwrap_or("0");
        let value: f64 = raw
            .parse()
            .map_err(|_| self.invalid(column, raw, "not a number"))?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.invalid(column, raw, "must be a non-negative number"));
        }
        Ok(value)
    }

    fn timestamp(&self, position: usize, column: &'static str) -> Result<Option<NaiveDateTime>> {
        match self.cell(position) {
            None => Ok(None),
            Some(raw) => parse_timestamp(raw)
                .map(Some)
                .ok_or_else(|| self.invalid(column, raw, "not a timestamp")),
        }
    }

    fn review_score(&self, position: usize, column: &'static str) -> Result<Option<u8>> {
        let Some(raw) = self.cell(position) else {
            return Ok(None);
        };
        let value: f64 = raw
            .parse()
            .map_err(|_| self.invalid(column, raw, "not a number"))?;
        if value.fract() != 0.0 || !(1.0..=5.0).contains(&value) {
            return Err(self.invalid(column, raw, "score must be an integer from 1 to 5"));
        }
        Ok(Some(value as u8))
    }

    fn coordinate(&self, position: usize, column: &'static str, limit: f64) -> Result<f64> {
        let raw = self
            .cell(position)
            .ok_or_else(|| self.invalid(column, "", "value is required"))?;
        let value: f64 = raw
            .parse()
            .map_err(|_| self.invalid(column, raw, "not a number"))?;
        if !value.is_finite() || value.abs() > limit {
            return Err(self.invalid(column, raw, "coordinate out of range"));
        }
        Ok(value)
    }
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse the timestamp layouts found in exported order tables.
///
/// A bare date is read as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_layouts() {
        let expected = NaiveDate::from_ymd_opt(2017, 10, 2)
            .unwrap()
            .and_hms_opt(11, 7, 15)
            .unwrap();
        assert_eq!(parse_timestamp("2017-10-02 11:07:15"), Some(expected));
        assert_eq!(parse_timestamp("2017-10-02T11:07:15"), Some(expected));
        assert_eq!(
            parse_timestamp("2017-10-02"),
            NaiveDate::from_ymd_opt(2017, 10, 2).unwrap().and_hms_opt(0, 0, 0)
        );
        assert!(parse_timestamp("02/10/2017").is_none());
    }

    #[test]
    fn test_require_reports_all_missing_columns() {
        let headers = StringRecord::from(vec!["order_id", "price"]);
        let index = ColumnIndex::from_headers("orders", &headers);
        let err = index
            .require(&["order_id", "price", "order_status", "customer_state"])
            .unwrap_err();
        match err {
            AnalyticsError::SchemaMismatch { table, missing } => {
                assert_eq!(table, "orders");
                assert_eq!(missing, vec!["order_status", "customer_state"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_of_prefers_earlier_alias() {
        let headers = StringRecord::from(vec!["geolocation_lat", "latitude"]);
        let index = ColumnIndex::from_headers("locations", &headers);
        assert_eq!(index.first_of(&["latitude", "geolocation_lat"]), Some(1));
        assert_eq!(index.first_of(&["lat"]), None);
    }
}
