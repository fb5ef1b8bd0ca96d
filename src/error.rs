//! Error types for the analytics core.
//!
//! Everything below the CLI returns [`AnalyticsError`]; the binary wraps
//! it in `anyhow` with extra context.

use chrono::NaiveDate;
use thiserror::Error;

/// Result alias used by the ingest, analysis and geo modules.
pub type Result<T, E = AnalyticsError> = std::result::Result<T, E>;

/// Errors raised while loading tables or computing views.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// The input for a view was empty after that view's exclusions.
    #[error("no data available for view '{view}'")]
    EmptyDataset { view: &'static str },

    /// A required column is absent from an input table.
    #[error("table '{table}' is missing required columns: {}", .missing.join(", "))]
    SchemaMismatch {
        table: &'static str,
        missing: Vec<String>,
    },

    /// A cell holds a value outside the data model.
    #[error("table '{table}', line {line}, column '{column}': {reason} (value: '{value}')")]
    InvalidField {
        table: &'static str,
        line: u64,
        column: &'static str,
        value: String,
        reason: &'static str,
    },

    /// The input has more rows than the configured ceiling.
    #[error("input has {rows} rows, above the limit of {limit}")]
    RowLimitExceeded { rows: usize, limit: usize },

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),

    #[error("invalid date range: {start} is after {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalyticsError {
    /// Whether the error only means "nothing to show" for one view.
    pub fn is_empty_dataset(&self) -> bool {
        matches!(self, AnalyticsError::EmptyDataset { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_mismatch_message_lists_columns() {
        let err = AnalyticsError::SchemaMismatch {
            table: "orders",
            missing: vec!["price".to_string(), "order_status".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "table 'orders' is missing required columns: price, order_status"
        );
    }

    #[test]
    fn test_is_empty_dataset() {
        assert!(AnalyticsError::EmptyDataset { view: "daily_orders" }.is_empty_dataset());
        assert!(!AnalyticsError::RowLimitExceeded { rows: 2, limit: 1 }.is_empty_dataset());
    }
}
