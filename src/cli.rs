//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storefront Analytics - dashboard views for e-commerce order data
///
/// Loads an order table and an optional customer location table,
/// restricts orders to an approval date window, and writes every
/// dashboard panel to a Markdown or JSON report.
///
/// Examples:
///   storefront-analytics --orders df.csv
///   storefront-analytics --orders df.csv --geolocation geolocation.csv --format json
///   storefront-analytics --orders df.csv --start 2018-01-01 --end 2018-03-31
///   storefront-analytics --orders df.csv --dry-run
///   storefront-analytics --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Order table (CSV)
    #[arg(
        long,
        value_name = "FILE",
        env = "STOREFRONT_ORDERS",
        required_unless_present = "init_config"
    )]
    pub orders: Option<PathBuf>,

    /// Customer location table (CSV), deduplicated by customer_unique_id
    #[arg(long, value_name = "FILE", env = "STOREFRONT_GEOLOCATION")]
    pub geolocation: Option<PathBuf>,

    /// First approval date to include (YYYY-MM-DD)
    ///
    /// Defaults to the earliest approval date when --end is given.
    #[arg(long, value_name = "DATE")]
    pub start: Option<NaiveDate>,

    /// Last approval date to include (YYYY-MM-DD)
    ///
    /// Defaults to the latest approval date when --start is given.
    #[arg(long, value_name = "DATE")]
    pub end: Option<NaiveDate>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the normalized map markers to this JSON file
    #[arg(long, value_name = "FILE")]
    pub points_output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .storefront.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Categories shown in the best and worst seller panels
    #[arg(long, value_name = "COUNT")]
    pub top_n: Option<usize>,

    /// Refuse to aggregate more order rows than this
    #[arg(long, value_name = "ROWS")]
    pub max_rows: Option<usize>,

    /// Label for orders without a product category
    #[arg(long, value_name = "LABEL")]
    pub unknown_category: Option<String>,

    /// Maximum number of map markers (evenly sampled)
    #[arg(long, value_name = "COUNT")]
    pub max_points: Option<usize>,

    /// Exit with code 2 if any panel has no data in range
    #[arg(long)]
    pub fail_on_empty: bool,

    /// Dry run: load and validate the inputs without writing a report
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .storefront.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        match self.orders {
            None => return Err("--orders is required".to_string()),
            Some(ref path) if !path.is_file() => {
                return Err(format!("Order file does not exist: {}", path.display()));
            }
            Some(_) => {}
        }

        if let Some(ref path) = self.geolocation {
            if !path.is_file() {
                return Err(format!("Location file does not exist: {}", path.display()));
            }
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(format!("--start ({start}) must not be after --end ({end})"));
            }
        }

        if self.top_n == Some(0) {
            return Err("Top-N must be at least 1".to_string());
        }

        if self.max_rows == Some(0) {
            return Err("Max rows must be at least 1".to_string());
        }

        if self.max_points == Some(0) {
            return Err("Max points must be at least 1".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Whether the orders should be restricted to a date window.
    pub fn has_date_filter(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }
}
