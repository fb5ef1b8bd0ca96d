//! Storefront Analytics - dashboard views for e-commerce order data.
//!
//! The core is two independent pieces over already-loaded tables:
//!
//! - [`AggregationEngine`] turns a date-filtered order table into the
//!   dashboard's time series, rankings and distributions.
//! - [`GeoSampler`] projects deduplicated customer coordinates onto a
//!   base map's bounding box.
//!
//! Both are pure: every call builds a fresh result from the input held at
//! construction. Loading and filtering live in [`ingest`], rendering in
//! [`report`].

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod geo;
pub mod ingest;
pub mod models;
pub mod report;

pub use analysis::{AggregationEngine, EngineOptions};
pub use error::{AnalyticsError, Result};
pub use geo::{BaseMap, BoundingBox, GeoSampler, MapPoint, PointSet};
pub use ingest::DateRange;
