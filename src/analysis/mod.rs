//! Analysis modules.
//!
//! The aggregation engine turns a filtered order table into the
//! dashboard's views.

pub mod aggregator;

pub use aggregator::*;
