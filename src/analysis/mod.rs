//! Analysis modules.
//!
//! Aggregation of per-normtag measurements into a deviation report.

pub mod aggregator;

pub use aggregator::*;
