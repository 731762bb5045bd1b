//! Aggregation: reduce tabular rows into ordered per-category totals.
//!
//! # Invariants
//! - Output order is the first-occurrence order of the x-values.
//! - A category's total is the sum of its coerced y-values; non-numeric
//!   cells count as zero and never raise an error.
//! - Single pass, O(rows), no state between calls.

mod engine;

pub use engine::{AggregateError, aggregate};
