//! Shared tabular data types.
//!
//! The dataset arrives already decoded from an upstream spreadsheet reader;
//! nothing here parses spreadsheet formats.

mod dataset;
mod types;

pub use dataset::{DatasetError, TabularDataset};
pub use types::{CategoryAggregate, CellValue, UNKNOWN_CATEGORY};
