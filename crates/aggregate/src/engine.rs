use chartspace_common::{CategoryAggregate, TabularDataset};
use std::collections::HashMap;

/// Reasons an aggregation cannot produce a chart.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AggregateError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("dataset has no data rows")]
    InsufficientData,
}

/// Sum `y_column` per distinct `x_column` value, keeping first-seen order.
///
/// The x-cell is coerced to a string (`"Unknown"` when empty) and the y-cell
/// to a number (`0` when not numeric).
pub fn aggregate(
    dataset: &TabularDataset,
    x_column: &str,
    y_column: &str,
) -> Result<Vec<CategoryAggregate>, AggregateError> {
    let x = dataset
        .column_index(x_column)
        .ok_or_else(|| AggregateError::ColumnNotFound(x_column.to_string()))?;
    let y = dataset
        .column_index(y_column)
        .ok_or_else(|| AggregateError::ColumnNotFound(y_column.to_string()))?;

    if dataset.row_count() == 0 {
        return Err(AggregateError::InsufficientData);
    }

    let mut out: Vec<CategoryAggregate> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for row in 0..dataset.row_count() {
        let label = dataset.cell(row, x).to_category();
        let value = dataset.cell(row, y).to_number();
        match slots.get(&label) {
            Some(&slot) => out[slot].total += value,
            None => {
                slots.insert(label.clone(), out.len());
                out.push(CategoryAggregate::new(label, value));
            }
        }
    }

    tracing::debug!(
        rows = dataset.row_count(),
        categories = out.len(),
        "aggregated {y_column} by {x_column}"
    );
    Ok(out)
}
