use serde::{Deserialize, Serialize};

/// Category assigned to rows whose x-cell is missing or empty.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One already-decoded spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// True for `Empty` and for zero-length text.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// String coercion used for category labels and header names.
    ///
    /// Numbers print in their shortest decimal form (`3`, `2.5`).
    /// Missing and empty cells become [`UNKNOWN_CATEGORY`].
    pub fn to_category(&self) -> String {
        match self {
            CellValue::Number(n) => n.to_string(),
            CellValue::Text(s) if !s.is_empty() => s.clone(),
            _ => UNKNOWN_CATEGORY.to_string(),
        }
    }

    /// Numeric coercion, if the cell holds something number-like.
    ///
    /// Text is trimmed and parsed as a decimal float. Non-finite results
    /// are rejected.
    pub fn try_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Empty => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Numeric coercion with a silent zero for anything non-numeric.
    pub fn to_number(&self) -> f64 {
        self.try_number().unwrap_or(0.0)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::Text(s)
    }
}

/// Summed y-values for one category, in first-occurrence order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAggregate {
    pub label: String,
    pub total: f64,
}

impl CategoryAggregate {
    pub fn new(label: impl Into<String>, total: f64) -> Self {
        Self {
            label: label.into(),
            total,
        }
    }
}
