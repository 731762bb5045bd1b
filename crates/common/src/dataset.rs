use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

use crate::types::CellValue;

/// Errors from loading a decoded dataset document.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Accepted document shapes: a raw grid whose first row holds the headers,
/// or an explicit table object.
#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetDocument {
    Grid(Vec<Vec<CellValue>>),
    Table {
        headers: Vec<CellValue>,
        #[serde(default)]
        rows: Vec<Vec<CellValue>>,
    },
}

/// Header row plus data rows, already type-decoded by an upstream reader.
///
/// Read-only to the chart core. Rows may be ragged; a missing cell reads
/// as [`CellValue::Empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabularDataset {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl<'de> Deserialize<'de> for TabularDataset {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match DatasetDocument::deserialize(deserializer)? {
            DatasetDocument::Table { headers, rows } => Self {
                headers: headers.iter().map(CellValue::to_category).collect(),
                rows,
            },
            DatasetDocument::Grid(grid) => Self::from_grid(grid),
        })
    }
}

impl TabularDataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self { headers, rows }
    }

    /// Split a raw grid into header row and data rows.
    pub fn from_grid(grid: Vec<Vec<CellValue>>) -> Self {
        let mut grid = grid.into_iter();
        let headers = grid
            .next()
            .map(|row| row.iter().map(CellValue::to_category).collect())
            .unwrap_or_default();
        Self {
            headers,
            rows: grid.collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows (the header row is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Positional index of the first header equal to `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, column), `Empty` when the row is too short.
    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .unwrap_or(EMPTY)
    }

    /// Headers with at least one non-empty, number-like cell. These are the
    /// candidates offered for the value axis. Nulls and blank text never
    /// qualify a column on their own.
    pub fn numeric_columns(&self) -> Vec<&str> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(col, _)| {
                self.rows.iter().any(|row| {
                    row.get(*col)
                        .is_some_and(|c| !c.is_empty() && c.try_number().is_some())
                })
            })
            .map(|(_, h)| h.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> TabularDataset {
        TabularDataset::from_grid(vec![
            vec!["Region".into(), "Sales".into(), "Note".into()],
            vec!["north".into(), 3.into(), "ok".into()],
            vec!["south".into(), "7".into()],
        ])
    }

    #[test]
    fn grid_splits_header_row() {
        let ds = sample();
        assert_eq!(ds.headers(), ["Region", "Sales", "Note"]);
        assert_eq!(ds.row_count(), 2);
        assert_eq!(ds.column_index("Sales"), Some(1));
        assert_eq!(ds.column_index("Missing"), None);
    }

    #[test]
    fn ragged_rows_read_as_empty() {
        let ds = sample();
        assert_eq!(ds.cell(1, 2), &CellValue::Empty);
        assert_eq!(ds.cell(9, 0), &CellValue::Empty);
    }

    #[test]
    fn numeric_columns_need_one_numeric_cell() {
        let ds = sample();
        assert_eq!(ds.numeric_columns(), vec!["Sales"]);
    }

    #[test]
    fn null_and_blank_cells_do_not_make_a_column_numeric() {
        let ds = TabularDataset::from_json_str(
            r#"[["Name", "Blank", "Mixed"], ["a", null, "  "], ["b", "   ", "7"]]"#,
        )
        .unwrap();
        assert_eq!(ds.numeric_columns(), vec!["Mixed"]);
    }

    #[test]
    fn empty_grid_has_no_headers() {
        let ds = TabularDataset::from_grid(Vec::new());
        assert!(ds.headers().is_empty());
        assert_eq!(ds.row_count(), 0);
    }

    #[test]
    fn parses_table_and_grid_documents() {
        let table = TabularDataset::from_json_str(
            r#"{"headers": ["X", "Y"], "rows": [["a", 3], ["b", null]]}"#,
        )
        .unwrap();
        let grid = TabularDataset::from_json_str(r#"[["X", "Y"], ["a", 3], ["b", null]]"#).unwrap();
        assert_eq!(table, grid);
        assert_eq!(table.cell(1, 1), &CellValue::Empty);
    }

    #[test]
    fn numeric_headers_are_stringified() {
        let ds = TabularDataset::from_json_str(r#"[[2023, "Y"], [1, 2]]"#).unwrap();
        assert_eq!(ds.headers(), ["2023", "Y"]);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[["X", "Y"], ["a", 1]]"#).unwrap();
        let ds = TabularDataset::load(file.path()).unwrap();
        assert_eq!(ds.row_count(), 1);
    }

    #[test]
    fn invalid_json_is_an_error() {
        let err = TabularDataset::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }
}
