//! Source documents and the raw rows read from them.

use serde::{Deserialize, Serialize};

/// One per-day tabular document discovered in a collection.
///
/// Discovered once by the enumerator and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub name: String,
    pub collection: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            collection: collection.into(),
        }
    }
}

/// A row of cells keyed by header name, tagged with its originating document.
///
/// Column order follows the source header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub cells: Vec<(String, String)>,
    pub source_file: String,
}

impl RawRow {
    /// Zip a header with a value row. Short rows are right-padded with empty
    /// cells; cells beyond the header are dropped.
    pub fn from_values(header: &[String], values: &[String], source_file: &str) -> Self {
        let cells = header
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = values.get(i).cloned().unwrap_or_default();
                (name.trim().to_string(), value)
            })
            .collect();
        Self {
            cells,
            source_file: source_file.to_string(),
        }
    }

    /// Cell value for a column, if the column exists.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.as_str())
    }

    /// True when every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        vec!["Stock Code".into(), "Close".into(), "Volume".into()]
    }

    #[test]
    fn short_rows_are_padded() {
        let row = RawRow::from_values(&header(), &["ABC".into()], "a.csv");
        assert_eq!(row.get("Stock Code"), Some("ABC"));
        assert_eq!(row.get("Volume"), Some(""));
        assert_eq!(row.source_file, "a.csv");
    }

    #[test]
    fn extra_cells_are_dropped() {
        let values: Vec<String> = vec!["ABC".into(), "1".into(), "2".into(), "3".into()];
        let row = RawRow::from_values(&header(), &values, "a.csv");
        assert_eq!(row.cells.len(), 3);
    }

    #[test]
    fn header_names_are_trimmed() {
        let header = vec![" Stock Code ".to_string()];
        let row = RawRow::from_values(&header, &["XYZ".into()], "b.csv");
        assert_eq!(row.get("Stock Code"), Some("XYZ"));
        assert!(row.get("Close").is_none());
    }

    #[test]
    fn blank_row_detection() {
        let row = RawRow::from_values(&header(), &["  ".into(), "".into()], "c.csv");
        assert!(row.is_blank());
    }
}
