//! Tabular dataset model produced by the parser

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A single cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Numeric value (only produced when numeric coercion is enabled)
    Number(f64),
    /// Raw text value
    Text(String),
}

impl CellValue {
    /// Coerce the cell to a number.
    ///
    /// Text that does not parse as a float (including empty text) yields `NaN`.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            CellValue::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
        }
    }
}

/// One row, keyed by column name in header order
pub type Record = IndexMap<String, CellValue>;

/// Ordered records sharing a common header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Column names in input order
    pub header: Vec<String>,
    /// Records in input row order
    pub records: Vec<Record>,
}

impl Dataset {
    /// Create a dataset from a header and its records
    pub fn new(header: Vec<String>, records: Vec<Record>) -> Self {
        Self { header, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `column` is part of the header
    pub fn has_column(&self, column: &str) -> bool {
        self.header.iter().any(|h| h == column)
    }

    /// Iterate over the values of one column, `None` where a record lacks the key
    pub fn column_values<'a>(&'a self, column: &'a str) -> impl Iterator<Item = Option<&'a CellValue>> + 'a {
        self.records.iter().map(move |record| record.get(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_coercion() {
        assert_eq!(CellValue::from("4.5").as_f64(), 4.5);
        assert_eq!(CellValue::from(" 12 ").as_f64(), 12.0);
        assert_eq!(CellValue::Number(3.0).as_f64(), 3.0);
        assert!(CellValue::from("abc").as_f64().is_nan());
        assert!(CellValue::from("").as_f64().is_nan());
    }

    #[test]
    fn test_column_values() {
        let mut first = Record::new();
        first.insert("a".to_string(), CellValue::from("1"));
        let second = Record::new();
        let dataset = Dataset::new(vec!["a".to_string()], vec![first, second]);

        let values: Vec<_> = dataset.column_values("a").collect();
        assert_eq!(values.len(), 2);
        assert!(values[0].is_some());
        assert!(values[1].is_none());
        assert!(dataset.has_column("a"));
        assert!(!dataset.has_column("b"));
    }
}
