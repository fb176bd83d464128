//! Column-major numeric table used as the dataset exchanged with forward processes.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::TableError;

/// An ordered set of named `f64` columns of equal length.
///
/// Missing values are represented as `NaN`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TableData", into = "TableData")]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
    n_rows: usize,
    /// Column name -> position in `names`/`columns`
    index: FxHashMap<String, usize>,
}

/// Serialized form of a table (the name index is rebuilt on load)
#[derive(Serialize, Deserialize)]
struct TableData {
    columns: Vec<(String, Vec<f64>)>,
}

impl TryFrom<TableData> for Table {
    type Error = TableError;

    fn try_from(data: TableData) -> Result<Self, Self::Error> {
        Table::from_columns(data.columns)
    }
}

impl From<Table> for TableData {
    fn from(table: Table) -> Self {
        TableData {
            columns: table.names.into_iter().zip(table.columns).collect(),
        }
    }
}

impl Table {
    /// Create an empty table with no columns
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from `(name, values)` pairs, in order.
    pub fn from_columns<S, I>(columns: I) -> Result<Self, TableError>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, Vec<f64>)>,
    {
        let mut table = Self::new();
        for (name, values) in columns {
            table.push_column(name, values)?;
        }
        Ok(table)
    }

    /// Append a column. The first column fixes the row count.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TableError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if !self.columns.is_empty() && values.len() != self.n_rows {
            return Err(TableError::ColumnLengthMismatch {
                column: name,
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        self.n_rows = values.len();
        self.index.insert(name.clone(), self.names.len());
        self.names.push(name);
        self.columns.push(values);
        Ok(())
    }

    /// Insert a column, overwriting any existing column with the same name
    pub fn set_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<f64>,
    ) -> Result<(), TableError> {
        let name = name.into();
        match self.index.get(&name) {
            Some(&i) => {
                if values.len() != self.n_rows {
                    return Err(TableError::ColumnLengthMismatch {
                        column: name,
                        expected: self.n_rows,
                        actual: values.len(),
                    });
                }
                self.columns[i] = values;
                Ok(())
            }
            None => self.push_column(name, values),
        }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// A table with no columns or no rows
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.n_rows == 0
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.index.get(name).map(|&i| self.columns[i].as_slice())
    }

    /// Value at `(row, column)`, if both exist
    #[must_use]
    pub fn value(&self, row: usize, name: &str) -> Option<f64> {
        self.column(name).and_then(|c| c.get(row).copied())
    }

    /// Copy of this table with one column's values swapped out.
    pub fn with_column_replaced(&self, name: &str, values: Vec<f64>) -> Result<Self, TableError> {
        let i = *self
            .index
            .get(name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))?;
        if values.len() != self.n_rows {
            return Err(TableError::ColumnLengthMismatch {
                column: name.to_string(),
                expected: self.n_rows,
                actual: values.len(),
            });
        }
        let mut copy = self.clone();
        copy.columns[i] = values;
        Ok(copy)
    }

    /// Stack tables vertically. All tables must have the same columns in the same order.
    pub fn concat(tables: &[Table]) -> Result<Self, TableError> {
        let Some(first) = tables.first() else {
            return Ok(Self::new());
        };
        if tables.iter().any(|t| t.names != first.names) {
            return Err(TableError::IncompatibleColumns);
        }

        let total_rows = tables.iter().map(Table::n_rows).sum();
        let columns = (0..first.n_columns())
            .map(|c| {
                let mut values = Vec::with_capacity(total_rows);
                for table in tables {
                    values.extend_from_slice(&table.columns[c]);
                }
                values
            })
            .collect();

        Ok(Self {
            names: first.names.clone(),
            columns,
            n_rows: total_rows,
            index: first.index.clone(),
        })
    }

    /// Copy `len` rows starting at `start`
    pub fn slice_rows(&self, start: usize, len: usize) -> Result<Self, TableError> {
        let end = start
            .checked_add(len)
            .filter(|&end| end <= self.n_rows)
            .ok_or(TableError::RowRangeOutOfBounds {
                start,
                len,
                n_rows: self.n_rows,
            })?;

        Ok(Self {
            names: self.names.clone(),
            columns: self.columns.iter().map(|c| c[start..end].to_vec()).collect(),
            n_rows: len,
            index: self.index.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xy() -> Table {
        Table::from_columns([
            ("x", vec![1.0, 2.0, 3.0]),
            ("y", vec![10.0, 20.0, 30.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged_columns() {
        let err = Table::from_columns([("x", vec![1.0, 2.0]), ("y", vec![1.0])]).unwrap_err();
        assert_eq!(
            err,
            TableError::ColumnLengthMismatch {
                column: "y".into(),
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn test_from_columns_rejects_duplicates() {
        let err = Table::from_columns([("x", vec![1.0]), ("x", vec![2.0])]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("x".into()));
    }

    #[test]
    fn test_with_column_replaced_leaves_source_untouched() {
        let table = xy();
        let replaced = table
            .with_column_replaced("x", vec![-1.0, -2.0, -3.0])
            .unwrap();

        assert_eq!(table.column("x").unwrap(), &[1.0, 2.0, 3.0]);
        assert_eq!(replaced.column("x").unwrap(), &[-1.0, -2.0, -3.0]);
        assert_eq!(replaced.column("y"), table.column("y"));
        assert_eq!(replaced.column_names(), table.column_names());
    }

    #[test]
    fn test_concat_and_slice() {
        let a = xy();
        let b = a.with_column_replaced("y", vec![0.0, 0.0, 0.0]).unwrap();

        let stacked = Table::concat(&[a.clone(), b.clone()]).unwrap();
        assert_eq!(stacked.n_rows(), 6);
        assert_eq!(stacked.column("x").unwrap(), &[1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);

        assert_eq!(stacked.slice_rows(0, 3).unwrap(), a);
        assert_eq!(stacked.slice_rows(3, 3).unwrap(), b);
        assert!(stacked.slice_rows(4, 3).is_err());
    }

    #[test]
    fn test_concat_rejects_different_layouts() {
        let a = xy();
        let b = Table::from_columns([("y", vec![1.0]), ("x", vec![1.0])]).unwrap();
        assert_eq!(
            Table::concat(&[a, b]).unwrap_err(),
            TableError::IncompatibleColumns
        );
    }

    #[test]
    fn test_set_column_overwrites_or_appends() {
        let mut table = xy();
        table.set_column("y", vec![1.0, 1.0, 1.0]).unwrap();
        table.set_column("z", vec![5.0, 6.0, 7.0]).unwrap();

        assert_eq!(table.n_columns(), 3);
        assert_eq!(table.value(0, "y"), Some(1.0));
        assert_eq!(table.value(2, "z"), Some(7.0));
        assert_eq!(table.value(3, "z"), None);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let json = serde_json::to_string(&xy()).unwrap();
        let table: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(table, xy());
        assert_eq!(table.value(1, "y"), Some(20.0));
    }

    #[test]
    fn test_deserialize_rejects_malformed_columns() {
        let ragged = r#"{"columns":[["x",[1,2,3]],["y",[1]]]}"#;
        let err = serde_json::from_str::<Table>(ragged).unwrap_err();
        assert!(err.to_string().contains("column 'y' has 1 rows, expected 3"));

        let duplicate = r#"{"columns":[["x",[1]],["x",[2]]]}"#;
        let err = serde_json::from_str::<Table>(duplicate).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'x'"));
    }

    #[test]
    fn test_empty_table() {
        assert!(Table::new().is_empty());
        let no_rows = Table::from_columns([("x", Vec::new())]).unwrap();
        assert!(no_rows.is_empty());
        assert!(!xy().is_empty());
    }
}
