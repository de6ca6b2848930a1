use crate::flatten::types::{Record, RecordBatch};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use std::collections::HashMap;

/// A flat table: ordered columns, row-major cells
///
/// Every row has exactly one cell per column. Cells a record never supplied
/// are `Value::Null`.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl Table {
    pub fn new() -> Self {
        Table::default()
    }

    /// Materialize a batch with one column per field name observed,
    /// in order of first appearance
    pub fn from_records(batch: RecordBatch) -> Self {
        let mut table = Table::new();
        for record in &batch {
            for key in record.keys() {
                table.ensure_column(key);
            }
        }

        let width = table.columns.len();
        table.rows = batch
            .into_iter()
            .map(|record| {
                let mut row = vec![Value::Null; width];
                for (key, value) in record {
                    if let Some(&idx) = table.positions.get(&key) {
                        row[idx] = value;
                    }
                }
                row
            })
            .collect();
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows (it may still have columns)
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Iterate over the cells of one column, top to bottom
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Vertically concatenate `other` below `self`
    ///
    /// Columns are unioned: existing columns keep their position, columns
    /// only `other` has are appended in its order. Cells missing on either
    /// side become null.
    pub fn append(&mut self, other: Table) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        for name in &other.columns {
            if !self.contains_column(name) {
                self.ensure_column(name);
                for row in &mut self.rows {
                    row.push(Value::Null);
                }
            }
        }

        let mapping: Vec<usize> = other
            .columns
            .iter()
            .map(|name| self.positions[name])
            .collect();
        let width = self.columns.len();
        self.rows.reserve(other.rows.len());
        for row in other.rows {
            let mut out = vec![Value::Null; width];
            for (value, &idx) in row.into_iter().zip(&mapping) {
                out[idx] = value;
            }
            self.rows.push(out);
        }
    }

    /// Rows as records, every column present (nulls included)
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect()
    }

    pub(crate) fn take_rows(&mut self) -> Vec<Vec<Value>> {
        std::mem::take(&mut self.rows)
    }

    pub(crate) fn set_rows(&mut self, rows: Vec<Vec<Value>>) {
        debug_assert!(rows.iter().all(|r| r.len() == self.columns.len()));
        self.rows = rows;
    }

    /// Remove a column and return its cells
    pub(crate) fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        let cells = self.rows.iter_mut().map(|row| row.remove(idx)).collect();
        self.reindex();
        Some(cells)
    }

    /// Append a column at the end; a column with the same name is replaced
    pub(crate) fn push_column(&mut self, name: String, cells: Vec<Value>) {
        debug_assert_eq!(cells.len(), self.rows.len());
        self.remove_column(&name);
        self.ensure_column(&name);
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row.push(cell);
        }
    }

    /// Move a column to the last position, keeping its cells
    pub(crate) fn move_column_to_end(&mut self, idx: usize) {
        let name = self.columns.remove(idx);
        self.columns.push(name);
        for row in &mut self.rows {
            let cell = row.remove(idx);
            row.push(cell);
        }
        self.reindex();
    }

    fn ensure_column(&mut self, name: &str) {
        if !self.positions.contains_key(name) {
            self.positions.insert(name.to_string(), self.columns.len());
            self.columns.push(name.to_string());
        }
    }

    fn reindex(&mut self) {
        self.positions = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
    }
}

/// Serializes as a JSON array of row objects
impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct RowRef<'a> {
            columns: &'a [String],
            row: &'a [Value],
        }

        impl Serialize for RowRef<'_> {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.columns.len()))?;
                for (name, value) in self.columns.iter().zip(self.row) {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
        }

        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&RowRef {
                columns: &self.columns,
                row,
            })?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch(value: Value) -> RecordBatch {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_records_unions_columns() {
        let table = Table::from_records(batch(json!([
            {"id": 1, "name": "truck-1"},
            {"id": 2, "plate": "ABC1234"}
        ])));

        assert_eq!(table.columns(), &["id", "name", "plate"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.get(0, "plate"), Some(&Value::Null));
        assert_eq!(table.get(1, "name"), Some(&Value::Null));
        assert_eq!(table.get(1, "plate"), Some(&json!("ABC1234")));
    }

    #[test]
    fn test_empty_batch() {
        let table = Table::from_records(vec![]);
        assert!(table.is_empty());
        assert_eq!(table.num_columns(), 0);
    }

    #[test]
    fn test_append_unions_columns() {
        let mut left = Table::from_records(batch(json!([{"a": 1, "b": 2}])));
        let right = Table::from_records(batch(json!([{"c": 3, "a": 4}])));
        left.append(right);

        assert_eq!(left.columns(), &["a", "b", "c"]);
        assert_eq!(left.rows()[0], vec![json!(1), json!(2), Value::Null]);
        assert_eq!(left.rows()[1], vec![json!(4), Value::Null, json!(3)]);
    }

    #[test]
    fn test_append_to_empty_table() {
        let mut acc = Table::new();
        acc.append(Table::from_records(batch(json!([{"x": "k"}]))));
        assert_eq!(acc.columns(), &["x"]);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_push_column_replaces_existing() {
        let mut table = Table::from_records(batch(json!([{"a.b": 1, "z": 0}])));
        table.push_column("a.b".to_string(), vec![json!(9)]);

        assert_eq!(table.columns(), &["z", "a.b"]);
        assert_eq!(table.get(0, "a.b"), Some(&json!(9)));
    }

    #[test]
    fn test_serialize_as_rows() {
        let table = Table::from_records(batch(json!([{"b": 1, "a": null}])));
        let out = serde_json::to_string(&table).unwrap();
        assert_eq!(out, r#"[{"b":1,"a":null}]"#);
    }

    #[test]
    fn test_column_iter() {
        let table = Table::from_records(batch(json!([{"a": 1}, {"a": 2}])));
        let cells: Vec<_> = table.column("a").unwrap().cloned().collect();
        assert_eq!(cells, vec![json!(1), json!(2)]);
        assert!(table.column("missing").is_none());
    }
}
