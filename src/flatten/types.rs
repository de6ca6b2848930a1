use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One semi-structured input row: field name to scalar, object or list
pub type Record = Map<String, Value>;

/// An ordered sequence of records that need not share a common shape
pub type RecordBatch = Vec<Record>;

/// The shape of a single cell, used to classify whole columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellKind {
    Null,
    Scalar,
    Object,
    List,
}

impl CellKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => CellKind::Null,
            Value::Object(_) => CellKind::Object,
            Value::Array(_) => CellKind::List,
            Value::Bool(_) | Value::Number(_) | Value::String(_) => CellKind::Scalar,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Null => "null",
            CellKind::Scalar => "scalar",
            CellKind::Object => "object",
            CellKind::List => "list",
        }
    }
}

impl std::fmt::Display for CellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to a row whose list cell is empty when the column is exploded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyListPolicy {
    /// The row produces no output rows
    #[default]
    Drop,
    /// The row is kept once, with a null in the exploded column
    KeepNull,
}

/// What happens to an object column whose objects carry no keys at all
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyObjectPolicy {
    /// The column expands into zero columns and disappears
    #[default]
    Drop,
    /// The column is kept, holding nulls
    KeepNull,
}

/// Configuration for the flattening process
#[derive(Debug, Clone)]
pub struct FlattenConfig {
    /// Separator between a parent column name and an inner key
    pub separator: String,

    /// Handling of empty lists during row explosion
    pub empty_lists: EmptyListPolicy,

    /// Handling of object columns that expand to nothing
    pub empty_objects: EmptyObjectPolicy,

    /// Columns to always keep as raw values (never expanded or exploded)
    pub scalar_fields: Vec<String>,
}

impl Default for FlattenConfig {
    fn default() -> Self {
        FlattenConfig {
            separator: String::from("."),
            empty_lists: EmptyListPolicy::Drop,
            empty_objects: EmptyObjectPolicy::Drop,
            scalar_fields: vec![],
        }
    }
}

impl FlattenConfig {
    pub(crate) fn is_scalar_field(&self, column: &str) -> bool {
        self.scalar_fields.iter().any(|f| f == column)
    }
}
