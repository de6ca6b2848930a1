//! Shaping raw JSON documents into record batches
//!
//! API responses arrive either as an array of row objects or as an object
//! envelope. Envelopes that carry arrays are read column-wise: every array
//! field supplies one value per row and the remaining fields are repeated
//! on each row, so `{"data": [{..}, {..}], "total": 2}` becomes two records.

use crate::flatten::types::{CellKind, Record, RecordBatch};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum BatchError {
    #[error("element {index} of the document is a {kind}, expected an object")]
    NotARecord { index: usize, kind: CellKind },

    #[error("column '{column}' has {found} values, expected {expected}")]
    RaggedColumns {
        column: String,
        expected: usize,
        found: usize,
    },

    #[error("a top-level {kind} cannot be read as records")]
    UnsupportedDocument { kind: CellKind },
}

/// Convert one JSON document into a record batch
pub fn batch_from_json(value: Value) -> Result<RecordBatch, BatchError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(map) => Ok(map),
                other => Err(BatchError::NotARecord {
                    index,
                    kind: CellKind::of(&other),
                }),
            })
            .collect(),
        Value::Object(map) => records_from_envelope(map),
        other => Err(BatchError::UnsupportedDocument {
            kind: CellKind::of(&other),
        }),
    }
}

fn records_from_envelope(envelope: Record) -> Result<RecordBatch, BatchError> {
    let mut num_rows: Option<usize> = None;
    for (column, value) in &envelope {
        if let Value::Array(items) = value {
            match num_rows {
                None => num_rows = Some(items.len()),
                Some(expected) if expected != items.len() => {
                    return Err(BatchError::RaggedColumns {
                        column: column.clone(),
                        expected,
                        found: items.len(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    let Some(num_rows) = num_rows else {
        return Ok(vec![envelope]);
    };

    let mut records: RecordBatch = vec![Record::new(); num_rows];
    for (column, value) in envelope {
        match value {
            Value::Array(items) => {
                for (record, item) in records.iter_mut().zip(items) {
                    record.insert(column.clone(), item);
                }
            }
            other => {
                for record in records.iter_mut() {
                    record.insert(column.clone(), other.clone());
                }
            }
        }
    }
    Ok(records)
}
