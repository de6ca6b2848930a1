//! JSON flattening - turn nested record batches into one flat table
//!
//! Nested objects become dotted-path columns and nested lists become row
//! explosions. The flattener iterates to a fixed point, reclassifying only
//! the columns each pass produced.

pub mod types;
pub mod batch;
pub mod table;
pub mod flattener;
pub mod writer;

pub use types::{CellKind, EmptyListPolicy, EmptyObjectPolicy, FlattenConfig, Record, RecordBatch};
pub use batch::{batch_from_json, BatchError};
pub use table::Table;
pub use flattener::{flatten, Flattener};
pub use writer::TableWriter;
