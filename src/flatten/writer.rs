use crate::flatten::table::Table;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::io::Write;

/// Writes a table as JSON Lines, one row object per line
pub struct TableWriter<W: Write> {
    writer: W,
    omit_nulls: bool,
}

impl<W: Write> TableWriter<W> {
    pub fn new(writer: W) -> Self {
        TableWriter {
            writer,
            omit_nulls: false,
        }
    }

    /// Leave null cells out of the written rows
    pub fn omit_nulls(mut self, omit: bool) -> Self {
        self.omit_nulls = omit;
        self
    }

    /// Write every row of the table, returning the number of lines written
    pub fn write_table(&mut self, table: &Table) -> Result<usize> {
        for row in table.rows() {
            let data: Map<String, Value> = table
                .columns()
                .iter()
                .zip(row)
                .filter(|(_, value)| !(self.omit_nulls && value.is_null()))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();

            let json = serde_json::to_string(&data).context("Failed to serialize row")?;
            writeln!(self.writer, "{}", json).context("Failed to write row")?;
        }
        Ok(table.num_rows())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush writer")
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
