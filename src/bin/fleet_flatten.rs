//! fleet-flatten: Flatten nested JSON into a single flat table
//!
//! Usage:
//!   # Read from file, output JSON Lines to stdout
//!   fleet-flatten stops.json
//!
//!   # Read from stdin
//!   echo '[{"id": 1, "stops": [{"minutes": 10}]}]' | fleet-flatten
//!
//!   # NDJSON input, one record per line
//!   fleet-flatten --ndjson devices.jsonl --omit-nulls

// Use MiMalloc allocator for better performance (recommended by simd-json)
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use fleet_tables::flatten::{
    batch_from_json, EmptyListPolicy, EmptyObjectPolicy, FlattenConfig, Flattener, RecordBatch,
    TableWriter,
};
use serde_json::Value;
use std::fs::File;
use std::io::{BufReader, Read};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "fleet-flatten")]
#[command(about = "Flatten nested JSON into a single flat table", long_about = None)]
struct Args {
    /// Input file (use stdin if omitted)
    #[arg(value_name = "FILE")]
    input: Option<String>,

    /// Process newline-delimited JSON (one record per line)
    #[arg(long)]
    ndjson: bool,

    /// Separator for nested column names (default: ".")
    #[arg(long)]
    separator: Option<String>,

    /// Keep rows whose list is empty, with a null in its place
    #[arg(long)]
    keep_empty_lists: bool,

    /// Keep columns whose objects are all empty, as nulls
    #[arg(long)]
    keep_empty_objects: bool,

    /// Comma-separated columns to never expand or explode
    #[arg(long)]
    scalar_fields: Option<String>,

    /// Leave null cells out of the output rows
    #[arg(long)]
    omit_nulls: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fleet_tables=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build config
    let mut config = FlattenConfig::default();
    if let Some(sep) = args.separator {
        config.separator = sep;
    }
    if args.keep_empty_lists {
        config.empty_lists = EmptyListPolicy::KeepNull;
    }
    if args.keep_empty_objects {
        config.empty_objects = EmptyObjectPolicy::KeepNull;
    }
    if let Some(fields_str) = args.scalar_fields {
        config.scalar_fields = fields_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    let reader = if let Some(file_path) = &args.input {
        let file = File::open(file_path).with_context(|| format!("Failed to open {}", file_path))?;
        Box::new(BufReader::new(file)) as Box<dyn Read>
    } else {
        Box::new(std::io::stdin()) as Box<dyn Read>
    };

    let batch = read_batch(reader, args.ndjson)?;
    info!(records = batch.len(), "read input");

    let table = Flattener::new(config).flatten(batch);
    info!(rows = table.num_rows(), columns = table.num_columns(), "flattened");

    let mut writer = TableWriter::new(std::io::stdout().lock()).omit_nulls(args.omit_nulls);
    writer.write_table(&table)?;
    writer.flush()?;

    Ok(())
}

/// Read the whole input as one batch using SIMD-accelerated parsing
///
/// A single document is shaped with `batch_from_json`; NDJSON input (or a
/// document simd-json rejects) is read line by line, one record per line.
fn read_batch(reader: Box<dyn Read>, ndjson: bool) -> Result<RecordBatch> {
    let mut content = Vec::new();
    let mut buf_reader = BufReader::new(reader);
    buf_reader.read_to_end(&mut content).context("Failed to read input")?;

    if !ndjson {
        // simd-json parses in place; the scratch copy is dropped before any fallback
        let parsed = {
            let mut scratch = content.clone();
            simd_json::serde::from_slice::<Value>(&mut scratch)
        };
        match parsed {
            Ok(value) => return batch_from_json(value).context("Input is not a set of records"),
            Err(e) => debug!(error = %e, "not a single JSON document, reading as NDJSON"),
        }
    }

    parse_ndjson(&content)
}

/// One record per non-blank line
fn parse_ndjson(content: &[u8]) -> Result<RecordBatch> {
    let content_str = std::str::from_utf8(content).context("Input is not valid UTF-8")?;
    let mut batch = RecordBatch::new();
    for (line_no, line) in content_str.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;
        match value {
            Value::Object(record) => batch.push(record),
            other => bail!(
                "line {} is not a JSON object: {}",
                line_no + 1,
                fleet_tables::flatten::CellKind::of(&other)
            ),
        }
    }
    Ok(batch)
}
