//! fleet-report: Fetch one telemetry report for a set of fleets
//!
//! Usage:
//!   # Devices of two fleets, JSON Lines to stdout
//!   fleet-report --fleet north=KEY1 --fleet south=KEY2 devices
//!
//!   # Stops by driver for one day
//!   fleet-report --fleet north=KEY1 stops \
//!       --begin 2024-03-01T00:00:00-03:00 --end 2024-03-02T00:00:00-03:00
//!
//!   # Points of collection, 50 per page, written to a file
//!   fleet-report --fleet north=KEY1 --output pocs.jsonl pocs \
//!       --start 2024-03-01T00:00:00Z --end 2024-03-08T00:00:00Z --limit 50

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Parser, Subcommand};
use fleet_tables::fetch::{ClientConfig, Fetcher, Fleets, Pagination};
use fleet_tables::flatten::TableWriter;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "fleet-report")]
#[command(about = "Fetch fleet telemetry reports as flat tables", long_about = None)]
struct Args {
    /// Fleet credentials as NAME=API_KEY (repeatable; fetched in this order)
    #[arg(long = "fleet", value_name = "NAME=KEY", required = true, value_parser = parse_fleet)]
    fleets: Vec<(String, String)>,

    /// API root URL
    #[arg(long, env = "FLEET_API_BASE_URL")]
    base_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, env = "FLEET_API_TIMEOUT_SECS")]
    timeout: Option<u64>,

    /// Timezone sent with stop reports
    #[arg(long, env = "FLEET_API_TIMEZONE")]
    timezone: Option<String>,

    /// Write JSON Lines here instead of stdout
    #[arg(long, short = 'o')]
    output: Option<String>,

    /// Leave null cells out of the output rows
    #[arg(long)]
    omit_nulls: bool,

    #[command(subcommand)]
    report: Report,
}

#[derive(Subcommand, Debug)]
enum Report {
    /// Stop statistics per driver
    Stops {
        /// Start of the window (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        begin: DateTime<FixedOffset>,

        /// End of the window (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        end: DateTime<FixedOffset>,
    },

    /// Device list
    Devices,

    /// Points of collection, fetched page by page
    Pocs {
        /// Start of the window (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        start: DateTime<FixedOffset>,

        /// End of the window (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        end: DateTime<FixedOffset>,

        /// Page size (default: 1)
        #[arg(long)]
        limit: Option<u64>,

        /// Offset of the first page (default: 0)
        #[arg(long)]
        offset: Option<u64>,
    },
}

fn parse_fleet(s: &str) -> Result<(String, String), String> {
    let (name, key) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=KEY, got '{}'", s))?;
    if name.is_empty() || key.is_empty() {
        return Err(format!("fleet name and key must be non-empty in '{}'", s));
    }
    Ok((name.to_string(), key.to_string()))
}

fn parse_time(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| format!("invalid RFC 3339 time '{}': {}", s, e))
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

    // Build config: environment defaults, then flags
    let mut config = ClientConfig::from_env();
    if let Some(url) = args.base_url {
        config = config.with_base_url(url);
    }
    if let Some(secs) = args.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }
    if let Some(tz) = args.timezone {
        config = config.with_timezone(tz);
    }

    let fleets: Fleets = args.fleets.into_iter().collect();
    let fetcher = Fetcher::new(config).context("Failed to set up HTTP client")?;

    let table = match args.report {
        Report::Stops { begin, end } => {
            if end < begin {
                return Err(anyhow!("--end is before --begin"));
            }
            fetcher.stops_by_driver(&fleets, &begin, &end)?
        }
        Report::Devices => fetcher.devices(&fleets)?,
        Report::Pocs {
            start,
            end,
            limit,
            offset,
        } => {
            let defaults = Pagination::default();
            let pagination = Pagination {
                offset: offset.unwrap_or(defaults.offset),
                limit: limit.unwrap_or(defaults.limit),
            };
            fetcher.points_of_collection(&fleets, &start, &end, pagination)?
        }
    };

    let out: Box<dyn Write> = if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(std::io::stdout().lock())
    };

    let mut writer = TableWriter::new(out).omit_nulls(args.omit_nulls);
    let written = writer.write_table(&table)?;
    writer.flush()?;
    info!(rows = written, columns = table.num_columns(), "report written");

    Ok(())
}
