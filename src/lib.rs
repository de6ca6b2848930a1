//! # Fleet Tables - fleet telemetry as flat tables
//!
//! Pulls report resources from the fleet telemetry API for any number of
//! fleets and turns the nested JSON responses into one flat table per
//! report.
//!
//! ## Modules
//!
//! - **flatten**: Turn nested JSON record batches into flat tables
//! - **fetch**: Per-fleet HTTP retrieval, fleet tagging, pagination
//! - **reports**: Stops-by-driver, devices and points-of-collection
//!
//! ## Quick Start
//!
//! ### Flattening
//!
//! ```rust
//! use fleet_tables::flatten_json;
//! use fleet_tables::flatten::FlattenConfig;
//! use serde_json::json;
//!
//! # fn main() -> anyhow::Result<()> {
//! let data = json!([
//!     {"driver": {"id": 7, "name": "Ana"}, "stops": [{"minutes": 12}, {"minutes": 3}]}
//! ]);
//!
//! let table = flatten_json(data, FlattenConfig::default())?;
//! assert_eq!(table.columns(), &["driver.id", "driver.name", "stops.minutes"]);
//! assert_eq!(table.num_rows(), 2);
//! # Ok(())
//! # }
//! ```
//!
//! ### Fetching a report
//!
//! ```rust,no_run
//! use fleet_tables::fetch::{ClientConfig, Fetcher, Fleets};
//!
//! # fn main() -> anyhow::Result<()> {
//! let fleets: Fleets = [("north", "api-key-1"), ("south", "api-key-2")]
//!     .into_iter()
//!     .collect();
//!
//! let fetcher = Fetcher::new(ClientConfig::from_env())?;
//! let devices = fetcher.devices(&fleets)?;
//! println!("{} devices", devices.num_rows());
//! # Ok(())
//! # }
//! ```

use serde_json::Value;

pub mod flatten;
pub mod fetch;
pub mod reports;

// Re-export commonly used types for convenience
pub use fetch::{ClientConfig, FetchError, Fetcher, Fleet, Fleets, Pagination};
pub use flatten::{FlattenConfig, Flattener, Table, TableWriter};

/// Flatten one JSON document (an array of records or an object envelope)
pub fn flatten_json(value: Value, config: FlattenConfig) -> Result<Table, flatten::BatchError> {
    let batch = flatten::batch_from_json(value)?;
    Ok(Flattener::new(config).flatten(batch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flatten_json() {
        let input = json!({
            "data": [
                {"id": 1, "location": {"lat": -23.5, "lng": -46.6}},
                {"id": 2, "location": {"lat": -22.9, "lng": -43.2}}
            ],
            "total": 2
        });

        let table = flatten_json(input, FlattenConfig::default()).unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(
            table.columns(),
            &["total", "data.id", "data.location.lat", "data.location.lng"]
        );
        assert_eq!(table.get(1, "data.location.lng"), Some(&json!(-43.2)));
    }

    #[test]
    fn test_flatten_json_rejects_scalars() {
        assert!(flatten_json(json!(42), FlattenConfig::default()).is_err());
    }
}
