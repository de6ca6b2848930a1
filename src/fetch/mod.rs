//! Fetching fleet telemetry from the remote HTTP API
//!
//! One blocking request at a time: per fleet, and per page for paged
//! resources. Responses are tagged with their fleet, flattened and merged.

pub mod config;
pub mod error;
pub mod transport;
pub mod fetcher;

pub use config::{ClientConfig, Fleet, Fleets, Pagination, QueryParams};
pub use error::{FetchError, Result, TransportError};
pub use transport::{HttpResponse, HttpTransport, Transport};
pub use fetcher::{Fetcher, FLEET_NAME_COLUMN};
