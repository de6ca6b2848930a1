//! Error types for fetching fleet data

use crate::flatten::BatchError;
use thiserror::Error;

/// Error raised by a transport that produced no HTTP response
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Errors from fetch operations
///
/// Every variant raised during a fetch names the fleet and resource
/// involved. Nothing is retried; an error aborts the whole aggregation.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered, but not with success
    #[error("could not retrieve data for fleet {fleet} from resource {resource}. Status: {status}")]
    RetrieveData {
        fleet: String,
        resource: String,
        status: u16,
    },

    /// The request never produced a response (connection, timeout)
    #[error("request for fleet {fleet} to resource {resource} failed: {source}")]
    Transport {
        fleet: String,
        resource: String,
        #[source]
        source: TransportError,
    },

    /// The response body is not JSON
    #[error("response for fleet {fleet} from resource {resource} is not valid JSON: {source}")]
    Decode {
        fleet: String,
        resource: String,
        #[source]
        source: serde_json::Error,
    },

    /// The response body is JSON but not a set of records
    #[error("response for fleet {fleet} from resource {resource} has an unexpected shape: {source}")]
    InvalidResponse {
        fleet: String,
        resource: String,
        #[source]
        source: BatchError,
    },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl FetchError {
    /// HTTP status of a failed remote call, if the API answered
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::RetrieveData { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Fleet the failing call was made for
    pub fn fleet(&self) -> Option<&str> {
        match self {
            FetchError::RetrieveData { fleet, .. }
            | FetchError::Transport { fleet, .. }
            | FetchError::Decode { fleet, .. }
            | FetchError::InvalidResponse { fleet, .. } => Some(fleet.as_str()),
            FetchError::InvalidUrl { .. } | FetchError::Client(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;
