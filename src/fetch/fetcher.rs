use crate::fetch::config::{ClientConfig, Fleet, Fleets, Pagination, QueryParams};
use crate::fetch::error::{FetchError, Result};
use crate::fetch::transport::{HttpTransport, Transport};
use crate::flatten::{batch_from_json, Flattener, Table};
use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Column added to every row, naming the fleet it came from
pub const FLEET_NAME_COLUMN: &str = "fleet_name";

/// Retrieves resources for a set of fleets and merges them into one table
///
/// One blocking GET per fleet (and per page, for paged resources). Rows
/// are tagged with their fleet and flattened per fleet, then tables are
/// concatenated in fleet order. The first failure aborts the whole call.
pub struct Fetcher<T = HttpTransport> {
    transport: T,
    config: ClientConfig,
    flattener: Flattener,
}

impl Fetcher<HttpTransport> {
    /// Create a fetcher backed by a blocking reqwest client
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Fetcher::with_transport(transport, config))
    }
}

impl<T: Transport> Fetcher<T> {
    pub fn with_transport(transport: T, config: ClientConfig) -> Self {
        Fetcher {
            transport,
            config,
            flattener: Flattener::default(),
        }
    }

    /// Use a differently configured flattener for responses
    pub fn with_flattener(mut self, flattener: Flattener) -> Self {
        self.flattener = flattener;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL of a resource with its query string
    pub fn resource_url(&self, resource: &str, query: &[(String, String)]) -> Result<Url> {
        let invalid = |reason: String| FetchError::InvalidUrl {
            url: format!("{}{}", self.config.base_url, resource),
            reason,
        };
        let base = Url::parse(&self.config.base_url).map_err(|e| invalid(e.to_string()))?;
        let mut url = base
            .join(resource.trim_start_matches('/'))
            .map_err(|e| invalid(e.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Fetch one resource for one fleet and flatten it
    pub fn fetch_fleet(&self, fleet: &Fleet, resource: &str, query: &[(String, String)]) -> Result<Table> {
        let url = self.resource_url(resource, query)?;
        debug!(fleet = %fleet.name, url = %url, "fetching resource");

        let headers = [
            (self.config.api_key_header.as_str(), fleet.api_key.as_str()),
            ("Content-Type", "application/json"),
        ];
        let response = self
            .transport
            .get(&url, &headers)
            .map_err(|source| FetchError::Transport {
                fleet: fleet.name.clone(),
                resource: resource.to_string(),
                source,
            })?;

        if response.status != 200 {
            warn!(fleet = %fleet.name, resource, status = response.status, "resource request failed");
            return Err(FetchError::RetrieveData {
                fleet: fleet.name.clone(),
                resource: resource.to_string(),
                status: response.status,
            });
        }

        let body: Value =
            serde_json::from_slice(&response.body).map_err(|source| FetchError::Decode {
                fleet: fleet.name.clone(),
                resource: resource.to_string(),
                source,
            })?;
        let mut batch = batch_from_json(body).map_err(|source| FetchError::InvalidResponse {
            fleet: fleet.name.clone(),
            resource: resource.to_string(),
            source,
        })?;

        if batch.is_empty() {
            debug!(fleet = %fleet.name, resource, "empty result set");
            return Ok(Table::new());
        }

        for record in &mut batch {
            record.insert(FLEET_NAME_COLUMN.to_string(), Value::String(fleet.name.clone()));
        }
        let table = self.flattener.flatten(batch);
        debug!(
            fleet = %fleet.name,
            resource,
            rows = table.num_rows(),
            columns = table.num_columns(),
            "flattened response"
        );
        Ok(table)
    }

    /// Fetch one resource for every fleet, concatenated in fleet order
    pub fn fetch(&self, fleets: &Fleets, resource: &str, query: &[(String, String)]) -> Result<Table> {
        let mut table = Table::new();
        for fleet in fleets {
            table.append(self.fetch_fleet(fleet, resource, query)?);
        }
        info!(resource, fleets = fleets.len(), rows = table.num_rows(), "fetched resource");
        Ok(table)
    }

    /// Fetch a paged resource until a page comes back empty for all fleets
    ///
    /// Each page queries every fleet with the current `limit`/`offset`,
    /// then the offset advances by `limit`. A zero limit is sent and
    /// stepped as 1. Non-empty pages are concatenated in fetch order.
    pub fn fetch_paginated(
        &self,
        fleets: &Fleets,
        resource: &str,
        query: &[(String, String)],
        pagination: Pagination,
    ) -> Result<Table> {
        let step = pagination.limit.max(1);
        let mut offset = pagination.offset;
        let mut pages = 0u64;
        let mut result = Table::new();

        loop {
            let params = page_params(query, step, offset);
            let page = self.fetch(fleets, resource, &params)?;
            if page.is_empty() {
                break;
            }
            debug!(resource, offset, rows = page.num_rows(), "fetched page");
            result.append(page);
            pages += 1;
            offset = offset.saturating_add(step);
        }

        info!(resource, pages, rows = result.num_rows(), "fetched paged resource");
        Ok(result)
    }
}

/// The caller's query followed by `limit` and `offset`
fn page_params(query: &[(String, String)], limit: u64, offset: u64) -> QueryParams {
    let mut params: QueryParams = query
        .iter()
        .filter(|(k, _)| k != "limit" && k != "offset")
        .cloned()
        .collect();
    params.push(("limit".to_string(), limit.to_string()));
    params.push(("offset".to_string(), offset.to_string()));
    params
}
