//! Convenience accessors for the telemetry reports
//!
//! Each report is one resource fetched for every fleet and merged into a
//! single flat table.

use crate::fetch::{Fetcher, Fleets, Pagination, QueryParams, Result, Transport};
use crate::flatten::Table;
use chrono::{DateTime, TimeZone};

pub const STOPS_BY_DRIVER: &str = "herbie-1.1/stats/stops/driver";
pub const DEVICES: &str = "herbie-1.1/dash/device";
pub const POINTS_OF_COLLECTION: &str = "herbie-1.1/planning/pocs";

/// Unix timestamp in milliseconds, whole seconds only
pub fn unix_millis<Tz: TimeZone>(datetime: &DateTime<Tz>) -> i64 {
    datetime.timestamp() * 1000
}

impl<T: Transport> Fetcher<T> {
    /// Stop statistics per driver between `begin` and `end`
    pub fn stops_by_driver<Tz: TimeZone>(
        &self,
        fleets: &Fleets,
        begin: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> Result<Table> {
        let query: QueryParams = vec![
            ("begin".to_string(), unix_millis(begin).to_string()),
            ("end".to_string(), unix_millis(end).to_string()),
            ("tz".to_string(), self.config().timezone.clone()),
        ];
        self.fetch(fleets, STOPS_BY_DRIVER, &query)
    }

    /// Every device of every fleet
    pub fn devices(&self, fleets: &Fleets) -> Result<Table> {
        self.fetch(fleets, DEVICES, &[])
    }

    /// Points of collection planned between `start` and `end`, all pages
    pub fn points_of_collection<Tz: TimeZone>(
        &self,
        fleets: &Fleets,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
        pagination: Pagination,
    ) -> Result<Table> {
        let query: QueryParams = vec![
            ("startTimestamp".to_string(), unix_millis(start).to_string()),
            ("endTimestamp".to_string(), unix_millis(end).to_string()),
        ];
        self.fetch_paginated(fleets, POINTS_OF_COLLECTION, &query, pagination)
    }
}
