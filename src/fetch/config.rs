use std::fmt;
use std::time::Duration;

/// Default root of the fleet telemetry API
pub const DEFAULT_BASE_URL: &str = "https://api.cobli.co/";

/// Header carrying a fleet's API key
pub const DEFAULT_API_KEY_HEADER: &str = "Cobli-Api-Key";

/// Timezone sent with stop reports
pub const DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";

/// Ordered query-string pairs; encoded on the wire
pub type QueryParams = Vec<(String, String)>;

/// Configuration for talking to the telemetry API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root; always ends with `/` so resource paths join onto it
    pub base_url: String,

    /// Name of the per-fleet API key header
    pub api_key_header: String,

    /// Per-request timeout
    pub timeout: Duration,

    /// IANA timezone name passed to reports that take one
    pub timezone: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: Duration::from_secs(30),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl ClientConfig {
    /// Defaults overlaid with `FLEET_API_BASE_URL`, `FLEET_API_KEY_HEADER`,
    /// `FLEET_API_TIMEOUT_SECS` and `FLEET_API_TIMEZONE` when set
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ClientConfig::default();
        if let Some(url) = lookup("FLEET_API_BASE_URL") {
            config = config.with_base_url(url);
        }
        if let Some(header) = lookup("FLEET_API_KEY_HEADER") {
            config.api_key_header = header;
        }
        if let Some(secs) = lookup("FLEET_API_TIMEOUT_SECS").and_then(|s| s.trim().parse().ok()) {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(tz) = lookup("FLEET_API_TIMEZONE") {
            config.timezone = tz;
        }
        config
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        self.base_url = base_url;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }
}

/// A named fleet and the API key that authenticates it
#[derive(Clone, PartialEq, Eq)]
pub struct Fleet {
    pub name: String,
    pub api_key: String,
}

impl Fleet {
    pub fn new(name: impl Into<String>, api_key: impl Into<String>) -> Self {
        Fleet {
            name: name.into(),
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Fleet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fleet")
            .field("name", &self.name)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Fleets to query, in fetch order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleets(Vec<Fleet>);

impl Fleets {
    pub fn new() -> Self {
        Fleets::default()
    }

    /// Add a fleet; a fleet with the same name keeps its position and
    /// takes the new key
    pub fn insert(&mut self, name: impl Into<String>, api_key: impl Into<String>) {
        let fleet = Fleet::new(name, api_key);
        match self.0.iter_mut().find(|f| f.name == fleet.name) {
            Some(existing) => existing.api_key = fleet.api_key,
            None => self.0.push(fleet),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fleet> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>, K: Into<String>> FromIterator<(N, K)> for Fleets {
    fn from_iter<I: IntoIterator<Item = (N, K)>>(iter: I) -> Self {
        let mut fleets = Fleets::new();
        for (name, key) in iter {
            fleets.insert(name, key);
        }
        fleets
    }
}

impl<'a> IntoIterator for &'a Fleets {
    type Item = &'a Fleet;
    type IntoIter = std::slice::Iter<'a, Fleet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Offset/limit paging for resources that return results in pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Offset of the first page
    pub offset: u64,

    /// Page size; the offset advances by this much per page (at least 1)
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { offset: 0, limit: 1 }
    }
}
