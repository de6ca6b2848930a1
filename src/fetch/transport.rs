use crate::fetch::config::ClientConfig;
use crate::fetch::error::{FetchError, TransportError};
use reqwest::blocking::Client;
use reqwest::Url;
use std::fmt;

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }
}

/// Issues blocking GET requests
///
/// Any HTTP answer, whatever its status, is a successful `get`; errors are
/// reserved for requests that never got a response.
pub trait Transport {
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        (**self).get(url, headers)
    }
}

/// Blocking reqwest transport
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(HttpTransport { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
        let mut request = self.client.get(url.clone());
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let body = response.bytes()?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A request as seen by `FakeTransport`
    #[derive(Debug, Clone)]
    pub struct RecordedRequest {
        pub url: Url,
        pub headers: HashMap<String, String>,
    }

    impl RecordedRequest {
        pub fn query(&self) -> Vec<(String, String)> {
            self.url
                .query_pairs()
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect()
        }

        pub fn param(&self, name: &str) -> Option<String> {
            self.url
                .query_pairs()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.into_owned())
        }
    }

    type Handler = Box<dyn Fn(&RecordedRequest) -> Result<HttpResponse, TransportError>>;

    /// In-memory transport answering from a closure and recording requests
    pub struct FakeTransport {
        handler: Handler,
        pub requests: RefCell<Vec<RecordedRequest>>,
    }

    impl FakeTransport {
        pub fn new(
            handler: impl Fn(&RecordedRequest) -> Result<HttpResponse, TransportError> + 'static,
        ) -> Self {
            FakeTransport {
                handler: Box::new(handler),
                requests: RefCell::new(Vec::new()),
            }
        }

        /// Answer 200 with the given JSON for every request
        pub fn always(body: serde_json::Value) -> Self {
            let body = body.to_string();
            Self::new(move |_| Ok(HttpResponse::new(200, body.clone())))
        }

        pub fn request_count(&self) -> usize {
            self.requests.borrow().len()
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &Url, headers: &[(&str, &str)]) -> Result<HttpResponse, TransportError> {
            let request = RecordedRequest {
                url: url.clone(),
                headers: headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            };
            self.requests.borrow_mut().push(request.clone());
            (self.handler)(&request)
        }
    }
}
