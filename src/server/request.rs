use http::Method;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::RequestId;

/// Maximum inline headers before heap allocation.
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage shared by [`Request`] and [`super::Response`].
///
/// Names are `Arc<str>` because the same few names repeat on every request.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Inbound request as seen by handlers and middleware.
///
/// The dispatch core only reads `method` and `path`; everything else is
/// carried for the application.
#[derive(Debug, Clone)]
pub struct Request {
    /// Correlation id, taken from `x-request-id` when valid
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Percent-decoded path without the query string
    pub path: String,
    /// Decoded query string parameters
    pub query: HashMap<String, String>,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Raw request body
    pub body: Vec<u8>,
}

impl Request {
    /// Build a request from a method and a path with optional query string.
    ///
    /// The path is percent-decoded before routing, so `%2F` becomes a
    /// segment separator. A path that does not decode to UTF-8 is kept as
    /// sent.
    #[must_use]
    pub fn new(method: Method, uri: &str) -> Self {
        let (path, query) = match uri.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (uri, HashMap::new()),
        };
        Self {
            request_id: RequestId::generate(),
            method,
            path: decode_path(path),
            query,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    #[must_use]
    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    /// Add a header. `x-request-id` also replaces the request id when it
    /// parses as a ULID.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("x-request-id") {
            if let Some(id) = RequestId::adopt(&value) {
                self.request_id = id;
            }
        }
        self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Lower-cased method name, the key used for resource operations and
    /// allow-lists.
    #[must_use]
    pub fn method_name(&self) -> String {
        self.method.as_str().to_ascii_lowercase()
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_slice(&self.body)
    }
}

fn decode_path(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), Cow::into_owned)
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}
