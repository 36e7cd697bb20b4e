use serde::Serialize;
use std::sync::Arc;

use super::request::HeaderVec;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const TEXT_HTML: &str = "text/html; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

pub(crate) fn status_reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Mutable response accumulator handed to handlers.
///
/// Handlers produce output only through side effects on this value. A fresh
/// response is status 200 with no headers and an empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// HTTP response headers
    pub headers: HeaderVec,
    /// Response body
    pub body: Vec<u8>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: Vec::new(),
        }
    }

    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    #[must_use]
    pub fn status_reason(&self) -> &'static str {
        status_reason(self.status)
    }

    /// Plain-text body.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.body = text.into().into_bytes();
        self.set_content_type(TEXT_PLAIN);
    }

    /// HTML body, typically the output of [`crate::Templates::render`].
    pub fn set_html(&mut self, html: impl Into<String>) {
        self.body = html.into().into_bytes();
        self.set_content_type(TEXT_HTML);
    }

    /// Serialize `value` as the JSON body.
    pub fn set_json<T: Serialize + ?Sized>(&mut self, value: &T) -> serde_json::Result<()> {
        self.body = serde_json::to_vec(value)?;
        self.set_content_type(APPLICATION_JSON);
        Ok(())
    }

    /// Raw body; pair with [`Response::set_content_type`].
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn set_content_type(&mut self, content_type: &str) {
        self.set_header("content-type", content_type.to_string());
    }

    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: String) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name.to_ascii_lowercase()), value));
    }

    /// Body decoded as UTF-8, lossy.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_slice(&self.body)
    }

    /// Turn this response into the not-found outcome.
    pub(crate) fn not_found(&mut self) {
        self.status = 404;
        self.set_text("Not found.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_reason() {
        assert_eq!(status_reason(200), "OK");
        assert_eq!(status_reason(404), "Not Found");
        assert_eq!(status_reason(405), "Method Not Allowed");
    }

    #[test]
    fn test_default_is_empty_200() {
        let res = Response::default();
        assert_eq!(res.status, 200);
        assert!(res.body.is_empty());
        assert!(res.headers.is_empty());
    }

    #[test]
    fn test_text_helper_sets_content_type() {
        let mut res = Response::new();
        res.set_text("Just Plain Text");
        assert_eq!(res.text(), "Just Plain Text");
        assert!(res.content_type().unwrap().contains("text/plain"));
    }

    #[test]
    fn test_json_helper() {
        let mut res = Response::new();
        res.set_json(&json!({ "name": "sengoku" })).unwrap();
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.json().unwrap()["name"], "sengoku");
    }

    #[test]
    fn test_manual_body_and_content_type() {
        let mut res = Response::new();
        res.set_body(b"Byte Body".to_vec());
        res.set_content_type("text/plain");
        assert_eq!(res.text(), "Byte Body");
        assert_eq!(res.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_set_header_replaces_existing() {
        let mut res = Response::new();
        res.set_html("<p>a</p>");
        res.set_header("Content-Type", "text/html".to_string());
        assert_eq!(res.headers.len(), 1);
        assert_eq!(res.content_type(), Some("text/html"));
    }
}
