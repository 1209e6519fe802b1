//! Fetched response type and its builder.

use bytes::Bytes;
use http::StatusCode;

// ── Response ─────────────────────────────────────────────────────────────────

/// A response produced by the transport or synthesised by a middleware.
///
/// ```rust
/// use sieve::Response;
/// use http::StatusCode;
///
/// Response::new("https://example.com/", StatusCode::OK);
///
/// Response::builder("https://example.com/cached")
///     .status(StatusCode::NOT_MODIFIED)
///     .header("x-cache", "hit")
///     .body(b"<html/>".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) url: String,
    pub(crate) status: StatusCode,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
}

impl Response {
    /// Response with no headers and an empty body.
    pub fn new(url: impl Into<String>, status: StatusCode) -> Self {
        Self { url: url.into(), status, headers: Vec::new(), body: Bytes::new() }
    }

    /// Builder for responses that need headers or a body. Defaults to `200 OK`.
    pub fn builder(url: impl Into<String>) -> ResponseBuilder {
        ResponseBuilder { url: url.into(), status: StatusCode::OK, headers: Vec::new() }
    }

    pub fn url(&self) -> &str { &self.url }
    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Terminated by [`body`](Self::body) or
/// [`no_body`](Self::no_body).
pub struct ResponseBuilder {
    url: String,
    status: StatusCode,
    headers: Vec<(String, String)>,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(self, body: impl Into<Bytes>) -> Response {
        Response { url: self.url, status: self.status, headers: self.headers, body: body.into() }
    }

    pub fn no_body(self) -> Response {
        self.body(Bytes::new())
    }
}
