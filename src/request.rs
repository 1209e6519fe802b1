//! Outbound fetch request type.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::Method;

/// An outbound request travelling through the middleware chain.
///
/// Cloning is cheap: the body is a reference-counted [`Bytes`] buffer. Every
/// hook receives its own clone, so a hook that wants a different request
/// returns a new one instead of mutating the one it was handed.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Bytes,
    pub(crate) meta: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Bytes::new(),
            meta: BTreeMap::new(),
        }
    }

    /// `GET url` with no headers and an empty body.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Attach a metadata entry. Metadata never leaves the process; it is how
    /// middlewares pass hints to each other and to the transport.
    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn url(&self) -> &str { &self.url }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}
