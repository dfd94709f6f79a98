//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::Extensions;
use serde::de::DeserializeOwned;

use crate::method::Method;

/// An incoming HTTP request with its body fully collected.
///
/// Path parameters are filled in by the router; extensions carry values that
/// middleware attaches for the handler (the resolved collection, for one).
pub struct Request {
    method: Method,
    path: String,
    body: Bytes,
    pub(crate) params: HashMap<String, String>,
    extensions: Extensions,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            method,
            path: path.into(),
            body: body.into(),
            params: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Returns a named path parameter, percent-decoded.
    ///
    /// For a route `/collections/{name}`, `req.param("name")` on
    /// `/collections/products` returns `Some("products")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Deserialises the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(value);
    }
}
