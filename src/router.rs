//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Within a tree, matchit
//! ranks a static segment above a `{param}` segment at the same position, so
//! `/collections/orders` wins over `/collections/{name}` no matter which was
//! registered first.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;
use percent_encoding::percent_decode_str;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::trace;
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
/// Requests that match no route go to the fallback handler, which answers
/// `404 Not Found` with a plain-text body unless replaced.
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    fallback: BoxedHandler,
}

impl Router {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: not_found.into_boxed_handler(),
        }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are read with `req.param("name")`.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed or conflicts with an existing route.
    /// Routes are fixed at startup, so this surfaces as a boot failure.
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Get, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Post, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Put, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::Delete, path, handler)
    }

    /// Replace the handler used when no route matches.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = handler.into_boxed_handler();
        self
    }

    /// Routes one request and produces one response.
    pub async fn call(&self, mut req: Request) -> Response {
        let handler = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.params = params;
                handler
            }
            None => Arc::clone(&self.fallback),
        };
        trace::traced(handler, req).await
    }

    /// Path parameters come back percent-decoded. A parameter that does not
    /// decode to UTF-8 routes to a `400` handler instead of the match.
    fn lookup(
        &self,
        method: Method,
        path: &str,
    ) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;

        let mut params = HashMap::new();
        for (key, raw) in matched.params.iter() {
            let Ok(value) = percent_decode_str(raw).decode_utf8() else {
                return Some((invalid_param.into_boxed_handler(), HashMap::new()));
            };
            params.insert(key.to_owned(), value.into_owned());
        }
        Some((Arc::clone(matched.value), params))
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

async fn not_found(_req: Request) -> Response {
    Response::builder().status(Status::NotFound).text("not found")
}

async fn invalid_param(_req: Request) -> Response {
    Response::builder().status(Status::BadRequest).text("path parameter is not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn echo_name(req: Request) -> String {
        format!("param:{}", req.param("name").unwrap_or("-"))
    }

    async fn orders(_req: Request) -> &'static str {
        "orders"
    }

    #[tokio::test]
    async fn static_segment_wins_over_param_regardless_of_order() {
        let router = Router::new()
            .post("/collections/orders", orders)
            .post("/collections/{name}", echo_name);
        let reversed = Router::new()
            .post("/collections/{name}", echo_name)
            .post("/collections/orders", orders);

        for r in [&router, &reversed] {
            let res = r.call(Request::new(Method::Post, "/collections/orders", "")).await;
            assert_eq!(res.body(), b"orders");
            let res = r.call(Request::new(Method::Post, "/collections/lessons", "")).await;
            assert_eq!(res.body(), b"param:lessons");
        }
    }

    #[tokio::test]
    async fn unmatched_requests_reach_the_fallback() {
        let router = Router::new().get("/collections/{name}", echo_name);

        let res = router.call(Request::new(Method::Delete, "/collections/x", "")).await;
        assert_eq!(res.status_code(), Status::NotFound);
        assert_eq!(res.body(), b"not found");

        let res = router.call(Request::new(Method::Get, "/nope/a/b", "")).await;
        assert_eq!(res.status_code(), Status::NotFound);
    }

    #[tokio::test]
    async fn params_are_percent_decoded() {
        let router = Router::new().get("/collections/{name}", echo_name);

        let res = router.call(Request::new(Method::Get, "/collections/my%20stuff", "")).await;
        assert_eq!(res.body(), b"param:my stuff");

        let res = router.call(Request::new(Method::Get, "/collections/caf%C3%A9", "")).await;
        assert_eq!(res.body(), "param:café".as_bytes());
    }

    #[tokio::test]
    async fn undecodable_params_are_bad_requests() {
        let router = Router::new().get("/collections/{name}", echo_name);

        let res = router.call(Request::new(Method::Get, "/collections/%FF", "")).await;
        assert_eq!(res.status_code(), Status::BadRequest);
    }

    #[tokio::test]
    async fn custom_fallback_replaces_default() {
        let router = Router::new().fallback(|_req: Request| async { Status::NoContent });
        let res = router.call(Request::new(Method::Get, "/", "")).await;
        assert_eq!(res.status_code(), Status::NoContent);
    }
}
