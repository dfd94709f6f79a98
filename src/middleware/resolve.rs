//! Collection resolver.
//!
//! Wraps a route handler so that, before it runs, the collection named by the
//! request is bound onto the request's extensions:
//!
//! ```rust,no_run
//! # use docgate::{Connection, NotFoundPolicy, Request, Response, Router};
//! # use docgate::middleware::CollectionResolver;
//! # async fn list(_: Request) -> Response { Response::text("") }
//! # async fn insert_order(_: Request) -> Response { Response::text("") }
//! let resolver = CollectionResolver::new(Connection::absent(), NotFoundPolicy::Lenient);
//! Router::new()
//!     .get("/collections/{name}", resolver.from_param("name", list))
//!     .post("/collections/orders", resolver.fixed("orders", insert_order));
//! ```
//!
//! Handlers then read it with `req.extension::<Collection>()`. While the
//! store is disconnected the wrapped handler never runs and the request ends
//! with `500 Internal Server Error`.

use std::sync::Arc;

use serde_json::json;
use tracing::error;

use crate::config::NotFoundPolicy;
use crate::connection::Connection;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::{Json, Response};
use crate::status::Status;

#[derive(Clone, Copy, Debug)]
enum NameSource {
    Param(&'static str),
    Fixed(&'static str),
}

/// Binds collection accessors onto requests.
#[derive(Clone, Debug)]
pub struct CollectionResolver {
    connection: Connection,
    policy: NotFoundPolicy,
}

impl CollectionResolver {
    pub fn new(connection: Connection, policy: NotFoundPolicy) -> Self {
        Self { connection, policy }
    }

    /// Resolves the collection named by path parameter `param`.
    pub fn from_param<H: Handler>(&self, param: &'static str, handler: H) -> impl Handler + use<H> {
        self.wrap(NameSource::Param(param), handler)
    }

    /// Resolves the same collection on every request.
    pub fn fixed<H: Handler>(&self, name: &'static str, handler: H) -> impl Handler + use<H> {
        self.wrap(NameSource::Fixed(name), handler)
    }

    fn wrap<H: Handler>(&self, source: NameSource, handler: H) -> impl Handler + use<H> {
        let inner = handler.into_boxed_handler();
        let resolver = self.clone();
        move |mut req: Request| {
            let inner = Arc::clone(&inner);
            let bound = resolver.bind(&mut req, source);
            async move {
                match bound {
                    Ok(()) => inner.call(req).await,
                    Err(rejection) => rejection,
                }
            }
        }
    }

    fn bind(&self, req: &mut Request, source: NameSource) -> Result<(), Response> {
        let name = match source {
            NameSource::Param(param) => req.param(param).unwrap_or_default().to_owned(),
            NameSource::Fixed(name) => name.to_owned(),
        };
        if name.is_empty() {
            return Err(Response::builder().status(Status::NotFound).text("not found"));
        }

        let Some(collection) = self.connection.collection(&name) else {
            error!(collection = %name, "document store is not connected");
            return Err(Json(json!({ "error": "database not connected" }))
                .with_status(Status::InternalServerError));
        };

        req.insert_extension(collection);
        req.insert_extension(self.policy);
        Ok(())
    }
}
