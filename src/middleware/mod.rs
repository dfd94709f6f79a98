//! Middleware layer.
//!
//! Middleware wraps handlers and is the place for cross-cutting concerns:
//!
//! - [`resolve`] binds the collection named in the URL onto the request, or
//!   fails the request before the handler runs when the store is not
//!   connected.
//! - `trace` logs one line per dispatched request with method, path, status
//!   and latency. The router applies it to every request.

pub mod resolve;
pub(crate) mod trace;

pub use resolve::CollectionResolver;
