//! # docgate
//!
//! A thin HTTP gateway for create/read/update/delete over any named
//! collection of a MongoDB database.
//!
//! Every request is one route lookup, one collection resolution and one
//! store call:
//!
//! ```text
//! GET /collections/lessons/65f0…beef
//!   → Router (matchit, one tree per method)
//!   → CollectionResolver binds `lessons` (500 if the store is not connected)
//!   → collections::get_one → Collection::find_by_id → DocumentStore
//! ```
//!
//! What the gateway does not do: authentication, schema validation beyond the
//! `orders` presence checks, transactions, pagination cursors, retries.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use docgate::{collections, Config, Connection, MongoStore, Server};
//!
//! #[tokio::main]
//! async fn main() -> docgate::Result<()> {
//!     let config = Config::from_env_file("conf/db.env")?;
//!     let store = MongoStore::connect(&config.db).await?;
//!
//!     let app = collections::routes(Connection::connected(store), config.not_found);
//!     Server::bind(config.listen_addr).serve(app).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod collections;
pub mod config;
pub mod connection;
pub mod health;
pub mod middleware;
pub mod orders;
pub mod store;

pub use config::{Config, DbConfig, NotFoundPolicy};
pub use connection::{Collection, Connection};
pub use error::{Error, Result};
pub use handler::{BoxFuture, Handler};
pub use method::Method;
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use status::Status;
pub use store::{Document, DocumentStore, InMemoryStore, MongoStore};

/// Crate version, logged at startup.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
