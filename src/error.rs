//! Unified error type.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// The error type returned by docgate's fallible operations.
///
/// Handler-level outcomes (404, 400, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values. This type surfaces infrastructure
/// failures: loading configuration, binding a port, talking to the store.
#[derive(Debug, Error)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Server
    // -------------------------------------------------------------------------
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address `{0}`")]
    InvalidAddr(String),

    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Document store
    // -------------------------------------------------------------------------
    #[error("invalid document identifier `{0}`")]
    InvalidId(String),

    #[error("document store error: {0}")]
    Store(String),

    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("bson encoding: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
}
