//! Document store abstraction.
//!
//! [`DocumentStore`] is the seam between the HTTP layer and the database
//! driver. Each method maps to exactly one driver call. Two backends
//! implement it:
//!
//! - [`MongoStore`]: the MongoDB driver, used in production.
//! - [`InMemoryStore`]: maps behind a lock, used by tests and `--memory` runs.
//!
//! Documents cross the seam as ordered JSON maps with the identifier under
//! `_id` rendered as a 24-digit hex string.

pub mod memory;
pub mod mongo;

use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::handler::BoxFuture;

pub use memory::InMemoryStore;
pub use mongo::MongoStore;

/// A schema-less document: an ordered field-name → value map.
pub type Document = Map<String, Value>;

/// The field holding a document's identifier.
pub const ID_FIELD: &str = "_id";

/// Parses a path segment as a store identifier.
pub fn parse_id(id: &str) -> Result<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| Error::InvalidId(id.to_owned()))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Only the literal token `desc` sorts descending; anything else,
    /// `asc` and garbage included, sorts ascending.
    pub fn from_token(token: &str) -> Self {
        if token == "desc" { Self::Descending } else { Self::Ascending }
    }
}

/// A limited, sorted listing.
#[derive(Clone, Debug)]
pub struct SortedQuery {
    pub limit: u32,
    pub field: String,
    pub direction: SortDirection,
}

/// Outcome of an insert, serialised as the `201 Created` body.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOutcome {
    pub acknowledged: bool,
    pub inserted_id: Value,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeleteOutcome {
    pub deleted: u64,
}

/// A document database reachable by collection name.
///
/// Implementations must be safe to share across concurrent requests; the
/// gateway adds no locking of its own. Methods return boxed futures so the
/// trait stays object-safe behind `Arc<dyn DocumentStore>`.
pub trait DocumentStore: Send + Sync + 'static {
    /// Round-trips to the store to prove it is reachable.
    fn ping(&self) -> BoxFuture<'_, Result<()>>;

    /// Every document, in the store's natural order.
    fn find_all<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>>>;

    /// At most `query.limit` documents ordered by `query.field`.
    fn find_sorted<'a>(
        &'a self,
        collection: &'a str,
        query: &'a SortedQuery,
    ) -> BoxFuture<'a, Result<Vec<Document>>>;

    /// `Ok(None)` when no document carries the identifier;
    /// `Err(Error::InvalidId)` when `id` is not an identifier at all.
    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>>;

    /// Inserts `doc`; the store assigns `_id` unless the document carries one.
    fn insert_one<'a>(
        &'a self,
        collection: &'a str,
        doc: Document,
    ) -> BoxFuture<'a, Result<InsertOutcome>>;

    /// Sets each field of `fields` on the document with identifier `id`,
    /// leaving other fields untouched. An empty `fields` matches without
    /// modifying anything.
    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Document,
    ) -> BoxFuture<'a, Result<UpdateOutcome>>;

    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<DeleteOutcome>>;
}
