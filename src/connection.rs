//! The process-wide store connection and per-collection accessors.
//!
//! A [`Connection`] starts out absent and becomes connected exactly once,
//! when the bootstrap establishes it. Clones share the same slot, so the
//! route table can be built before the store is reachable and every handler
//! sees the connection as soon as it exists.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::error::{Error, Result};
use crate::store::{
    DeleteOutcome, Document, DocumentStore, InsertOutcome, SortedQuery, UpdateOutcome,
};

/// Shared handle to the document store.
#[derive(Clone, Default)]
pub struct Connection {
    slot: Arc<OnceLock<Arc<dyn DocumentStore>>>,
}

impl Connection {
    /// A connection with no store behind it yet.
    pub fn absent() -> Self {
        Self::default()
    }

    /// A connection that is established from the start.
    pub fn connected(store: impl DocumentStore) -> Self {
        let conn = Self::absent();
        // A fresh slot is always empty.
        let _ = conn.slot.set(Arc::new(store));
        conn
    }

    /// Installs the store. A connection is established at most once.
    pub fn establish(&self, store: impl DocumentStore) -> Result<()> {
        self.slot
            .set(Arc::new(store))
            .map_err(|_| Error::Store("connection already established".to_owned()))
    }

    pub fn is_connected(&self) -> bool {
        self.slot.get().is_some()
    }

    /// The underlying store, if connected.
    pub fn store(&self) -> Option<&Arc<dyn DocumentStore>> {
        self.slot.get()
    }

    /// An accessor for the named collection, or `None` while disconnected.
    pub fn collection(&self, name: &str) -> Option<Collection> {
        self.slot.get().map(|store| Collection {
            name: Arc::from(name),
            store: Arc::clone(store),
        })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Read/write access to one named collection.
///
/// Cheap to clone; attached to each request by the collection resolver.
#[derive(Clone)]
pub struct Collection {
    name: Arc<str>,
    store: Arc<dyn DocumentStore>,
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn find_all(&self) -> Result<Vec<Document>> {
        self.store.find_all(&self.name).await
    }

    pub async fn find_sorted(&self, query: &SortedQuery) -> Result<Vec<Document>> {
        self.store.find_sorted(&self.name, query).await
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Document>> {
        self.store.find_by_id(&self.name, id).await
    }

    pub async fn insert_one(&self, doc: Document) -> Result<InsertOutcome> {
        self.store.insert_one(&self.name, doc).await
    }

    pub async fn update_by_id(&self, id: &str, fields: Document) -> Result<UpdateOutcome> {
        self.store.update_by_id(&self.name, id, fields).await
    }

    pub async fn delete_by_id(&self, id: &str) -> Result<DeleteOutcome> {
        self.store.delete_by_id(&self.name, id).await
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("name", &self.name).finish()
    }
}
