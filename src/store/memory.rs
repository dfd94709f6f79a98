//! In-memory backend.
//!
//! Same contract as the MongoDB backend, without a server: collections are
//! created on first insert, natural order is insertion order, identifiers are
//! freshly minted object ids, and sorting follows MongoDB's cross-type order.

use std::cmp::Ordering;
use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::handler::BoxFuture;
use crate::store::{
    parse_id, DeleteOutcome, Document, DocumentStore, InsertOutcome, SortDirection, SortedQuery,
    UpdateOutcome, ID_FIELD,
};

/// A [`DocumentStore`] held entirely in process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(docs: &[Document], id: &Value) -> Option<usize> {
        docs.iter().position(|d| d.get(ID_FIELD) == Some(id))
    }
}

impl DocumentStore for InMemoryStore {
    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async { Ok(()) })
    }

    fn find_all<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
        Box::pin(async move {
            Ok(self.collections.read().get(collection).cloned().unwrap_or_default())
        })
    }

    fn find_sorted<'a>(
        &'a self,
        collection: &'a str,
        query: &'a SortedQuery,
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        Box::pin(async move {
            let mut docs = self.collections.read().get(collection).cloned().unwrap_or_default();
            docs.sort_by(|a, b| {
                let ord = compare_values(a.get(&query.field), b.get(&query.field));
                match query.direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            });
            docs.truncate(query.limit as usize);
            Ok(docs)
        })
    }

    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>> {
        Box::pin(async move {
            let key = Value::String(parse_id(id)?.to_hex());
            let collections = self.collections.read();
            let Some(docs) = collections.get(collection) else {
                return Ok(None);
            };
            Ok(Self::position(docs, &key).map(|i| docs[i].clone()))
        })
    }

    fn insert_one<'a>(
        &'a self,
        collection: &'a str,
        doc: Document,
    ) -> BoxFuture<'a, Result<InsertOutcome>> {
        Box::pin(async move {
            let mut collections = self.collections.write();
            let docs = collections.entry(collection.to_owned()).or_default();

            let (id, stored) = match doc.get(ID_FIELD).cloned() {
                Some(id) => {
                    if Self::position(docs, &id).is_some() {
                        return Err(Error::Store(format!("duplicate key {ID_FIELD}: {id}")));
                    }
                    (id, doc)
                }
                None => {
                    let id = Value::String(ObjectId::new().to_hex());
                    let mut stored = Document::new();
                    stored.insert(ID_FIELD.to_owned(), id.clone());
                    stored.extend(doc);
                    (id, stored)
                }
            };

            docs.push(stored);
            Ok(InsertOutcome { acknowledged: true, inserted_id: id })
        })
    }

    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Document,
    ) -> BoxFuture<'a, Result<UpdateOutcome>> {
        Box::pin(async move {
            let key = Value::String(parse_id(id)?.to_hex());
            if fields.get(ID_FIELD).is_some_and(|v| v != &key) {
                return Err(Error::Store(format!("field '{ID_FIELD}' is immutable")));
            }

            let unmatched = UpdateOutcome { matched: 0, modified: 0 };
            let mut collections = self.collections.write();
            let Some(docs) = collections.get_mut(collection) else {
                return Ok(unmatched);
            };
            let Some(i) = Self::position(docs, &key) else {
                return Ok(unmatched);
            };

            let doc = &mut docs[i];
            let mut modified = false;
            for (field, value) in fields {
                if doc.get(&field) != Some(&value) {
                    doc.insert(field, value);
                    modified = true;
                }
            }
            Ok(UpdateOutcome { matched: 1, modified: u64::from(modified) })
        })
    }

    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<DeleteOutcome>> {
        Box::pin(async move {
            let key = Value::String(parse_id(id)?.to_hex());
            let mut collections = self.collections.write();
            let removed = collections
                .get_mut(collection)
                .and_then(|docs| Self::position(docs, &key).map(|i| docs.remove(i)));
            Ok(DeleteOutcome { deleted: u64::from(removed.is_some()) })
        })
    }
}

/// MongoDB's cross-type ordering, with a missing field sorting as null.
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Bool(_)) => 8,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn id_of(outcome: &InsertOutcome) -> &str {
        outcome.inserted_id.as_str().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_an_object_id_and_find_returns_it() {
        let store = InMemoryStore::new();
        let outcome = store.insert_one("products", doc(json!({ "title": "Widget" }))).await.unwrap();

        assert!(outcome.acknowledged);
        assert!(parse_id(id_of(&outcome)).is_ok());

        let found = store.find_by_id("products", id_of(&outcome)).await.unwrap().unwrap();
        assert_eq!(Value::Object(found), json!({ "_id": id_of(&outcome), "title": "Widget" }));
    }

    #[tokio::test]
    async fn unknown_collections_are_empty() {
        let store = InMemoryStore::new();
        assert!(store.find_all("nothing").await.unwrap().is_empty());
        assert!(store.find_by_id("nothing", "65f0c0ffee0000000000beef").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_ids_are_rejected_before_lookup() {
        let store = InMemoryStore::new();
        assert!(matches!(store.find_by_id("c", "xyz").await, Err(Error::InvalidId(_))));
        assert!(matches!(store.delete_by_id("c", "xyz").await, Err(Error::InvalidId(_))));
        assert!(matches!(store.update_by_id("c", "xyz", doc(json!({ "a": 1 }))).await, Err(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn update_merges_fields_and_reports_modification() {
        let store = InMemoryStore::new();
        let outcome = store.insert_one("c", doc(json!({ "a": 1, "b": 2 }))).await.unwrap();
        let id = id_of(&outcome);

        let first = store.update_by_id("c", id, doc(json!({ "b": 3, "c": 4 }))).await.unwrap();
        assert_eq!(first, UpdateOutcome { matched: 1, modified: 1 });
        let again = store.update_by_id("c", id, doc(json!({ "b": 3, "c": 4 }))).await.unwrap();
        assert_eq!(again, UpdateOutcome { matched: 1, modified: 0 });

        let found = store.find_by_id("c", id).await.unwrap().unwrap();
        assert_eq!(Value::Object(found), json!({ "_id": id, "a": 1, "b": 3, "c": 4 }));
    }

    #[tokio::test]
    async fn empty_update_is_a_matched_no_op() {
        let store = InMemoryStore::new();
        let outcome = store.insert_one("c", doc(json!({ "a": 1 }))).await.unwrap();
        let id = id_of(&outcome);

        let result = store.update_by_id("c", id, Document::new()).await.unwrap();
        assert_eq!(result, UpdateOutcome { matched: 1, modified: 0 });
        let missing = store.update_by_id("c", "65f0c0ffee0000000000beef", Document::new()).await.unwrap();
        assert_eq!(missing, UpdateOutcome { matched: 0, modified: 0 });
    }

    #[tokio::test]
    async fn update_rejects_id_changes() {
        let store = InMemoryStore::new();
        let outcome = store.insert_one("c", doc(json!({ "a": 1 }))).await.unwrap();
        let id = id_of(&outcome);

        let other = json!({ "_id": "65f0c0ffee0000000000beef" });
        assert!(matches!(store.update_by_id("c", id, doc(other)).await, Err(Error::Store(_))));
    }

    #[tokio::test]
    async fn delete_removes_at_most_one() {
        let store = InMemoryStore::new();
        let outcome = store.insert_one("c", doc(json!({ "a": 1 }))).await.unwrap();
        let id = id_of(&outcome).to_owned();

        assert_eq!(store.delete_by_id("c", &id).await.unwrap().deleted, 1);
        assert_eq!(store.delete_by_id("c", &id).await.unwrap().deleted, 0);
        assert!(store.find_all("c").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_client_ids_are_refused() {
        let store = InMemoryStore::new();
        store.insert_one("c", doc(json!({ "_id": "fixed" }))).await.unwrap();
        assert!(matches!(
            store.insert_one("c", doc(json!({ "_id": "fixed" }))).await,
            Err(Error::Store(_))
        ));
    }

    #[tokio::test]
    async fn sorted_listing_orders_missing_fields_first_and_limits() {
        let store = InMemoryStore::new();
        for body in [json!({ "n": 3 }), json!({ "n": "x" }), json!({}), json!({ "n": 1.5 }), json!({ "n": true })] {
            store.insert_one("c", doc(body)).await.unwrap();
        }

        let asc = SortedQuery { limit: 10, field: "n".into(), direction: SortDirection::Ascending };
        let got: Vec<Option<Value>> = store.find_sorted("c", &asc).await.unwrap()
            .into_iter().map(|d| d.get("n").cloned()).collect();
        assert_eq!(got, [None, Some(json!(1.5)), Some(json!(3)), Some(json!("x")), Some(json!(true))]);

        let desc = SortedQuery { limit: 2, field: "n".into(), direction: SortDirection::Descending };
        let got: Vec<Option<Value>> = store.find_sorted("c", &desc).await.unwrap()
            .into_iter().map(|d| d.get("n").cloned()).collect();
        assert_eq!(got, [Some(json!(true)), Some(json!("x"))]);
    }
}
