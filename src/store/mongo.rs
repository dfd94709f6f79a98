//! MongoDB backend.

use mongodb::bson::{self, doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection as MongoCollection, Database};
use serde_json::Value;
use tracing::info;

use crate::config::DbConfig;
use crate::error::Result;
use crate::handler::BoxFuture;
use crate::store::{
    parse_id, DeleteOutcome, Document, DocumentStore, InsertOutcome, SortDirection, SortedQuery,
    UpdateOutcome, ID_FIELD,
};

/// A [`DocumentStore`] over one MongoDB database.
///
/// The driver owns connection pooling and is safe to share across tasks,
/// so this type is a thin wrapper around a [`Database`] handle.
#[derive(Clone, Debug)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Builds a client from `config`, pings the server, and binds the
    /// configured database. Fails if the server cannot be reached.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let client = Client::with_uri_str(config.connection_string()).await?;
        let db = client.database(&config.name);
        db.run_command(doc! { "ping": 1 }).await?;

        info!(database = %config.name, host = %config.url, "connected to MongoDB");
        Ok(Self { db })
    }

    fn collection(&self, name: &str) -> MongoCollection<bson::Document> {
        self.db.collection(name)
    }
}

impl DocumentStore for MongoStore {
    fn ping(&self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.db.run_command(doc! { "ping": 1 }).await?;
            Ok(())
        })
    }

    fn find_all<'a>(&'a self, collection: &'a str) -> BoxFuture<'a, Result<Vec<Document>>> {
        Box::pin(async move {
            let mut cursor = self.collection(collection).find(doc! {}).await?;
            let mut docs = Vec::new();
            while cursor.advance().await? {
                docs.push(to_json(cursor.deserialize_current()?));
            }
            Ok(docs)
        })
    }

    fn find_sorted<'a>(
        &'a self,
        collection: &'a str,
        query: &'a SortedQuery,
    ) -> BoxFuture<'a, Result<Vec<Document>>> {
        Box::pin(async move {
            let order: i32 = match query.direction {
                SortDirection::Ascending => 1,
                SortDirection::Descending => -1,
            };
            let mut sort = bson::Document::new();
            sort.insert(query.field.as_str(), order);
            let mut cursor = self.collection(collection)
                .find(doc! {})
                .sort(sort)
                .limit(i64::from(query.limit))
                .await?;
            let mut docs = Vec::new();
            while cursor.advance().await? {
                docs.push(to_json(cursor.deserialize_current()?));
            }
            Ok(docs)
        })
    }

    fn find_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Option<Document>>> {
        Box::pin(async move {
            let oid = parse_id(id)?;
            let found = self.collection(collection).find_one(id_filter(oid)).await?;
            Ok(found.map(to_json))
        })
    }

    fn insert_one<'a>(
        &'a self,
        collection: &'a str,
        doc: Document,
    ) -> BoxFuture<'a, Result<InsertOutcome>> {
        Box::pin(async move {
            let doc = bson::to_document(&doc)?;
            let result = self.collection(collection).insert_one(doc).await?;
            Ok(InsertOutcome {
                acknowledged: true,
                inserted_id: bson_to_json(result.inserted_id),
            })
        })
    }

    fn update_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
        fields: Document,
    ) -> BoxFuture<'a, Result<UpdateOutcome>> {
        Box::pin(async move {
            let oid = parse_id(id)?;
            let fields = bson::to_document(&fields)?;
            let result = self.collection(collection)
                .update_one(id_filter(oid), doc! { "$set": fields })
                .await?;
            Ok(UpdateOutcome {
                matched: result.matched_count,
                modified: result.modified_count,
            })
        })
    }

    fn delete_by_id<'a>(
        &'a self,
        collection: &'a str,
        id: &'a str,
    ) -> BoxFuture<'a, Result<DeleteOutcome>> {
        Box::pin(async move {
            let oid = parse_id(id)?;
            let result = self.collection(collection).delete_one(id_filter(oid)).await?;
            Ok(DeleteOutcome { deleted: result.deleted_count })
        })
    }
}

fn id_filter(oid: ObjectId) -> bson::Document {
    let mut filter = bson::Document::new();
    filter.insert(ID_FIELD, oid);
    filter
}

/// Converts a stored document to JSON. Object ids become plain hex strings;
/// other BSON-only types use relaxed extended JSON.
fn to_json(doc: bson::Document) -> Document {
    doc.into_iter().map(|(k, v)| (k, bson_to_json(v))).collect()
}

fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::Document(doc) => Value::Object(to_json(doc)),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_ids_render_as_hex_strings_at_any_depth() {
        let oid = ObjectId::parse_str("65f0c0ffee0000000000beef").unwrap();
        let stored = doc! {
            "_id": oid,
            "title": "Widget",
            "price": 9.99,
            "lesson": { "ref": oid },
            "refs": [oid],
        };

        assert_eq!(
            Value::Object(to_json(stored)),
            json!({
                "_id": "65f0c0ffee0000000000beef",
                "title": "Widget",
                "price": 9.99,
                "lesson": { "ref": "65f0c0ffee0000000000beef" },
                "refs": ["65f0c0ffee0000000000beef"],
            }),
        );
    }

    #[test]
    fn json_documents_encode_to_bson_in_field_order() {
        let body: Document = serde_json::from_str(r#"{"title":"Widget","price":9.99,"tags":["a"]}"#).unwrap();
        let encoded = bson::to_document(&body).unwrap();

        let keys: Vec<&str> = encoded.keys().map(String::as_str).collect();
        assert_eq!(keys, ["title", "price", "tags"]);
        assert_eq!(encoded.get_f64("price").unwrap(), 9.99);
    }
}
