use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, UPDATED_AT};
use crate::error::{PlannerError, Result};

/// In-memory document store for testing and local development.
///
/// Collections keep insertion order, so queries return documents in the
/// order they were created.
#[derive(Default)]
pub struct MemoryStore {
    collections: tokio::sync::RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    /// Create a new in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn is_empty(&self, collection: &str) -> bool {
        self.len(collection).await == 0
    }
}

fn into_object(record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(PlannerError::store(format!(
            "documents must be JSON objects, got {}",
            other
        ))),
    }
}

fn stamp(mut map: Map<String, Value>) -> Value {
    map.insert(UPDATED_AT.to_string(), Value::String(Utc::now().to_rfc3339()));
    Value::Object(map)
}

fn field_equals(data: &Value, field: &str, value: &str) -> bool {
    match data.get(field) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create(&self, collection: &str, record: Value) -> Result<Document> {
        let document = Document {
            id: Uuid::new_v4().to_string(),
            data: stamp(into_object(record)?),
        };
        debug!(collection, id = %document.id, "memory store create");

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<()> {
        let data = stamp(into_object(record)?);
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();
        match documents.iter_mut().find(|doc| doc.id == id) {
            Some(existing) => existing.data = data,
            None => documents.push(Document {
                id: id.to_string(),
                data,
            }),
        }
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id))
            .cloned())
    }

    async fn query(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|doc| field_equals(&doc.data, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        let patch = into_object(patch)?;
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.iter_mut().find(|doc| doc.id == id))
            .ok_or(PlannerError::NotFound)?;

        let mut data = into_object(document.data.take())?;
        data.extend(patch);
        document.data = stamp(data);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(documents) = collections.get_mut(collection) {
            documents.retain(|doc| doc.id != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_create_assigns_id_and_timestamp() {
        let store = MemoryStore::new();
        let doc = store
            .create("itineraries", json!({"title": "Paris Trip", "userId": "a"}))
            .await
            .unwrap();

        assert!(Uuid::parse_str(&doc.id).is_ok());
        assert!(doc.data[UPDATED_AT].is_string());
        assert_eq!(store.len("itineraries").await, 1);

        let fetched = store.get("itineraries", &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
    }

    #[tokio::test]
    async fn test_query_by_field() {
        let store = MemoryStore::new();
        store
            .create("itineraries", json!({"title": "one", "userId": "a"}))
            .await
            .unwrap();
        store
            .create("itineraries", json!({"title": "two", "userId": "b"}))
            .await
            .unwrap();
        store
            .create("itineraries", json!({"title": "three", "userId": "a"}))
            .await
            .unwrap();

        let titles: Vec<_> = store
            .query("itineraries", "userId", "a")
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.data["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, vec!["one", "three"]);
        assert!(store.query("missing", "userId", "a").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_merges_and_rejects_missing() {
        let store = MemoryStore::new();
        let doc = store
            .create("itineraries", json!({"title": "Paris Trip", "isFavorite": false}))
            .await
            .unwrap();

        store
            .update("itineraries", &doc.id, json!({"isFavorite": true}))
            .await
            .unwrap();
        let updated = store.get("itineraries", &doc.id).await.unwrap().unwrap();
        assert_eq!(updated.data["isFavorite"], true);
        assert_eq!(updated.data["title"], "Paris Trip");

        assert!(matches!(
            store.update("itineraries", "nope", json!({})).await,
            Err(PlannerError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_set_and_delete() {
        let store = MemoryStore::new();
        store
            .set("Users", "uid-1", json!({"email": "a@example.com", "name": "Ada"}))
            .await
            .unwrap();
        store
            .set("Users", "uid-1", json!({"email": "a@example.com", "name": "Ada L."}))
            .await
            .unwrap();
        assert_eq!(store.len("Users").await, 1);
        let profile = store.get("Users", "uid-1").await.unwrap().unwrap();
        assert_eq!(profile.data["name"], "Ada L.");

        store.delete("Users", "uid-1").await.unwrap();
        assert!(store.get("Users", "uid-1").await.unwrap().is_none());
        assert!(store.is_empty("Users").await);
    }

    #[tokio::test]
    async fn test_rejects_non_object_records() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.create("itineraries", json!([1, 2])).await,
            Err(PlannerError::Store(_))
        ));
    }
}
