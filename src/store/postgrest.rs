use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::debug;
use trip_planner_auth::Auth;
use trip_planner_postgrest::PostgrestClient;

use super::{Document, DocumentStore, UPDATED_AT};
use crate::error::{PlannerError, Result};

// Postgres resolves this literal to the transaction timestamp when it is
// cast to timestamptz, so `updatedAt` is assigned by the server.
const SERVER_NOW: &str = "now";

/// Document store backed by the PostgREST API.
///
/// Each collection is a table with a text `id` primary key. Requests carry
/// the signed-in user's access token when there is one, otherwise the anon key.
#[derive(Clone)]
pub struct PostgrestStore {
    url: String,
    key: String,
    http_client: Client,
    auth: Option<Arc<Auth>>,
}

impl PostgrestStore {
    pub fn new(url: &str, key: &str, http_client: Client) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            http_client,
            auth: None,
        }
    }

    /// Authorise requests with the session held by `auth`
    pub fn with_auth(mut self, auth: Arc<Auth>) -> Self {
        self.auth = Some(auth);
        self
    }

    fn from(&self, collection: &str) -> Result<PostgrestClient> {
        let client = PostgrestClient::new(&self.url, &self.key, collection, self.http_client.clone())?;
        match self.auth.as_ref().and_then(|auth| auth.get_session()) {
            Some(session) => Ok(client.with_auth(&session.access_token)?),
            None => Ok(client),
        }
    }
}

fn object(record: Value) -> Result<Map<String, Value>> {
    match record {
        Value::Object(map) => Ok(map),
        other => Err(PlannerError::store(format!(
            "documents must be JSON objects, got {}",
            other
        ))),
    }
}

fn stamped(record: Value) -> Result<Value> {
    let mut map = object(record)?;
    map.insert(UPDATED_AT.to_string(), Value::String(SERVER_NOW.to_string()));
    Ok(Value::Object(map))
}

fn into_document(row: Value) -> Result<Document> {
    let id = match row.get("id") {
        Some(Value::String(id)) => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(PlannerError::store("row has no id column")),
    };
    Ok(Document { id, data: row })
}

fn returned_rows(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    }
}

#[async_trait]
impl DocumentStore for PostgrestStore {
    async fn create(&self, collection: &str, record: Value) -> Result<Document> {
        debug!(collection, "insert");
        let returned = self.from(collection)?.insert(stamped(record)?).await?;
        let row = returned_rows(returned)
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::store("insert returned no rows"))?;
        into_document(row)
    }

    async fn set(&self, collection: &str, id: &str, record: Value) -> Result<()> {
        debug!(collection, id, "upsert");
        let mut map = object(stamped(record)?)?;
        map.insert("id".to_string(), Value::String(id.to_string()));
        self.from(collection)?.upsert(Value::Object(map)).await?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        debug!(collection, id, "select one");
        let rows = self
            .from(collection)?
            .select("*")
            .eq("id", id)
            .limit(1)
            .execute::<Value>()
            .await?;
        rows.into_iter().next().map(into_document).transpose()
    }

    async fn query(&self, collection: &str, field: &str, value: &str) -> Result<Vec<Document>> {
        debug!(collection, field, "select where");
        let rows = self
            .from(collection)?
            .select("*")
            .eq(field, value)
            .execute::<Value>()
            .await?;
        rows.into_iter().map(into_document).collect()
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<()> {
        debug!(collection, id, "update");
        let returned = self
            .from(collection)?
            .eq("id", id)
            .update(stamped(patch)?)
            .await?;
        if returned_rows(returned).is_empty() {
            return Err(PlannerError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<()> {
        debug!(collection, id, "delete");
        self.from(collection)?.eq("id", id).delete().await?;
        Ok(())
    }
}
