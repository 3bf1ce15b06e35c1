//! Owner-enforced access to itineraries
//!
//! Every call takes the caller's [`Identity`]. A record that belongs to
//! someone else is indistinguishable from one that does not exist: both are
//! [`PlannerError::NotFound`].

use std::sync::Arc;

use serde_json::json;
use tracing::{debug, warn};

use crate::error::{PlannerError, Result};
use crate::model::{Itinerary, ITINERARIES};
use crate::session::Identity;
use crate::store::{Document, DocumentStore};

#[derive(Clone)]
pub struct ItineraryRepository {
    store: Arc<dyn DocumentStore>,
}

impl ItineraryRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    fn owned_by(document: &Document, owner: &Identity) -> bool {
        document.data.get("userId").and_then(|v| v.as_str()) == Some(owner.uid.as_str())
    }

    /// All itineraries of `owner`. Documents that fail to decode are skipped.
    pub async fn list(&self, owner: &Identity) -> Result<Vec<Itinerary>> {
        let documents = self.store.query(ITINERARIES, "userId", &owner.uid).await?;
        debug!(uid = %owner.uid, count = documents.len(), "fetched itineraries");

        let itineraries = documents
            .into_iter()
            .filter(|doc| Self::owned_by(doc, owner))
            .filter_map(|doc| {
                let id = doc.id.clone();
                match Itinerary::from_document(doc) {
                    Ok(itinerary) => Some(itinerary),
                    Err(err) => {
                        warn!(%id, error = %err, "skipping malformed itinerary");
                        None
                    }
                }
            })
            .collect();
        Ok(itineraries)
    }

    async fn owned_document(&self, owner: &Identity, id: &str) -> Result<Document> {
        match self.store.get(ITINERARIES, id).await? {
            Some(document) if Self::owned_by(&document, owner) => Ok(document),
            Some(_) => {
                warn!(uid = %owner.uid, %id, "itinerary belongs to another user");
                Err(PlannerError::NotFound)
            }
            None => Err(PlannerError::NotFound),
        }
    }

    pub async fn fetch(&self, owner: &Identity, id: &str) -> Result<Itinerary> {
        Itinerary::from_document(self.owned_document(owner, id).await?)
    }

    /// Persists a new itinerary owned by `owner` and returns it with its id.
    pub async fn create(&self, owner: &Identity, mut itinerary: Itinerary) -> Result<Itinerary> {
        itinerary.user_id = owner.uid.clone();
        let document = self
            .store
            .create(ITINERARIES, serde_json::to_value(&itinerary)?)
            .await?;
        debug!(id = %document.id, "itinerary created");
        Itinerary::from_document(document)
    }

    pub async fn set_favorite(&self, owner: &Identity, id: &str, value: bool) -> Result<()> {
        self.owned_document(owner, id).await?;
        self.store
            .update(ITINERARIES, id, json!({ "isFavorite": value }))
            .await
    }

    pub async fn delete(&self, owner: &Identity, id: &str) -> Result<()> {
        self.owned_document(owner, id).await?;
        self.store.delete(ITINERARIES, id).await
    }
}
