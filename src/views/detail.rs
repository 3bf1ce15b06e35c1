//! Single itinerary view

use tracing::error;

use crate::error::PlannerError;
use crate::guard::Route;
use crate::model::Itinerary;
use crate::notify::Outcome;
use crate::repository::ItineraryRepository;
use crate::session::Identity;

pub struct DetailView {
    repository: ItineraryRepository,
    owner: Identity,
    itinerary: Itinerary,
}

impl DetailView {
    /// Loads `id` for `owner`. A missing record and someone else's record
    /// both send the user back to the dashboard with the same message.
    pub async fn open(
        repository: ItineraryRepository,
        owner: Identity,
        id: &str,
    ) -> Result<Self, Outcome> {
        match repository.fetch(&owner, id).await {
            Ok(itinerary) => Ok(Self {
                repository,
                owner,
                itinerary,
            }),
            Err(PlannerError::NotFound) => {
                Err(Outcome::error("Access Denied").with_redirect(Route::Dashboard))
            }
            Err(err) => {
                error!(%id, error = %err, "fetching itinerary failed");
                Err(Outcome::error("Could not load itinerary").with_redirect(Route::Dashboard))
            }
        }
    }

    pub fn itinerary(&self) -> &Itinerary {
        &self.itinerary
    }

    pub async fn toggle_favorite(&mut self) -> Outcome {
        let value = !self.itinerary.is_favorite;
        match self
            .repository
            .set_favorite(&self.owner, &self.itinerary.id, value)
            .await
        {
            Ok(()) => {
                self.itinerary.is_favorite = value;
                if value {
                    Outcome::success("Added to favorites")
                } else {
                    Outcome::success("Removed from favorites")
                }
            }
            Err(err) => {
                error!(id = %self.itinerary.id, error = %err, "favorite update failed");
                Outcome::error("Could not update favorite status")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TripType;
    use crate::repository::testing::itinerary;
    use crate::session::testing::identity;
    use crate::store::testing::RecordingStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_other_users_itinerary_is_access_denied() {
        let repo = ItineraryRepository::new(Arc::new(RecordingStore::new()));
        let bobs = repo
            .create(
                &identity("bob"),
                itinerary("Work Conf", "Berlin", TripType::Work, false),
            )
            .await
            .unwrap();

        let outcome = DetailView::open(repo.clone(), identity("alice"), &bobs.id)
            .await
            .err()
            .unwrap();
        assert_eq!(outcome.message(), Some("Access Denied"));
        assert_eq!(outcome.redirect, Some(Route::Dashboard));

        let missing = DetailView::open(repo, identity("alice"), "nope")
            .await
            .err()
            .unwrap();
        assert_eq!(missing, outcome);
    }

    #[tokio::test]
    async fn test_open_and_toggle() {
        let store = Arc::new(RecordingStore::new());
        let repo = ItineraryRepository::new(store.clone());
        let created = repo
            .create(
                &identity("alice"),
                itinerary("Paris Trip", "Paris", TripType::Leisure, false),
            )
            .await
            .unwrap();

        let mut view = DetailView::open(repo, identity("alice"), &created.id)
            .await
            .ok()
            .unwrap();
        assert_eq!(view.itinerary().title, "Paris Trip");

        assert_eq!(
            view.toggle_favorite().await.message(),
            Some("Added to favorites")
        );
        assert!(view.itinerary().is_favorite);

        store.fail_writes(true);
        assert!(view.toggle_favorite().await.is_error());
        assert!(view.itinerary().is_favorite);
    }
}
