//! Dashboard: the signed-in user's itineraries with search and filters
//!
//! Records are fetched once per load; search and filter are applied
//! client-side and recomputed on every change.

use std::fmt;
use std::str::FromStr;

use tracing::error;

use crate::model::{Itinerary, TripType};
use crate::notify::Outcome;
use crate::repository::ItineraryRepository;
use crate::session::Identity;
use crate::validation::ValidationError;

/// Number of activity titles shown on a card
pub const CARD_ACTIVITIES: usize = 2;

/// Shown when no itinerary is visible
pub const EMPTY_MESSAGE: &str = "No itineraries found";

/// Filter selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Favorites,
    Trip(TripType),
}

impl Filter {
    pub fn accepts(&self, itinerary: &Itinerary) -> bool {
        match self {
            Filter::All => true,
            Filter::Favorites => itinerary.is_favorite,
            Filter::Trip(trip_type) => itinerary.trip_type == *trip_type,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::All => f.write_str("all"),
            Filter::Favorites => f.write_str("favorites"),
            Filter::Trip(trip_type) => write!(f, "{}", trip_type),
        }
    }
}

impl FromStr for Filter {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Filter::All),
            "favorites" => Ok(Filter::Favorites),
            other => other
                .parse::<TripType>()
                .map(Filter::Trip)
                .map_err(|_| ValidationError::UnknownFilter(s.to_string())),
        }
    }
}

/// Records matching `search` and accepted by `filter`, in their original order.
pub fn visible<'a>(itineraries: &'a [Itinerary], search: &str, filter: Filter) -> Vec<&'a Itinerary> {
    itineraries
        .iter()
        .filter(|itinerary| itinerary.matches_search(search) && filter.accepts(itinerary))
        .collect()
}

/// Summary of one itinerary as the dashboard lists it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryCard {
    pub id: String,
    pub title: String,
    pub destination: String,
    pub dates: String,
    pub trip_type: TripType,
    pub is_favorite: bool,
    pub cover_image: Option<String>,
    pub activities: Vec<String>,
    /// Activities not listed on the card
    pub more: usize,
}

impl From<&Itinerary> for ItineraryCard {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            id: itinerary.id.clone(),
            title: itinerary.title.clone(),
            destination: itinerary.destination.clone(),
            dates: itinerary.date_range(),
            trip_type: itinerary.trip_type,
            is_favorite: itinerary.is_favorite,
            cover_image: itinerary.cover_image_url().map(str::to_string),
            activities: itinerary
                .activities
                .iter()
                .take(CARD_ACTIVITIES)
                .map(|activity| activity.display_title().to_string())
                .collect(),
            more: itinerary.activities.len().saturating_sub(CARD_ACTIVITIES),
        }
    }
}

impl ItineraryCard {
    /// `+N more`, when there are hidden activities
    pub fn more_label(&self) -> Option<String> {
        (self.more > 0).then(|| format!("+{} more", self.more))
    }
}

/// Dashboard state for one signed-in user
pub struct DashboardView {
    repository: ItineraryRepository,
    owner: Identity,
    itineraries: Vec<Itinerary>,
    search: String,
    filter: Filter,
    loading: bool,
}

impl DashboardView {
    pub fn new(repository: ItineraryRepository, owner: Identity) -> Self {
        Self {
            repository,
            owner,
            itineraries: Vec::new(),
            search: String::new(),
            filter: Filter::All,
            loading: true,
        }
    }

    pub fn owner(&self) -> &Identity {
        &self.owner
    }

    /// True from construction until the first `load()` settles
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn itineraries(&self) -> &[Itinerary] {
        &self.itineraries
    }

    /// Fetches every itinerary of the owner.
    pub async fn load(&mut self) -> Outcome {
        self.loading = true;
        let result = self.repository.list(&self.owner).await;
        self.loading = false;

        match result {
            Ok(itineraries) => {
                self.itineraries = itineraries;
                Outcome::none()
            }
            Err(err) => {
                error!(error = %err, "fetching itineraries failed");
                Outcome::error("Could not load itineraries")
            }
        }
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn visible(&self) -> Vec<&Itinerary> {
        visible(&self.itineraries, &self.search, self.filter)
    }

    pub fn cards(&self) -> Vec<ItineraryCard> {
        self.visible().into_iter().map(ItineraryCard::from).collect()
    }

    /// The empty-state message when nothing is visible
    pub fn empty_message(&self) -> Option<&'static str> {
        (!self.loading && self.visible().is_empty()).then_some(EMPTY_MESSAGE)
    }

    /// Flips the favorite flag. Local state changes only once the store accepted it.
    pub async fn toggle_favorite(&mut self, id: &str) -> Outcome {
        let Some(index) = self.itineraries.iter().position(|it| it.id == id) else {
            return Outcome::error("Could not update favorite status");
        };
        let value = !self.itineraries[index].is_favorite;

        match self.repository.set_favorite(&self.owner, id, value).await {
            Ok(()) => {
                self.itineraries[index].is_favorite = value;
                if value {
                    Outcome::success("Added to favorites")
                } else {
                    Outcome::success("Removed from favorites")
                }
            }
            Err(err) => {
                error!(%id, error = %err, "favorite update failed");
                Outcome::error("Could not update favorite status")
            }
        }
    }

    /// Deletes after `confirm` agrees; a declined confirmation changes nothing.
    pub async fn delete<F>(&mut self, id: &str, confirm: F) -> Outcome
    where
        F: FnOnce(&Itinerary) -> bool,
    {
        let Some(itinerary) = self.itineraries.iter().find(|it| it.id == id) else {
            return Outcome::error("Could not delete itinerary");
        };
        if !confirm(itinerary) {
            return Outcome::none();
        }

        match self.repository.delete(&self.owner, id).await {
            Ok(()) => {
                self.itineraries.retain(|it| it.id != id);
                Outcome::success("Itinerary deleted successfully!")
            }
            Err(err) => {
                error!(%id, error = %err, "delete failed");
                Outcome::error("Could not delete itinerary")
            }
        }
    }
}
