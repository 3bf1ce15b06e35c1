//! Create-itinerary form
//!
//! [`ItineraryDraft`] is the in-memory state of the form. Field edits only
//! touch the named field; activity edits only touch the activity at the
//! given position. [`FormController`] adds the cover image step and submission.

use tracing::{error, info, warn};
use trip_planner_upload::ImageFile;

use crate::guard::Route;
use crate::model::{Activity, Itinerary, TripType};
use crate::notify::Outcome;
use crate::repository::ItineraryRepository;
use crate::session::Identity;
use crate::upload::{ImageUploadStep, ImageUploader};
use crate::validation::{
    check_activity_removal, parse_date, parse_optional_date, require_all, ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Destination,
    StartDate,
    EndDate,
    TripType,
    Description,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityField {
    Title,
    Date,
    Location,
    Notes,
}

/// Raw activity input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityDraft {
    pub title: String,
    pub date: String,
    pub location: String,
    pub notes: String,
}

impl ActivityDraft {
    fn to_activity(&self) -> Result<Activity, ValidationError> {
        let optional = |value: &str| {
            if value.trim().is_empty() {
                None
            } else {
                Some(value.to_string())
            }
        };
        Ok(Activity {
            title: optional(&self.title),
            date: parse_optional_date("activity date", &self.date)?,
            location: optional(&self.location),
            notes: optional(&self.notes),
        })
    }
}

/// Raw form input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryDraft {
    pub title: String,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub trip_type: String,
    pub description: String,
    pub activities: Vec<ActivityDraft>,
}

impl Default for ItineraryDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            destination: String::new(),
            start_date: String::new(),
            end_date: String::new(),
            trip_type: TripType::default().to_string(),
            description: String::new(),
            activities: vec![ActivityDraft::default()],
        }
    }
}

impl ItineraryDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Title => self.title = value,
            Field::Destination => self.destination = value,
            Field::StartDate => self.start_date = value,
            Field::EndDate => self.end_date = value,
            Field::TripType => self.trip_type = value,
            Field::Description => self.description = value,
        }
    }

    pub fn set_activity_field(
        &mut self,
        index: usize,
        field: ActivityField,
        value: impl Into<String>,
    ) -> Result<(), ValidationError> {
        let activity = self
            .activities
            .get_mut(index)
            .ok_or(ValidationError::ActivityIndex(index))?;
        let value = value.into();
        match field {
            ActivityField::Title => activity.title = value,
            ActivityField::Date => activity.date = value,
            ActivityField::Location => activity.location = value,
            ActivityField::Notes => activity.notes = value,
        }
        Ok(())
    }

    pub fn add_activity(&mut self) {
        self.activities.push(ActivityDraft::default());
    }

    /// Removes position `index`; the last remaining activity cannot be removed.
    pub fn remove_activity(&mut self, index: usize) -> Result<(), ValidationError> {
        check_activity_removal(self.activities.len(), index)?;
        self.activities.remove(index);
        Ok(())
    }

    /// Builds the record to create. Owner, id and timestamp are filled in later.
    pub fn to_itinerary(&self, cover_image: String) -> Result<Itinerary, ValidationError> {
        require_all(&[
            self.title.as_str(),
            self.destination.as_str(),
            self.start_date.as_str(),
            self.end_date.as_str(),
        ])?;

        let trip_type = if self.trip_type.trim().is_empty() {
            TripType::default()
        } else {
            self.trip_type.parse()?
        };
        let activities = self
            .activities
            .iter()
            .map(ActivityDraft::to_activity)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Itinerary {
            id: String::new(),
            title: self.title.clone(),
            destination: self.destination.clone(),
            start_date: parse_date("startDate", &self.start_date)?,
            end_date: parse_date("endDate", &self.end_date)?,
            trip_type,
            description: self.description.clone(),
            cover_image,
            is_favorite: false,
            activities,
            user_id: String::new(),
            updated_at: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    /// Loaded from the edit route; submission still creates a new record
    Edit(String),
}

/// State and actions of the itinerary form
#[derive(Debug, Clone)]
pub struct FormController {
    mode: FormMode,
    draft: ItineraryDraft,
    image: ImageUploadStep,
    submitting: bool,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new()
    }
}

impl FormController {
    pub fn new() -> Self {
        Self {
            mode: FormMode::Create,
            draft: ItineraryDraft::new(),
            image: ImageUploadStep::new(),
            submitting: false,
        }
    }

    /// The edit route renders the creation form.
    // TODO: load the existing record and submit through an update once edit semantics are settled.
    pub fn for_edit(id: &str) -> Self {
        warn!(%id, "edit route is unfinished, submitting will create a new itinerary");
        Self {
            mode: FormMode::Edit(id.to_string()),
            ..Self::new()
        }
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn draft(&self) -> &ItineraryDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut ItineraryDraft {
        &mut self.draft
    }

    pub fn image(&self) -> &ImageUploadStep {
        &self.image
    }

    /// Set while `submit` awaits the store; observable by callers that share the form behind a lock.
    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn remove_activity(&mut self, index: usize) -> Outcome {
        match self.draft.remove_activity(index) {
            Ok(()) => Outcome::none(),
            Err(err) => Outcome::error(err.to_string()),
        }
    }

    pub async fn upload_cover(&mut self, uploader: &dyn ImageUploader, file: ImageFile) -> Outcome {
        self.image.run(uploader, file).await
    }

    /// Validates and creates the itinerary. The draft is kept on failure so
    /// the user can retry, and reset after a successful create.
    pub async fn submit(&mut self, owner: &Identity, repository: &ItineraryRepository) -> Outcome {
        let itinerary = match self.draft.to_itinerary(self.image.cover_image()) {
            Ok(itinerary) => itinerary,
            Err(err) => return Outcome::error(err.to_string()),
        };

        self.submitting = true;
        let result = repository.create(owner, itinerary).await;
        self.submitting = false;

        match result {
            Ok(created) => {
                info!(id = %created.id, "itinerary created");
                self.draft = ItineraryDraft::new();
                self.image.clear();
                Outcome::success("Itinerary created successfully!").with_redirect(Route::Dashboard)
            }
            Err(err) => {
                error!(error = %err, "create itinerary failed");
                Outcome::error("Failed to create itinerary")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ITINERARIES;
    use crate::session::testing::identity;
    use crate::store::testing::RecordingStore;
    use crate::store::DocumentStore;
    use crate::upload::testing::FixedUploader;
    use std::sync::Arc;
    use trip_planner_upload::UploadSource;

    fn filled_draft(controller: &mut FormController) {
        let draft = controller.draft_mut();
        draft.set_field(Field::Title, "Paris Trip");
        draft.set_field(Field::Destination, "Paris");
        draft.set_field(Field::StartDate, "2024-01-01");
        draft.set_field(Field::EndDate, "2024-01-05");
    }

    #[test]
    fn test_defaults() {
        let draft = ItineraryDraft::new();
        assert_eq!(draft.trip_type, "leisure");
        assert_eq!(draft.activities, vec![ActivityDraft::default()]);
    }

    #[test]
    fn test_activity_edits_are_positional() {
        let mut draft = ItineraryDraft::new();
        draft.add_activity();
        draft.add_activity();
        draft
            .set_activity_field(1, ActivityField::Title, "Louvre")
            .unwrap();
        draft
            .set_activity_field(1, ActivityField::Notes, "book tickets")
            .unwrap();

        assert_eq!(draft.activities[0], ActivityDraft::default());
        assert_eq!(draft.activities[1].title, "Louvre");
        assert_eq!(draft.activities[1].notes, "book tickets");
        assert_eq!(draft.activities[2], ActivityDraft::default());

        assert_eq!(
            draft.set_activity_field(3, ActivityField::Title, "x"),
            Err(ValidationError::ActivityIndex(3))
        );

        draft.remove_activity(0).unwrap();
        assert_eq!(draft.activities.len(), 2);
        assert_eq!(draft.activities[0].title, "Louvre");
    }

    #[test]
    fn test_removing_only_activity_is_rejected() {
        let mut controller = FormController::new();
        controller
            .draft_mut()
            .set_activity_field(0, ActivityField::Title, "Louvre")
            .unwrap();
        let before = controller.draft().clone();

        let outcome = controller.remove_activity(0);

        assert!(outcome.is_error());
        assert_eq!(outcome.message(), Some("At least one activity is required"));
        assert_eq!(controller.draft(), &before);
    }

    #[tokio::test]
    async fn test_missing_title_is_rejected_without_store_write() {
        let store = Arc::new(RecordingStore::new());
        let repo = ItineraryRepository::new(store.clone());
        let mut controller = FormController::new();
        filled_draft(&mut controller);
        controller.draft_mut().set_field(Field::Title, "");

        let outcome = controller.submit(&identity("alice"), &repo).await;

        assert_eq!(outcome.message(), Some("All fields are required"));
        assert_eq!(outcome.redirect, None);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_each_required_field_is_enforced() {
        for field in [Field::Title, Field::Destination, Field::StartDate, Field::EndDate] {
            let store = Arc::new(RecordingStore::new());
            let repo = ItineraryRepository::new(store.clone());
            let mut controller = FormController::new();
            filled_draft(&mut controller);
            controller.draft_mut().set_field(field, "");

            let outcome = controller.submit(&identity("alice"), &repo).await;
            assert!(outcome.is_error(), "{:?} accepted when empty", field);
            assert_eq!(store.write_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_submit_creates_record_with_cover_and_owner() {
        let store = Arc::new(RecordingStore::new());
        let repo = ItineraryRepository::new(store.clone());
        let mut controller = FormController::new();
        filled_draft(&mut controller);
        controller
            .draft_mut()
            .set_activity_field(0, ActivityField::Title, "Louvre")
            .unwrap();

        let uploader = FixedUploader(Ok("https://img.example/paris.jpg".to_string()));
        let file = ImageFile::from_bytes(UploadSource::Local, "paris.jpg", vec![1u8]);
        controller.upload_cover(&uploader, file).await;

        let outcome = controller.submit(&identity("alice"), &repo).await;
        assert_eq!(outcome.message(), Some("Itinerary created successfully!"));
        assert_eq!(outcome.redirect, Some(Route::Dashboard));
        assert_eq!(controller.draft(), &ItineraryDraft::new());

        let stored = store
            .query(ITINERARIES, "userId", "alice")
            .await
            .unwrap()
            .pop()
            .unwrap();
        assert_eq!(stored.data["coverImage"], "https://img.example/paris.jpg");
        assert_eq!(stored.data["tripType"], "leisure");
        assert_eq!(stored.data["isFavorite"], false);
        assert_eq!(stored.data["activities"][0]["title"], "Louvre");
        assert!(stored.data["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_submit_without_image_stores_empty_cover() {
        let store = Arc::new(RecordingStore::new());
        let repo = ItineraryRepository::new(store.clone());
        let mut controller = FormController::new();
        filled_draft(&mut controller);

        controller.submit(&identity("alice"), &repo).await;

        let stored = store.query(ITINERARIES, "userId", "alice").await.unwrap();
        assert_eq!(stored[0].data["coverImage"], "");
    }

    #[tokio::test]
    async fn test_failed_create_keeps_draft() {
        let store = Arc::new(RecordingStore::new());
        store.fail_writes(true);
        let repo = ItineraryRepository::new(store.clone());
        let mut controller = FormController::new();
        filled_draft(&mut controller);
        let before = controller.draft().clone();

        let outcome = controller.submit(&identity("alice"), &repo).await;

        assert_eq!(outcome.message(), Some("Failed to create itinerary"));
        assert_eq!(outcome.redirect, None);
        assert_eq!(controller.draft(), &before);
        assert!(!controller.is_submitting());
    }

    #[test]
    fn test_edit_mode_uses_creation_form() {
        let controller = FormController::for_edit("abc");
        assert_eq!(controller.mode(), &FormMode::Edit("abc".to_string()));
        assert_eq!(controller.draft(), &ItineraryDraft::new());
    }
}
