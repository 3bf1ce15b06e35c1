//! Itinerary records as they are stored in the document store

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::Document;
use crate::validation::ValidationError;

/// Collection holding itineraries
pub const ITINERARIES: &str = "itineraries";

/// Collection holding user profiles, keyed by uid
pub const USERS: &str = "Users";

/// Title shown for an activity without one
pub const UNTITLED_ACTIVITY: &str = "Untitled Activity";

/// Kind of trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    Adventure,
    #[default]
    Leisure,
    Work,
    Family,
    Other,
}

impl TripType {
    pub const ALL: [TripType; 5] = [
        TripType::Adventure,
        TripType::Leisure,
        TripType::Work,
        TripType::Family,
        TripType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::Adventure => "adventure",
            TripType::Leisure => "leisure",
            TripType::Work => "work",
            TripType::Family => "family",
            TripType::Other => "other",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TripType {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        TripType::ALL
            .into_iter()
            .find(|trip_type| trip_type.as_str() == wanted)
            .ok_or_else(|| ValidationError::UnknownTripType(s.to_string()))
    }
}

// Forms store unset optional fields as "", read them back as `None`.
fn blank_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        Some(value) if !value.trim().is_empty() => value.parse().map(Some).map_err(de::Error::custom),
        _ => Ok(None),
    }
}

// Nullable columns come back as `null`; read them as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One planned event inside an itinerary. Identified only by its position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Activity {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(UNTITLED_ACTIVITY)
    }
}

/// A user-owned trip record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Itinerary {
    /// Assigned by the store and taken from [`Document::id`], never from the body
    #[serde(skip)]
    pub id: String,
    pub title: String,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub trip_type: TripType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Hosted image URL, or "" when no image was uploaded
    #[serde(default, deserialize_with = "null_as_default")]
    pub cover_image: String,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub activities: Vec<Activity>,
    #[serde(default)]
    pub user_id: String,
    /// Assigned by the store on every write
    #[serde(default, skip_serializing)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Itinerary {
    /// Decodes a stored document, taking the id from the store.
    pub fn from_document(document: Document) -> Result<Self> {
        let mut itinerary: Itinerary = serde_json::from_value(document.data)?;
        itinerary.id = document.id;
        Ok(itinerary)
    }

    pub fn cover_image_url(&self) -> Option<&str> {
        if self.cover_image.is_empty() {
            None
        } else {
            Some(&self.cover_image)
        }
    }

    /// e.g. `Jan 1, 2024 - Jan 5, 2024`
    pub fn date_range(&self) -> String {
        format!(
            "{} - {}",
            self.start_date.format("%b %-d, %Y"),
            self.end_date.format("%b %-d, %Y")
        )
    }

    /// Case-insensitive match of `term` against title, destination or any activity title.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.destination.to_lowercase().contains(&term)
            || self.activities.iter().any(|activity| {
                activity
                    .title
                    .as_deref()
                    .is_some_and(|title| title.to_lowercase().contains(&term))
            })
    }
}

/// Profile written once at registration under `Users/{uid}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trip_type_parse() {
        assert_eq!("Work".parse::<TripType>().unwrap(), TripType::Work);
        assert_eq!(TripType::default(), TripType::Leisure);
        assert!("cruise".parse::<TripType>().is_err());
        assert_eq!(TripType::Family.to_string(), "family");
    }

    #[test]
    fn test_decode_stored_document() {
        let document = Document {
            id: "abc".to_string(),
            data: json!({
                "title": "Paris Trip",
                "destination": "Paris",
                "startDate": "2024-01-01",
                "endDate": "2024-01-05",
                "tripType": "leisure",
                "coverImage": "",
                "isFavorite": false,
                "activities": [{"title": "", "date": "", "location": "Louvre", "notes": ""}],
                "userId": "user-a",
                "updatedAt": "2024-01-01T10:00:00Z"
            }),
        };

        let itinerary = Itinerary::from_document(document).unwrap();
        assert_eq!(itinerary.id, "abc");
        assert_eq!(itinerary.cover_image_url(), None);
        assert_eq!(itinerary.activities[0].title, None);
        assert_eq!(itinerary.activities[0].display_title(), UNTITLED_ACTIVITY);
        assert_eq!(itinerary.activities[0].location.as_deref(), Some("Louvre"));
        assert!(itinerary.updated_at.is_some());
        assert_eq!(itinerary.date_range(), "Jan 1, 2024 - Jan 5, 2024");
    }

    #[test]
    fn test_decode_row_with_numeric_id_and_null_columns() {
        let document = Document {
            id: "7".to_string(),
            data: json!({
                "id": 7,
                "title": "Paris Trip",
                "destination": "Paris",
                "startDate": "2024-01-01",
                "endDate": "2024-01-05",
                "description": null,
                "coverImage": null,
                "activities": null,
                "userId": "user-a"
            }),
        };

        let itinerary = Itinerary::from_document(document).unwrap();
        assert_eq!(itinerary.id, "7");
        assert_eq!(itinerary.description, "");
        assert_eq!(itinerary.cover_image_url(), None);
        assert!(itinerary.activities.is_empty());
    }

    #[test]
    fn test_serialized_shape_is_camel_case() {
        let itinerary = Itinerary {
            id: "ignored".to_string(),
            title: "Work Conf".to_string(),
            destination: "Berlin".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 3).unwrap(),
            trip_type: TripType::Work,
            description: String::new(),
            cover_image: String::new(),
            is_favorite: true,
            activities: vec![Activity::default()],
            user_id: "user-b".to_string(),
            updated_at: None,
        };

        let value = serde_json::to_value(&itinerary).unwrap();
        assert_eq!(value["tripType"], "work");
        assert_eq!(value["isFavorite"], true);
        assert_eq!(value["userId"], "user-b");
        assert_eq!(value["startDate"], "2024-03-01");
        assert!(value.get("id").is_none());
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_matches_search() {
        let itinerary: Itinerary = serde_json::from_value(json!({
            "title": "Work Conf",
            "destination": "Berlin",
            "startDate": "2024-03-01",
            "endDate": "2024-03-03",
            "activities": [{"title": "Museum Island"}]
        }))
        .unwrap();

        assert!(itinerary.matches_search("BERLIN"));
        assert!(itinerary.matches_search("museum"));
        assert!(itinerary.matches_search(""));
        assert!(!itinerary.matches_search("paris"));
    }
}
