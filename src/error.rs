//! Error handling for the trip planner

use std::fmt;
use thiserror::Error;

use crate::validation::ValidationError;

/// Unified error type for the trip planner core
#[derive(Error, Debug)]
pub enum PlannerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input rejected before any capability was called
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Authentication backend errors
    #[error("Authentication error: {0}")]
    Auth(#[from] trip_planner_auth::AuthError),

    /// Document store errors
    #[error("Database error: {0}")]
    Database(#[from] trip_planner_postgrest::PostgrestError),

    /// Image upload errors
    #[error("Upload error: {0}")]
    Upload(#[from] trip_planner_upload::UploadError),

    /// Store errors that do not come from the HTTP client (e.g. the in-memory store)
    #[error("Store error: {0}")]
    Store(String),

    /// The record does not exist or belongs to another user
    #[error("Itinerary not found")]
    NotFound,

    /// No signed-in session for an operation that needs one
    #[error("Not signed in")]
    Unauthenticated,

    /// HTTP client construction or transport errors outside the backend clients
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local IO errors (session file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlannerError {
    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        PlannerError::Config(msg.to_string())
    }

    /// Create a new store error
    pub fn store<T: fmt::Display>(msg: T) -> Self {
        PlannerError::Store(msg.to_string())
    }

    /// The capability's own message, suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Auth(err) => err.message(),
            PlannerError::Upload(err) => err.to_string(),
            PlannerError::Validation(err) => err.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, PlannerError>;
