//! Configuration for the trip planner
//!
//! Values come from the process environment first and fall back to the
//! values baked in when the crate was built (`option_env!`), so a release
//! build can ship with its backend coordinates compiled in.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{PlannerError, Result};

/// Upload preset used when none is configured.
pub const DEFAULT_UPLOAD_PRESET: &str = "unsigned_uploads";

/// Session file used by the CLI when none is configured.
pub const DEFAULT_SESSION_FILE: &str = ".trip-planner-session.json";

/// Configuration for the trip planner
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Base URL of the auth + document backend
    pub url: Url,

    /// Anonymous API key of the backend
    pub anon_key: String,

    /// Image host cloud name
    pub cloud_name: Option<String>,

    /// Image host API key. Unsigned uploads ignore it.
    pub cloud_api_key: Option<String>,

    /// Unsigned upload preset
    pub upload_preset: String,

    /// Overrides the image host API base URL
    pub upload_base_url: Option<String>,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Where the CLI persists the signed-in session
    pub session_file: PathBuf,
}

fn lookup(name: &str, baked: Option<&'static str>) -> Option<String> {
    std::env::var(name)
        .ok()
        .or_else(|| baked.map(str::to_string))
        .filter(|value| !value.trim().is_empty())
}

impl PlannerConfig {
    /// Creates a new configuration, validating the URL.
    pub fn new(url_str: &str, anon_key: &str) -> Result<Self> {
        let url = Url::parse(url_str)?;
        if anon_key.is_empty() {
            return Err(PlannerError::config("anon_key cannot be empty"));
        }

        Ok(Self {
            url,
            anon_key: anon_key.to_string(),
            cloud_name: None,
            cloud_api_key: None,
            upload_preset: DEFAULT_UPLOAD_PRESET.to_string(),
            upload_base_url: None,
            request_timeout: Some(Duration::from_secs(30)),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        })
    }

    /// Attempts to create configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let url = lookup("TRIP_PLANNER_URL", option_env!("TRIP_PLANNER_URL")).ok_or_else(|| {
            PlannerError::config("TRIP_PLANNER_URL environment variable not found")
        })?;
        let anon_key = lookup("TRIP_PLANNER_ANON_KEY", option_env!("TRIP_PLANNER_ANON_KEY"))
            .ok_or_else(|| {
                PlannerError::config("TRIP_PLANNER_ANON_KEY environment variable not found")
            })?;

        let mut config = Self::new(&url, &anon_key)?;
        config.cloud_name = lookup("CLOUDINARY_CLOUD_NAME", option_env!("CLOUDINARY_CLOUD_NAME"));
        config.cloud_api_key = lookup("CLOUDINARY_API_KEY", option_env!("CLOUDINARY_API_KEY"));
        config.upload_base_url = lookup("CLOUDINARY_BASE_URL", None);
        if let Some(preset) = lookup(
            "CLOUDINARY_UPLOAD_PRESET",
            option_env!("CLOUDINARY_UPLOAD_PRESET"),
        ) {
            config.upload_preset = preset;
        }
        if let Some(path) = lookup("TRIP_PLANNER_SESSION_FILE", None) {
            config.session_file = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Base URL without a trailing slash, as the backend clients expect it.
    pub fn base_url(&self) -> String {
        self.url.as_str().trim_end_matches('/').to_string()
    }

    /// Set the image host cloud name
    pub fn with_cloud_name(mut self, value: &str) -> Self {
        self.cloud_name = Some(value.to_string());
        self
    }

    /// Set the unsigned upload preset
    pub fn with_upload_preset(mut self, value: &str) -> Self {
        self.upload_preset = value.to_string();
        self
    }

    /// Set the image host API base URL
    pub fn with_upload_base_url(mut self, value: &str) -> Self {
        self.upload_base_url = Some(value.to_string());
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the session file location
    pub fn with_session_file(mut self, value: impl Into<PathBuf>) -> Self {
        self.session_file = value.into();
        self
    }
}
