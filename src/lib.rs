//! Trip Planner
//!
//! Core of a travel itinerary planner: itinerary records and their
//! validation, the dashboard search/filter rules, the create form, the
//! route guard and the session context. Authentication, document storage
//! and image hosting are capabilities behind traits, with HTTP-backed
//! implementations in the `trip-planner-auth`, `trip-planner-postgrest`
//! and `trip-planner-upload` crates.

pub mod config;
pub mod error;
pub mod guard;
pub mod model;
pub mod notify;
pub mod repository;
pub mod session;
pub mod store;
pub mod upload;
pub mod validation;
pub mod views;

use std::sync::Arc;

use reqwest::Client;
use trip_planner_auth::{Auth, AuthOptions};

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::guard::{GuardDecision, Route, RouteGuard};
use crate::repository::ItineraryRepository;
use crate::session::{AuthSession, SessionContext, SessionFile, SessionProvider};
use crate::store::{DocumentStore, PostgrestStore};
use crate::upload::{CloudinaryUploader, ImageUploader};

/// The main entry point: wires the capabilities together once at startup
pub struct TripPlanner {
    /// Configuration the planner was built from
    pub config: PlannerConfig,
    /// HTTP client shared by every backend client
    pub http_client: Client,
    session: Arc<SessionContext>,
    store: Arc<dyn DocumentStore>,
    uploader: Option<Arc<dyn ImageUploader>>,
    guard: RouteGuard,
}

impl TripPlanner {
    /// Builds the planner against the hosted backend described by `config`.
    ///
    /// The session is persisted to `config.session_file`. The image uploader
    /// is only available when a cloud name is configured.
    pub fn new(config: PlannerConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        let auth = Arc::new(Auth::new(
            &config.base_url(),
            &config.anon_key,
            http_client.clone(),
            AuthOptions::default(),
        ));
        let provider = AuthSession::new(auth.clone())
            .with_session_file(SessionFile::new(config.session_file.clone()));
        let store = PostgrestStore::new(&config.base_url(), &config.anon_key, http_client.clone())
            .with_auth(auth);
        let uploader = match CloudinaryUploader::from_config(&config, http_client.clone()) {
            Ok(uploader) => Some(Arc::new(uploader) as Arc<dyn ImageUploader>),
            Err(err) => {
                tracing::debug!(error = %err, "image uploads disabled");
                None
            }
        };

        Ok(Self {
            config,
            http_client,
            session: Arc::new(SessionContext::new(Arc::new(provider))),
            store: Arc::new(store),
            uploader,
            guard: RouteGuard,
        })
    }

    /// Builds the planner from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(PlannerConfig::from_env()?)
    }

    /// Builds the planner from explicit capabilities.
    pub fn with_capabilities(
        config: PlannerConfig,
        provider: Arc<dyn SessionProvider>,
        store: Arc<dyn DocumentStore>,
        uploader: Option<Arc<dyn ImageUploader>>,
    ) -> Self {
        Self {
            config,
            http_client: Client::new(),
            session: Arc::new(SessionContext::new(provider)),
            store,
            uploader,
            guard: RouteGuard,
        }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// The signed-in identity, or `Unauthenticated`
    pub fn identity(&self) -> Result<session::Identity> {
        self.session
            .identity()
            .ok_or(error::PlannerError::Unauthenticated)
    }

    pub fn repository(&self) -> ItineraryRepository {
        ItineraryRepository::new(self.store.clone())
    }

    pub fn uploader(&self) -> Result<Arc<dyn ImageUploader>> {
        self.uploader
            .clone()
            .ok_or_else(|| error::PlannerError::config("CLOUDINARY_CLOUD_NAME is not set"))
    }

    /// Resolves the session if that has not happened yet, then applies the route guard.
    pub async fn navigate(&self, route: Route) -> GuardDecision {
        if self.session.current().is_resolving() {
            self.session.resolve().await;
        }
        self.guard.check(&self.session.current(), route)
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::config::PlannerConfig;
    pub use crate::error::{PlannerError, Result};
    pub use crate::guard::{GuardDecision, Route};
    pub use crate::model::{Activity, Itinerary, TripType};
    pub use crate::notify::{Notification, Outcome};
    pub use crate::session::{Identity, SessionState};
    pub use crate::views::{DashboardView, DetailView, Filter, FormController};
    pub use crate::TripPlanner;
}
