//! Session capability and the process-wide session context
//!
//! [`SessionContext`] is built once at startup around a [`SessionProvider`].
//! It starts out `Resolving`, publishes every change through a
//! `tokio::sync::watch` channel, and is the only shared mutable state the
//! views read.

mod file;
mod provider;

pub use file::SessionFile;
pub use provider::AuthSession;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use trip_planner_auth::User;

use crate::error::Result;
use crate::model::{UserProfile, USERS};
use crate::store::DocumentStore;
use crate::validation::{check_credentials, check_password_confirmation};

/// The authenticated user as the views see it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// Navigation bar label: display name, else email
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            uid: user.id.clone(),
            email: user.email.clone(),
            display_name: user.display_name().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Initial resolution has not finished yet
    Resolving,
    SignedOut,
    SignedIn(Identity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::SignedIn(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        matches!(self, SessionState::Resolving)
    }
}

/// Authentication capability
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;

    /// Initial resolution: the identity of a session that survived a restart, if any.
    async fn restore(&self) -> Result<Option<Identity>>;
}

/// Registration input
#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Process-wide session state
pub struct SessionContext {
    provider: Arc<dyn SessionProvider>,
    state: watch::Sender<SessionState>,
}

impl SessionContext {
    pub fn new(provider: Arc<dyn SessionProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::Resolving);
        Self { provider, state }
    }

    /// Receives every state change, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// The signed-in identity, if any
    pub fn identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    fn publish(&self, state: SessionState) {
        self.state.send_replace(state);
    }

    /// Finishes initial resolution. A provider failure resolves to signed out.
    pub async fn resolve(&self) -> SessionState {
        let state = match self.provider.restore().await {
            Ok(Some(identity)) => SessionState::SignedIn(identity),
            Ok(None) => SessionState::SignedOut,
            Err(err) => {
                warn!(error = %err, "session restore failed");
                SessionState::SignedOut
            }
        };
        debug!(?state, "session resolved");
        self.publish(state.clone());
        state
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Identity> {
        check_credentials(email, password)?;
        let identity = self.provider.sign_in(email.trim(), password).await?;
        info!(uid = %identity.uid, "signed in");
        self.publish(SessionState::SignedIn(identity.clone()));
        Ok(identity)
    }

    /// Tears the identity down. The local state is cleared even if the
    /// provider reports an error.
    pub async fn logout(&self) -> Result<()> {
        let result = self.provider.sign_out().await;
        self.publish(SessionState::SignedOut);
        if let Err(err) = &result {
            warn!(error = %err, "sign out failed");
        }
        result
    }

    /// Creates the account, then writes the `Users/{uid}` profile.
    ///
    /// The profile write is a separate step: when it fails the account
    /// still exists and stays signed in, and the error is returned.
    pub async fn register(&self, form: &RegisterForm, store: &dyn DocumentStore) -> Result<Identity> {
        check_password_confirmation(&form.password, &form.confirm_password)?;
        check_credentials(&form.email, &form.password)?;

        let mut identity = self.provider.sign_up(form.email.trim(), &form.password).await?;
        if identity.display_name.is_none() && !form.name.trim().is_empty() {
            identity.display_name = Some(form.name.trim().to_string());
        }
        info!(uid = %identity.uid, "account created");
        self.publish(SessionState::SignedIn(identity.clone()));

        let profile = UserProfile {
            email: form.email.trim().to_string(),
            name: form.name.trim().to_string(),
        };
        store
            .set(USERS, &identity.uid, serde_json::to_value(&profile)?)
            .await
            .map_err(|err| {
                warn!(uid = %identity.uid, error = %err, "profile write failed");
                err
            })?;

        Ok(identity)
    }
}
