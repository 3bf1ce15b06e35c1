use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use trip_planner_auth::{Auth, Session};

use super::{Identity, SessionFile, SessionProvider};
use crate::error::Result;

/// [`SessionProvider`] backed by the auth API client.
///
/// With a [`SessionFile`] attached, the session survives restarts: it is
/// written on sign in, removed on sign out, and reloaded by `restore`.
pub struct AuthSession {
    auth: Arc<Auth>,
    file: Option<SessionFile>,
}

impl AuthSession {
    pub fn new(auth: Arc<Auth>) -> Self {
        Self { auth, file: None }
    }

    pub fn with_session_file(mut self, file: SessionFile) -> Self {
        self.file = Some(file);
        self
    }

    pub fn auth(&self) -> &Arc<Auth> {
        &self.auth
    }

    async fn remember(&self, session: &Session) -> Result<()> {
        if let Some(file) = &self.file {
            file.save(session).await?;
        }
        Ok(())
    }

    async fn forget(&self) {
        self.auth.clear_session();
        if let Some(file) = &self.file {
            if let Err(err) = file.clear().await {
                warn!(error = %err, "could not remove session file");
            }
        }
    }
}

#[async_trait]
impl SessionProvider for AuthSession {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity> {
        let session = self.auth.sign_up(email, password).await?;
        self.remember(&session).await?;
        Ok(Identity::from(&session.user))
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity> {
        let session = self.auth.sign_in_with_password(email, password).await?;
        self.remember(&session).await?;
        Ok(Identity::from(&session.user))
    }

    async fn sign_out(&self) -> Result<()> {
        let result = self.auth.sign_out().await;
        self.forget().await;
        result.map_err(Into::into)
    }

    async fn restore(&self) -> Result<Option<Identity>> {
        let session = match self.auth.get_session() {
            Some(session) => session,
            None => match &self.file {
                Some(file) => match file.load().await? {
                    Some(session) => session,
                    None => return Ok(None),
                },
                None => return Ok(None),
            },
        };

        if !session.is_expired() {
            self.auth.set_session(session.clone());
            return Ok(Some(Identity::from(&session.user)));
        }

        debug!(uid = %session.user.id, "stored session expired, refreshing");
        self.auth.set_session(session);
        match self.auth.refresh_session().await {
            Ok(fresh) => {
                self.remember(&fresh).await?;
                Ok(Some(Identity::from(&fresh.user)))
            }
            Err(err) => {
                warn!(error = %err, "refresh failed, discarding stored session");
                self.forget().await;
                Ok(None)
            }
        }
    }
}
