//! Transient notifications and navigation produced by user operations

use std::fmt;

use crate::guard::Route;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// A short message shown to the user once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: Level,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.level {
            Level::Success => "ok",
            Level::Error => "error",
        };
        write!(f, "[{}] {}", tag, self.message)
    }
}

/// What a user operation asks the shell to do afterwards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub notification: Option<Notification>,
    pub redirect: Option<Route>,
}

impl Outcome {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            notification: Some(Notification::success(message)),
            redirect: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            notification: Some(Notification::error(message)),
            redirect: None,
        }
    }

    /// Navigate after showing the notification
    pub fn with_redirect(mut self, route: Route) -> Self {
        self.redirect = Some(route);
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self.notification,
            Some(Notification {
                level: Level::Error,
                ..
            })
        )
    }

    pub fn message(&self) -> Option<&str> {
        self.notification.as_ref().map(|n| n.message.as_str())
    }
}
