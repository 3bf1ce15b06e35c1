//! Route table and session-based navigation guard

use std::fmt;

use crate::session::SessionState;

/// Navigation targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    CreateItinerary,
    /// Reachable, but still submits through the creation path
    EditItinerary(String),
    ItineraryDetail(String),
}

impl Route {
    /// Parses a path such as `/itinerary/abc`.
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim_end_matches('/');
        let segments: Vec<&str> = trimmed
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        match segments.as_slice() {
            [] => Some(Route::Dashboard),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["create-itinerary"] => Some(Route::CreateItinerary),
            ["edit-itinerary", id] => Some(Route::EditItinerary(id.to_string())),
            ["itinerary", id] => Some(Route::ItineraryDetail(id.to_string())),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/".to_string(),
            Route::CreateItinerary => "/create-itinerary".to_string(),
            Route::EditItinerary(id) => format!("/edit-itinerary/{}", id),
            Route::ItineraryDetail(id) => format!("/itinerary/{}", id),
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Login | Route::Register)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// What to show for a requested route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session resolution still pending
    Loading,
    Redirect(Route),
    Render(Route),
}

/// Gates protected routes on the session state. No side effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct RouteGuard;

impl RouteGuard {
    pub fn check(&self, state: &SessionState, route: Route) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }

        match state {
            SessionState::Resolving => GuardDecision::Loading,
            SessionState::SignedOut => GuardDecision::Redirect(Route::Login),
            SessionState::SignedIn(_) => GuardDecision::Render(route),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Identity;

    #[test]
    fn test_route_parse_and_path() {
        assert_eq!(Route::parse("/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(
            Route::parse("/itinerary/abc"),
            Some(Route::ItineraryDetail("abc".to_string()))
        );
        assert_eq!(
            Route::parse("/edit-itinerary/abc/"),
            Some(Route::EditItinerary("abc".to_string()))
        );
        assert_eq!(Route::parse("/itinerary"), None);
        assert_eq!(Route::parse("/unknown"), None);

        for route in [
            Route::Login,
            Route::Register,
            Route::Dashboard,
            Route::CreateItinerary,
            Route::EditItinerary("x".to_string()),
            Route::ItineraryDetail("y".to_string()),
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn test_guard_decisions() {
        let guard = RouteGuard;
        let signed_in = SessionState::SignedIn(Identity {
            uid: "user-a".to_string(),
            email: Some("a@example.com".to_string()),
            display_name: None,
        });

        assert_eq!(
            guard.check(&SessionState::Resolving, Route::Dashboard),
            GuardDecision::Loading
        );
        assert_eq!(
            guard.check(&SessionState::SignedOut, Route::CreateItinerary),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(
            guard.check(&signed_in, Route::Dashboard),
            GuardDecision::Render(Route::Dashboard)
        );
        assert_eq!(
            guard.check(&SessionState::SignedOut, Route::Register),
            GuardDecision::Render(Route::Register)
        );
        assert_eq!(
            guard.check(&SessionState::Resolving, Route::Login),
            GuardDecision::Render(Route::Login)
        );
    }
}
