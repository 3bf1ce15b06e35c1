//! Login, registration and logout screens

use tracing::error;

use crate::error::PlannerError;
use crate::guard::Route;
use crate::notify::Outcome;
use crate::session::{RegisterForm, SessionContext};
use crate::store::DocumentStore;

pub async fn login(session: &SessionContext, email: &str, password: &str) -> Outcome {
    match session.login(email, password).await {
        Ok(_) => Outcome::success("Logged in successfully").with_redirect(Route::Dashboard),
        Err(err) => {
            error!(error = %err, "login failed");
            Outcome::error(err.user_message())
        }
    }
}

pub async fn register(
    session: &SessionContext,
    store: &dyn DocumentStore,
    form: &RegisterForm,
) -> Outcome {
    match session.register(form, store).await {
        Ok(_) => Outcome::success("Your account has been created successfully!")
            .with_redirect(Route::Dashboard),
        Err(err @ PlannerError::Validation(_)) => Outcome::error(err.user_message()),
        Err(err) => {
            error!(error = %err, "registration failed");
            Outcome::error(err.user_message())
        }
    }
}

pub async fn logout(session: &SessionContext) -> Outcome {
    match session.logout().await {
        Ok(()) => Outcome::none().with_redirect(Route::Login),
        Err(err) => Outcome::error(err.user_message()).with_redirect(Route::Login),
    }
}
