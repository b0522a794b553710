//! Authentication extractors.
//!
//! The session only remembers who is signed in ([`ActingUser`]). Whether that
//! user is an admin is read from the user document on every admin request.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use bazaar_core::User;

use crate::error::{AppError, NOT_SIGNED_IN};
use crate::models::{ActingUser, session_keys};
use crate::state::AppState;

/// 403 message when the session points at a user that no longer exists.
pub const USER_MISSING: &str = "Unauthorized the user either does not exist or is not signed in";

/// 403 message for a signed-in user without admin rights.
pub const NOT_ADMIN: &str = "Unauthorized the user is not an admin";

/// Extractor that requires a signed-in user.
///
/// Rejects with 401 when nobody is signed in.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireUser(user): RequireUser) -> String {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub ActingUser);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;
        let user = session
            .get::<ActingUser>(session_keys::ACTING_USER)
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_SIGNED_IN.to_owned()))?;
        Ok(Self(user))
    }
}

/// Extractor that requires a signed-in admin.
///
/// Rejects with 401 when nobody is signed in and 403 when the user is gone or
/// is not an admin. Carries the freshly loaded user document.
pub struct RequireAdmin {
    pub actor: ActingUser,
    pub user: User,
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(actor) = RequireUser::from_request_parts(parts, state).await?;

        let user = state
            .store()
            .get_user(actor.id)
            .await?
            .ok_or_else(|| AppError::Forbidden(USER_MISSING.to_owned()))?;
        if !user.is_admin {
            return Err(AppError::Forbidden(NOT_ADMIN.to_owned()));
        }

        Ok(Self { actor, user })
    }
}

/// Extractor that optionally gets the signed-in user.
///
/// Unlike `RequireUser`, this does not reject the request.
pub struct OptionalUser(pub Option<ActingUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts)?;
        let user = session.get::<ActingUser>(session_keys::ACTING_USER).await?;
        Ok(Self(user))
    }
}

fn session_from_parts(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_owned()))
}

/// Sign a user in: rotate the session id and remember the user.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_acting_user(
    session: &Session,
    user: &ActingUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::ACTING_USER, user).await
}

/// Sign out: drop everything in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_acting_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
