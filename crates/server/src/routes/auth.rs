//! Signup, signin and signout.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalUser, RequireUser, clear_acting_user, set_acting_user};
use crate::models::{ActingUser, UserProfile};
use crate::routes::extract::AppJson;
use crate::services::auth::{AuthError, AuthService, SignIn, SignUp};
use crate::state::AppState;

/// `POST /user/signup` - create a customer account and sign it in.
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    AppJson(form): AppJson<SignUp>,
) -> Result<impl IntoResponse> {
    let user = AuthService::new(state.store()).signup(form).await?;

    let actor = ActingUser::from(&user);
    set_acting_user(&session, &actor).await?;
    set_sentry_user(&actor.id, Some(actor.email.as_str()));

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "SignUp Success", "user": UserProfile::from(&user) })),
    ))
}

/// `POST /user/signin`
pub async fn signin(
    State(state): State<AppState>,
    session: Session,
    OptionalUser(current): OptionalUser,
    AppJson(form): AppJson<SignIn>,
) -> Result<impl IntoResponse> {
    if current.is_some() {
        return Err(AuthError::AlreadySignedIn.into());
    }

    let user = AuthService::new(state.store()).signin(&form).await?;

    let actor = ActingUser::from(&user);
    set_acting_user(&session, &actor).await?;
    set_sentry_user(&actor.id, Some(actor.email.as_str()));
    tracing::info!(user_id = %user.id, "signed in");

    Ok(Json(
        json!({ "message": "SignIn Success", "user": UserProfile::from(&user) }),
    ))
}

/// `GET /user/signout`
pub async fn signout(
    session: Session,
    RequireUser(actor): RequireUser,
) -> Result<impl IntoResponse> {
    clear_acting_user(&session).await?;
    clear_sentry_user();
    tracing::info!(user_id = %actor.id, "signed out");

    Ok(Json(json!({ "message": "SignOut Success" })))
}
