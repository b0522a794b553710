//! Own-profile handlers, shared by customers and admins.

use axum::{Json, extract::State};
use serde_json::{Value, json};
use tower_sessions::Session;

use bazaar_core::User;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::{RequireUser, clear_acting_user};
use crate::models::{ActingUser, UserProfile, session_keys};
use crate::routes::extract::AppJson;
use crate::services::AccountService;
use crate::services::accounts::ProfileUpdate;
use crate::state::AppState;

pub(crate) const PROFILE_DELETED: &str = "Profile deleted successfully";

pub(crate) async fn load(state: &AppState, actor: &ActingUser) -> Result<User> {
    Ok(AccountService::new(state.store(), state.root_admin())
        .profile(actor)
        .await?)
}

/// Apply `update` and keep the session's copy of the identity current.
pub(crate) async fn apply_update(
    state: &AppState,
    session: &Session,
    actor: &ActingUser,
    update: ProfileUpdate,
) -> Result<User> {
    let user = AccountService::new(state.store(), state.root_admin())
        .update_profile(actor, update)
        .await?;
    session
        .insert(session_keys::ACTING_USER, ActingUser::from(&user))
        .await?;
    Ok(user)
}

pub(crate) async fn remove(state: &AppState, session: &Session, actor: &ActingUser) -> Result<()> {
    AccountService::new(state.store(), state.root_admin())
        .delete_profile(actor)
        .await?;
    clear_acting_user(session).await?;
    clear_sentry_user();
    tracing::info!(user_id = %actor.id, "profile deleted");
    Ok(())
}

/// `GET /customer/profile`
pub async fn show(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
) -> Result<Json<Value>> {
    let user = load(&state, &actor).await?;
    Ok(Json(json!({ "user": UserProfile::from(user) })))
}

/// `PUT /customer/profile`
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireUser(actor): RequireUser,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<Value>> {
    let user = apply_update(&state, &session, &actor, update).await?;
    Ok(Json(json!({ "user": UserProfile::from(user) })))
}

/// `DELETE /customer/profile`
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireUser(actor): RequireUser,
) -> Result<Json<Value>> {
    remove(&state, &session, &actor).await?;
    Ok(Json(json!({ "message": PROFILE_DELETED })))
}
