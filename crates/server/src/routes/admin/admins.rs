//! Admin promotion and the admin's own profile.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::UserProfile;
use crate::routes::extract::AppJson;
use crate::routes::profile;
use crate::services::AccountService;
use crate::services::accounts::ProfileUpdate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminGrant {
    #[serde(default)]
    pub email: String,
    pub is_admin: bool,
}

/// `PUT /admin/new-admin`
pub async fn set_admin(
    State(state): State<AppState>,
    admin: RequireAdmin,
    AppJson(grant): AppJson<AdminGrant>,
) -> Result<Json<UserProfile>> {
    let user = AccountService::new(state.store(), state.root_admin())
        .set_admin(&grant.email, grant.is_admin)
        .await?;
    tracing::info!(
        user_id = %user.id,
        is_admin = user.is_admin,
        admin_id = %admin.actor.id,
        "admin rights updated"
    );
    Ok(Json(UserProfile::from(user)))
}

/// `GET /admin/profile`
pub async fn profile(admin: RequireAdmin) -> Json<UserProfile> {
    Json(UserProfile::from(admin.user))
}

/// `PUT /admin/profile`
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<UserProfile>> {
    let user = profile::apply_update(&state, &session, &admin.actor, update).await?;
    Ok(Json(UserProfile::from(user)))
}

/// `DELETE /admin/profile`
pub async fn delete_profile(
    State(state): State<AppState>,
    session: Session,
    admin: RequireAdmin,
) -> Result<Json<Value>> {
    profile::remove(&state, &session, &admin.actor).await?;
    Ok(Json(json!({ "message": profile::PROFILE_DELETED })))
}
