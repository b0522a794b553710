//! Customer management.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use bazaar_core::UserId;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::UserProfile;
use crate::routes::extract::AppPath;
use crate::routes::parse_path_id;
use crate::services::{AccountError, AccountService};
use crate::state::AppState;

/// `GET /admin/customers`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<UserProfile>>> {
    let customers = AccountService::new(state.store(), state.root_admin())
        .customers()
        .await?;
    Ok(Json(customers.into_iter().map(UserProfile::from).collect()))
}

/// `GET /admin/customers/{id}`
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppPath(id): AppPath<String>,
) -> Result<Json<UserProfile>> {
    let id: UserId = parse_path_id(&id).ok_or(AccountError::CustomerNotFound)?;
    let customer = AccountService::new(state.store(), state.root_admin())
        .customer(id)
        .await?;
    Ok(Json(UserProfile::from(customer)))
}

/// `DELETE /admin/customers/{id}`
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>> {
    let id: UserId = parse_path_id(&id).ok_or(AccountError::CustomerNotFoundOrAdmin)?;
    AccountService::new(state.store(), state.root_admin())
        .delete_customer(id)
        .await?;
    tracing::info!(customer_id = %id, admin_id = %admin.actor.id, "customer deleted");
    Ok(Json(json!({ "message": "Customer profile deleted successfully" })))
}
