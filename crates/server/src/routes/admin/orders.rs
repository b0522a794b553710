//! Every order in the shop.

use axum::{Json, extract::State};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::AccountService;
use crate::services::accounts::CustomerOrder;
use crate::state::AppState;

/// `GET /admin/orders`
pub async fn index(
    State(state): State<AppState>,
    _admin: RequireAdmin,
) -> Result<Json<Vec<CustomerOrder>>> {
    let orders = AccountService::new(state.store(), state.root_admin())
        .all_orders()
        .await?;
    Ok(Json(orders))
}
