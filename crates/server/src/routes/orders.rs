//! Customer order history.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::CheckoutService;
use crate::state::AppState;

/// `GET /customer/orders`
pub async fn index(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
) -> Result<Json<Value>> {
    let orders = CheckoutService::new(state.store()).orders(&actor).await?;
    Ok(Json(json!({ "orders": orders })))
}
