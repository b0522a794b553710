//! Admin routes. Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin).

pub mod admins;
pub mod customers;
pub mod items;
pub mod orders;

use axum::{
    Router,
    routing::{get, put},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(items::index).post(items::create))
        .route("/items/search", get(items::search))
        .route(
            "/items/{id}",
            get(items::show).put(items::update).delete(items::delete),
        )
        .route("/customers", get(customers::index))
        .route(
            "/customers/{id}",
            get(customers::show).delete(customers::delete),
        )
        .route("/orders", get(orders::index))
        .route("/new-admin", put(admins::set_admin))
        .route(
            "/profile",
            get(admins::profile)
                .put(admins::update_profile)
                .delete(admins::delete_profile),
        )
}
