//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                    - Liveness
//! GET    /health/ready              - Store reachability
//!
//! # Auth
//! POST   /user/signup               - Create a customer and sign in
//! POST   /user/signin               - Sign in
//! GET    /user/signout              - Sign out (signed in)
//!
//! # Catalog (public)
//! GET    /customer/items            - Search the catalog
//! GET    /customer/items/{id}       - Item detail
//!
//! # Customer (signed in)
//! GET    /customer/cart             - Cart lines with totals
//! POST   /customer/cart             - Add a line
//! PUT    /customer/cart             - Change a line (?addToCart=add | ?removeFromCart=remove)
//! DELETE /customer/cart             - Remove a line
//! POST   /customer/checkout         - Place an order
//! GET    /customer/orders           - Order history
//! GET    /customer/profile          - Own profile
//! PUT    /customer/profile          - Edit own profile
//! DELETE /customer/profile          - Delete own account
//!
//! # Admin (signed in admin)
//! POST   /admin/items               - Create an item
//! GET    /admin/items               - All items
//! GET    /admin/items/search        - Search by name, description, genre
//! GET    /admin/items/{id}          - Item detail
//! PUT    /admin/items/{id}          - Partial update
//! DELETE /admin/items/{id}          - Delete an item
//! GET    /admin/customers           - All customers
//! GET    /admin/customers/{id}      - Customer detail
//! DELETE /admin/customers/{id}      - Delete a customer
//! GET    /admin/orders              - Every order with its customer
//! PUT    /admin/new-admin           - Grant or revoke admin rights
//! GET    /admin/profile             - Own profile
//! PUT    /admin/profile             - Edit own profile
//! DELETE /admin/profile             - Delete own account
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod extract;
pub mod orders;
pub mod profile;

use axum::{
    Router,
    routing::{get, post},
};
use serde_json::Value;

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/signin", post(auth::signin))
        .route("/signout", get(auth::signout))
}

/// Create the customer routes router.
pub fn customer_routes() -> Router<AppState> {
    Router::new()
        .route("/items", get(catalog::index))
        .route("/items/{id}", get(catalog::show))
        .route(
            "/cart",
            get(cart::show)
                .post(cart::add)
                .put(cart::update)
                .delete(cart::remove),
        )
        .route("/checkout", post(cart::checkout))
        .route("/orders", get(orders::index))
        .route(
            "/profile",
            get(profile::show)
                .put(profile::update)
                .delete(profile::delete),
        )
}

/// Create all routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/user", auth_routes())
        .nest("/customer", customer_routes())
        .nest("/admin", admin::routes())
}

/// Read a document id from a path segment or JSON value.
///
/// Ids are integers, but clients may send them as strings. Anything that is
/// not an id cannot name a document, so callers report it as not found.
pub(crate) fn parse_id<T: From<i32>>(raw: &Value) -> Option<T> {
    match raw {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
    .map(T::from)
}

/// [`parse_id`] for a path segment.
pub(crate) fn parse_path_id<T: From<i32>>(raw: &str) -> Option<T> {
    raw.trim().parse::<i32>().ok().map(T::from)
}

#[cfg(test)]
mod tests {
    use bazaar_core::ItemId;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id::<ItemId>(&json!(7)), Some(ItemId::new(7)));
        assert_eq!(parse_id::<ItemId>(&json!("7")), Some(ItemId::new(7)));
        assert_eq!(parse_id::<ItemId>(&json!("664e0f0139dd9c6b36f4811b")), None);
        assert_eq!(parse_id::<ItemId>(&json!(1.5)), None);
        assert_eq!(parse_id::<ItemId>(&json!(null)), None);
        assert_eq!(parse_path_id::<ItemId>("12"), Some(ItemId::new(12)));
        assert_eq!(parse_path_id::<ItemId>("abc"), None);
    }
}
