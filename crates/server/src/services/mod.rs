//! Business logic services.
//!
//! Each service borrows the [`Store`](crate::db::Store) and takes the acting
//! user as an explicit argument. Operations that change more than one
//! document run in a single unit of work: every rule is checked before the
//! first write, and an early return drops the unit of work, discarding
//! anything staged.
//!
//! # Services
//!
//! - `auth` - Signup, signin and password hashing
//! - `accounts` - Profiles, customer management, admin promotion
//! - `catalog` - Item CRUD and search
//! - `cart` - Cart lines and the stock they reserve
//! - `checkout` - Turning a cart into an order

pub mod accounts;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;

use thiserror::Error;

use bazaar_core::CommerceError;

use crate::db::RepositoryError;

pub use accounts::{AccountError, AccountService};
pub use auth::{AuthError, AuthService};
pub use cart::CartService;
pub use catalog::CatalogService;
pub use checkout::CheckoutService;

/// Errors from the catalog, cart and checkout services.
#[derive(Debug, Error)]
pub enum ShopError {
    /// A business rule rejected the operation.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use bazaar_core::{Email, Item, NewItem, NewUser, Stock, User};
    use rust_decimal::Decimal;

    use crate::db::{MemoryStore, Store};
    use crate::models::ActingUser;

    pub(crate) async fn item(store: &MemoryStore, title: &str, price: i64, count: u32) -> Item {
        store
            .insert_item(NewItem {
                title: title.to_owned(),
                image: format!("https://example.com/{title}.png"),
                price: Decimal::new(price, 0),
                description: format!("{title} description"),
                available_count: Stock::new(count).unwrap(),
                category: "Books".to_owned(),
            })
            .await
            .unwrap()
    }

    pub(crate) async fn user(store: &MemoryStore, email: &str, is_admin: bool) -> User {
        store
            .insert_user(NewUser {
                name: "Customer-6".to_owned(),
                email: Email::parse(email).unwrap(),
                password_hash: "not-a-real-hash".to_owned(),
                date_of_birth: None,
                is_admin,
            })
            .await
            .unwrap()
    }

    pub(crate) fn acting(user: &User) -> ActingUser {
        ActingUser::from(user)
    }

    pub(crate) async fn stock(store: &MemoryStore, item: &Item) -> u32 {
        store
            .get_item(item.id)
            .await
            .unwrap()
            .unwrap()
            .available_count
            .get()
    }
}
