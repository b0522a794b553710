//! Account service: profiles, customer management and admin promotion.
//!
//! Deleting an account gives the stock held by its cart back to the items in
//! the same unit of work.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use bazaar_core::accounts::validate_name;
use bazaar_core::{CommerceError, Email, Order, RootAdmin, User, UserId};

use super::auth::{AuthError, hash_password, validate_password};
use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::ActingUser;

/// Which change to the root admin was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootAdminAction {
    Edit,
    Delete,
    ChangeStatus,
}

/// Errors from account management.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Customer not found")]
    CustomerNotFound,

    #[error("Customer not found or customer is admin")]
    CustomerNotFoundOrAdmin,

    #[error("User not found")]
    UserNotFound,

    /// The root admin is protected.
    #[error("{0}")]
    RootAdmin(RootAdminAction),

    /// A profile field failed the signup rules.
    #[error(transparent)]
    Credentials(#[from] AuthError),

    /// Releasing held stock failed.
    #[error(transparent)]
    Commerce(#[from] CommerceError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl std::fmt::Display for RootAdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Edit => write!(f, "Cannot change the main Admin"),
            Self::Delete => write!(f, "Cannot delete the main Admin"),
            Self::ChangeStatus => write!(f, "Cannot change the status of the main Admin"),
        }
    }
}

/// Profile changes. Absent fields are left alone.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// An order together with the account that placed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerOrder {
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: Email,
    #[serde(flatten)]
    pub order: Order,
}

pub struct AccountService<'a> {
    store: &'a dyn Store,
    root: &'a RootAdmin,
}

impl<'a> AccountService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, root: &'a RootAdmin) -> Self {
        Self { store, root }
    }

    /// The acting user's own document.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account was deleted.
    pub async fn profile(&self, actor: &ActingUser) -> Result<User, AccountError> {
        self.store
            .get_user(actor.id)
            .await?
            .ok_or(AccountError::UserNotFound)
    }

    /// Change the acting user's profile.
    ///
    /// Provided fields go through the signup rules. The root admin cannot
    /// edit itself this way.
    ///
    /// # Errors
    ///
    /// - `AccountError::RootAdmin` for the root admin
    /// - `AccountError::Credentials` for a bad or taken field
    /// - `AccountError::UserNotFound` if the account was deleted
    #[instrument(skip_all, fields(user_id = %actor.id))]
    pub async fn update_profile(
        &self,
        actor: &ActingUser,
        update: ProfileUpdate,
    ) -> Result<User, AccountError> {
        if self.root.owns(&actor.email) {
            return Err(AccountError::RootAdmin(RootAdminAction::Edit));
        }

        let name = update
            .name
            .as_deref()
            .map(validate_name)
            .transpose()
            .map_err(|_| AuthError::InvalidName)?;
        let email = update
            .email
            .as_deref()
            .map(Email::parse)
            .transpose()
            .map_err(AuthError::from)?;
        if email.as_ref().is_some_and(|e| self.root.owns(e)) {
            return Err(AuthError::EmailTaken(self.root.email().to_string()).into());
        }
        let password_hash = match update.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        if self.root.is(&user) {
            return Err(AccountError::RootAdmin(RootAdminAction::Edit));
        }

        if let Some(name) = name {
            user.name = name;
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        if update.date_of_birth.is_some() {
            user.date_of_birth = update.date_of_birth;
        }

        uow.save_user(&user).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                AccountError::from(AuthError::EmailTaken(user.email.to_string()))
            }
            other => other.into(),
        })?;
        uow.commit().await?;
        Ok(user)
    }

    /// Delete the acting user's account.
    ///
    /// # Errors
    ///
    /// - `AccountError::RootAdmin` for the root admin
    /// - `AccountError::UserNotFound` if the account was already deleted
    #[instrument(skip_all, fields(user_id = %actor.id))]
    pub async fn delete_profile(&self, actor: &ActingUser) -> Result<(), AccountError> {
        if self.root.owns(&actor.email) {
            return Err(AccountError::RootAdmin(RootAdminAction::Delete));
        }
        let mut uow = self.store.begin().await?;
        let user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        if self.root.is(&user) {
            return Err(AccountError::RootAdmin(RootAdminAction::Delete));
        }
        delete_with_cart(uow, &user).await
    }

    /// Every non-admin account, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn customers(&self) -> Result<Vec<User>, AccountError> {
        let users = self.store.list_users().await?;
        Ok(users.into_iter().filter(|u| !u.is_admin).collect())
    }

    /// # Errors
    ///
    /// Returns `AccountError::CustomerNotFound` if there is no such account or
    /// it belongs to an admin.
    pub async fn customer(&self, id: UserId) -> Result<User, AccountError> {
        self.store
            .get_user(id)
            .await?
            .filter(|u| !u.is_admin)
            .ok_or(AccountError::CustomerNotFound)
    }

    /// Delete a customer account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::CustomerNotFoundOrAdmin` if there is no such
    /// account or it belongs to an admin.
    #[instrument(skip(self))]
    pub async fn delete_customer(&self, id: UserId) -> Result<(), AccountError> {
        let mut uow = self.store.begin().await?;
        let user = uow
            .user_for_update(id)
            .await?
            .filter(|u| !u.is_admin)
            .ok_or(AccountError::CustomerNotFoundOrAdmin)?;
        delete_with_cart(uow, &user).await
    }

    /// Grant or revoke admin rights by email.
    ///
    /// # Errors
    ///
    /// - `AccountError::RootAdmin` when targeting the root admin
    /// - `AccountError::UserNotFound` if no account uses the email
    #[instrument(skip(self))]
    pub async fn set_admin(&self, email: &str, is_admin: bool) -> Result<User, AccountError> {
        let email = Email::parse(email).map_err(|_| AccountError::UserNotFound)?;
        if self.root.owns(&email) {
            return Err(AccountError::RootAdmin(RootAdminAction::ChangeStatus));
        }

        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_by_email_for_update(&email)
            .await?
            .ok_or(AccountError::UserNotFound)?;
        if user.is_admin != is_admin {
            user.is_admin = is_admin;
            uow.save_user(&user).await?;
        }
        uow.commit().await?;
        tracing::info!(user_id = %user.id, "admin status changed");
        Ok(user)
    }

    /// Every order of every account, grouped by account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Repository` if the store fails.
    pub async fn all_orders(&self) -> Result<Vec<CustomerOrder>, AccountError> {
        let users = self.store.list_users().await?;
        Ok(users
            .into_iter()
            .flat_map(|user| {
                let User {
                    id,
                    name,
                    email,
                    orders,
                    ..
                } = user;
                orders.into_iter().map(move |order| CustomerOrder {
                    user_id: id,
                    user_name: name.clone(),
                    user_email: email.clone(),
                    order,
                })
            })
            .collect())
    }
}

/// Release every cart reservation of `user`, then delete it, in `uow`.
///
/// Items are locked in ascending id order after the user row.
async fn delete_with_cart(mut uow: Box<dyn UnitOfWork>, user: &User) -> Result<(), AccountError> {
    let mut cart = user.cart.clone();
    for id in cart.item_ids() {
        let mut item = uow.item_for_update(id).await?;
        cart.remove_line(id, item.as_mut())?;
        if let Some(item) = item {
            uow.save_item(&item).await?;
        }
    }

    if !uow.delete_user(user.id).await? {
        return Err(AccountError::UserNotFound);
    }
    uow.commit().await?;
    tracing::info!(user_id = %user.id, "account deleted");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::{Quantity, ShippingAddress};

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::{CartService, CheckoutService, testing};

    fn root() -> RootAdmin {
        RootAdmin::new(Email::parse("admin@example.com").unwrap())
    }

    #[tokio::test]
    async fn test_root_admin_is_protected() {
        let store = MemoryStore::new();
        let root = root();
        let admin = testing::user(&store, "admin@example.com", true).await;
        let actor = testing::acting(&admin);
        let accounts = AccountService::new(&store, &root);

        let err = accounts
            .update_profile(
                &actor,
                ProfileUpdate {
                    email: Some("admin1234@example.com".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot change the main Admin");

        let err = accounts.delete_profile(&actor).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete the main Admin");

        let err = accounts.set_admin("ADMIN@example.com", false).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot change the status of the main Admin");
        assert!(store.get_user(admin.id).await.unwrap().unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_update_profile_fields() {
        let store = MemoryStore::new();
        let root = root();
        let user = testing::user(&store, "customer6@customer.com", false).await;
        testing::user(&store, "taken@customer.com", false).await;
        let accounts = AccountService::new(&store, &root);
        let actor = testing::acting(&user);

        let updated = accounts
            .update_profile(
                &actor,
                ProfileUpdate {
                    email: Some("Customer7@Customer.com".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email.as_str(), "customer7@customer.com");
        assert_eq!(updated.name, user.name);

        let err = accounts
            .update_profile(
                &actor,
                ProfileUpdate {
                    email: Some("taken@customer.com".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "taken@customer.com: email already exist");

        let err = accounts
            .update_profile(
                &actor,
                ProfileUpdate {
                    password: Some("short".to_owned()),
                    ..ProfileUpdate::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::Credentials(AuthError::WeakPassword)));
    }

    #[tokio::test]
    async fn test_customer_lookup_hides_admins() {
        let store = MemoryStore::new();
        let root = root();
        let admin = testing::user(&store, "admin@example.com", true).await;
        let customer = testing::user(&store, "customer4@customer.com", false).await;
        let accounts = AccountService::new(&store, &root);

        let customers = accounts.customers().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].id, customer.id);
        assert!(matches!(
            accounts.customer(admin.id).await,
            Err(AccountError::CustomerNotFound)
        ));

        let err = accounts.delete_customer(admin.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Customer not found or customer is admin");
    }

    #[tokio::test]
    async fn test_deleting_customer_releases_cart_stock() {
        let store = MemoryStore::new();
        let root = root();
        let item = testing::item(&store, "Dune", 10, 150).await;
        let customer = testing::user(&store, "customer4@customer.com", false).await;
        let actor = testing::acting(&customer);
        CartService::new(&store)
            .add_line(&actor, item.id, Quantity::new(10).unwrap())
            .await
            .unwrap();
        assert_eq!(testing::stock(&store, &item).await, 140);

        AccountService::new(&store, &root)
            .delete_customer(customer.id)
            .await
            .unwrap();

        assert_eq!(testing::stock(&store, &item).await, 150);
        assert!(store.get_user(customer.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_promotion_and_all_orders() {
        let store = MemoryStore::new();
        let root = root();
        let item = testing::item(&store, "Dune", 10, 150).await;
        let customer = testing::user(&store, "customer5@customer.com", false).await;
        let actor = testing::acting(&customer);
        CartService::new(&store)
            .add_line(&actor, item.id, Quantity::new(2).unwrap())
            .await
            .unwrap();
        CheckoutService::new(&store)
            .checkout(
                &actor,
                ShippingAddress {
                    address: "Downtown".to_owned(),
                    city: "Dubai".to_owned(),
                },
            )
            .await
            .unwrap();

        let accounts = AccountService::new(&store, &root);
        let orders = accounts.all_orders().await.unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].user_id, customer.id);

        let json = serde_json::to_value(&orders[0]).unwrap();
        assert_eq!(json["userEmail"], "customer5@customer.com");
        assert_eq!(json["totalAmount"], 20.0);

        let promoted = accounts.set_admin("customer5@customer.com", true).await.unwrap();
        assert!(promoted.is_admin);
        assert!(matches!(
            accounts.set_admin("nobody@customer.com", true).await,
            Err(AccountError::UserNotFound)
        ));
    }
}
