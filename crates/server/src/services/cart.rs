//! Cart service.
//!
//! Every change to a cart line moves the same number of units through the
//! item's stock, so the user and the item are loaded, changed and saved in one
//! unit of work. The user is locked before the item.

use serde_json::Value;
use tracing::instrument;

use bazaar_core::{CommerceError, ItemId, Quantity};

use super::ShopError;
use crate::db::Store;
use crate::models::{ActingUser, CartLineView};

/// Read a quantity from a JSON body.
///
/// Accepts a positive integer or a string holding one (form posts send
/// strings). Anything else, including a missing value, is
/// `CommerceError::InvalidQuantity`.
///
/// # Errors
///
/// Returns `CommerceError::InvalidQuantity` for anything that is not a whole
/// number of at least one.
pub fn parse_quantity(value: Option<&Value>) -> Result<Quantity, CommerceError> {
    let raw = match value {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    raw.and_then(|n| Quantity::try_from(n).ok())
        .ok_or(CommerceError::InvalidQuantity)
}

pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The acting user's cart lines joined with their items.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the user is gone or a line points
    /// at a deleted item.
    #[instrument(skip_all, fields(user_id = %actor.id))]
    pub async fn list_lines(&self, actor: &ActingUser) -> Result<Vec<CartLineView>, ShopError> {
        let user = self
            .store
            .get_user(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;

        let mut lines = Vec::with_capacity(user.cart.len());
        for line in user.cart.lines() {
            let item = self
                .store
                .get_item(line.item_id)
                .await?
                .ok_or_else(CommerceError::item_not_found)?;
            lines.push(CartLineView::new(line, &item)?);
        }
        Ok(lines)
    }

    /// Reserve `quantity` units of an item in a new cart line.
    ///
    /// # Errors
    ///
    /// - `CommerceError::NotFound` for a missing item, then a missing user
    /// - `CommerceError::DuplicateLine` if the cart already holds the item
    /// - `CommerceError::InsufficientStock` if the item cannot cover it
    #[instrument(skip_all, fields(user_id = %actor.id, %item_id, quantity = quantity.get()))]
    pub async fn add_line(
        &self,
        actor: &ActingUser,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<(), ShopError> {
        let mut uow = self.store.begin().await?;
        let user = uow.user_for_update(actor.id).await?;
        let mut item = uow
            .item_for_update(item_id)
            .await?
            .ok_or_else(CommerceError::item_not_found)?;
        let mut user = user.ok_or_else(CommerceError::user_not_found)?;

        user.cart.add_line(&mut item, quantity)?;

        uow.save_item(&item).await?;
        uow.save_user(&user).await?;
        uow.commit().await?;
        tracing::debug!(available = item.available_count.get(), "line added");
        Ok(())
    }

    /// Reserve `quantity` more units for an existing line.
    ///
    /// # Errors
    ///
    /// - `CommerceError::NotInCart` if there is no line for the item
    /// - `CommerceError::InsufficientStock` if the item cannot cover it
    #[instrument(skip_all, fields(user_id = %actor.id, %item_id, quantity = quantity.get()))]
    pub async fn increase_line(
        &self,
        actor: &ActingUser,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<(), ShopError> {
        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;
        if user.cart.line(item_id).is_none() {
            return Err(CommerceError::NotInCart.into());
        }
        let mut item = uow
            .item_for_update(item_id)
            .await?
            .ok_or_else(CommerceError::item_not_found)?;

        user.cart.increase_line(&mut item, quantity)?;

        uow.save_item(&item).await?;
        uow.save_user(&user).await?;
        uow.commit().await?;
        Ok(())
    }

    /// Give `quantity` units of an existing line back to stock. The line must
    /// keep at least one unit.
    ///
    /// # Errors
    ///
    /// - `CommerceError::NotInCart` if there is no line for the item
    /// - `CommerceError::DecreaseWouldEmpty` if `quantity` is not below what
    ///   the line holds
    #[instrument(skip_all, fields(user_id = %actor.id, %item_id, quantity = quantity.get()))]
    pub async fn decrease_line(
        &self,
        actor: &ActingUser,
        item_id: ItemId,
        quantity: Quantity,
    ) -> Result<(), ShopError> {
        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;
        if user.cart.line(item_id).is_none() {
            return Err(CommerceError::NotInCart.into());
        }
        let mut item = uow
            .item_for_update(item_id)
            .await?
            .ok_or_else(CommerceError::item_not_found)?;

        user.cart.decrease_line(&mut item, quantity)?;

        uow.save_item(&item).await?;
        uow.save_user(&user).await?;
        uow.commit().await?;
        Ok(())
    }

    /// Drop a line and return its units to stock.
    ///
    /// A line whose item has been deleted is dropped without releasing
    /// anything.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotInCart` if there is no line for the item.
    #[instrument(skip_all, fields(user_id = %actor.id, %item_id))]
    pub async fn remove_line(&self, actor: &ActingUser, item_id: ItemId) -> Result<(), ShopError> {
        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;
        if user.cart.line(item_id).is_none() {
            return Err(CommerceError::NotInCart.into());
        }
        let mut item = uow.item_for_update(item_id).await?;

        let removed = user.cart.remove_line(item_id, item.as_mut())?;

        if let Some(item) = &item {
            uow.save_item(item).await?;
        } else {
            tracing::warn!("removed cart line for a deleted item");
        }
        uow.save_user(&user).await?;
        uow.commit().await?;
        tracing::debug!(released = removed.quantity.get(), "line removed");
        Ok(())
    }
}
