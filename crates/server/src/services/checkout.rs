//! Checkout service and order history.

use chrono::Utc;
use tracing::instrument;

use bazaar_core::{CommerceError, Order, OrderId, ShippingAddress, orders};

use super::ShopError;
use crate::db::Store;
use crate::models::ActingUser;

pub struct CheckoutService<'a> {
    store: &'a dyn Store,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Turn the acting user's cart into an order.
    ///
    /// Stock is left alone: it was reserved line by line as the cart was
    /// filled. The cart items are locked so the snapshot sees one consistent
    /// price per item.
    ///
    /// # Errors
    ///
    /// - `CommerceError::EmptyCart` if the cart has no lines
    /// - `CommerceError::InvalidInput` if the address or city is blank
    /// - `CommerceError::NotFound` if a line points at a deleted item
    #[instrument(skip_all, fields(user_id = %actor.id))]
    pub async fn checkout(
        &self,
        actor: &ActingUser,
        shipping_address: ShippingAddress,
    ) -> Result<Order, ShopError> {
        let mut uow = self.store.begin().await?;
        let mut user = uow
            .user_for_update(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;

        let mut items = Vec::with_capacity(user.cart.len());
        for id in user.cart.item_ids() {
            if let Some(item) = uow.item_for_update(id).await? {
                items.push(item);
            }
        }

        let order = orders::checkout(
            &mut user,
            &items,
            shipping_address,
            OrderId::generate(),
            Utc::now(),
        )?;

        uow.save_user(&user).await?;
        uow.commit().await?;
        tracing::info!(
            order_id = %order.id,
            total = %order.total_amount,
            lines = order.items.len(),
            "order placed"
        );
        Ok(order)
    }

    /// The acting user's orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the user is gone.
    pub async fn orders(&self, actor: &ActingUser) -> Result<Vec<Order>, ShopError> {
        let user = self
            .store
            .get_user(actor.id)
            .await?
            .ok_or_else(CommerceError::user_not_found)?;
        Ok(user.orders)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bazaar_core::Quantity;
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::{CartService, testing};

    fn downtown() -> ShippingAddress {
        ShippingAddress {
            address: "Downtown".to_owned(),
            city: "Dubai".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let store = MemoryStore::new();
        let user = testing::user(&store, "customer6@customer.com", false).await;
        let err = CheckoutService::new(&store)
            .checkout(&testing::acting(&user), downtown())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Cart is empty");
    }

    #[tokio::test]
    async fn test_checkout_snapshots_and_clears_cart() {
        let store = MemoryStore::new();
        let item = testing::item(&store, "Dune", 10, 150).await;
        let user = testing::user(&store, "customer6@customer.com", false).await;
        let actor = testing::acting(&user);
        CartService::new(&store)
            .add_line(&actor, item.id, Quantity::new(8).unwrap())
            .await
            .unwrap();

        let checkout = CheckoutService::new(&store);
        let order = checkout.checkout(&actor, downtown()).await.unwrap();
        assert_eq!(order.total_amount, Decimal::new(80, 0));
        assert_eq!(order.items[0].title, "Dune");
        assert_eq!(order.shipping_address.city, "Dubai");

        assert_eq!(testing::stock(&store, &item).await, 142);
        let stored = store.get_user(user.id).await.unwrap().unwrap();
        assert!(stored.cart.is_empty());
        assert_eq!(checkout.orders(&actor).await.unwrap(), vec![order]);
    }

    #[tokio::test]
    async fn test_blank_address_leaves_cart_alone() {
        let store = MemoryStore::new();
        let item = testing::item(&store, "Dune", 10, 5).await;
        let user = testing::user(&store, "customer6@customer.com", false).await;
        let actor = testing::acting(&user);
        CartService::new(&store)
            .add_line(&actor, item.id, Quantity::ONE)
            .await
            .unwrap();

        let blank = ShippingAddress {
            address: "  ".to_owned(),
            city: "Dubai".to_owned(),
        };
        assert!(CheckoutService::new(&store).checkout(&actor, blank).await.is_err());

        let stored = store.get_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.cart.len(), 1);
        assert!(stored.orders.is_empty());
    }
}
