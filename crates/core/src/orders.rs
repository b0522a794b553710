//! Placed orders and the checkout transition.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CommerceError, Item, ItemId, OrderId, Price, Quantity, User};

/// Where an order ships to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
}

impl ShippingAddress {
    /// Trim both fields and require them to be non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidInput`] naming the blank field.
    pub fn validated(self) -> Result<Self, CommerceError> {
        let address = self.address.trim().to_owned();
        let city = self.city.trim().to_owned();
        if address.is_empty() {
            return Err(CommerceError::InvalidInput(
                "shipping address is required".to_owned(),
            ));
        }
        if city.is_empty() {
            return Err(CommerceError::InvalidInput("shipping city is required".to_owned()));
        }
        Ok(Self { address, city })
    }
}

/// An item as it was when the order was placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item_id: ItemId,
    pub title: String,
    pub quantity: Quantity,
    /// Unit price at checkout.
    pub price: Price,
}

/// An immutable order snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_amount: Decimal,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

/// Turn the user's cart into an order and empty the cart.
///
/// `items` must contain the current document of every item in the cart.
/// Stock is not touched: it was reserved when the lines were added. The order
/// is appended to the user's history and a copy is returned.
///
/// # Errors
///
/// - [`CommerceError::EmptyCart`] if the cart has no lines
/// - [`CommerceError::InvalidInput`] if the shipping address is blank
/// - [`CommerceError::NotFound`] if a cart line points at a deleted item
/// - [`CommerceError::AmountOverflow`] if the total does not fit a decimal
pub fn checkout(
    user: &mut User,
    items: &[Item],
    shipping_address: ShippingAddress,
    id: OrderId,
    created_at: DateTime<Utc>,
) -> Result<Order, CommerceError> {
    if user.cart.is_empty() {
        return Err(CommerceError::EmptyCart);
    }
    let shipping_address = shipping_address.validated()?;

    let lines = user
        .cart
        .lines()
        .iter()
        .map(|line| {
            let item = items
                .iter()
                .find(|item| item.id == line.item_id)
                .ok_or_else(CommerceError::item_not_found)?;
            Ok(OrderLine {
                item_id: item.id,
                title: item.title.clone(),
                quantity: line.quantity,
                price: item.price,
            })
        })
        .collect::<Result<Vec<_>, CommerceError>>()?;

    let total_amount = lines
        .iter()
        .try_fold(Decimal::ZERO, |total, line| {
            line.price
                .line_total(line.quantity)
                .and_then(|amount| total.checked_add(amount))
        })
        .ok_or(CommerceError::AmountOverflow)?;

    let order = Order {
        id,
        items: lines,
        total_amount,
        shipping_address,
        created_at,
    };
    user.orders.push(order.clone());
    user.cart.clear();
    Ok(order)
}
