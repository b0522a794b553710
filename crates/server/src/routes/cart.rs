//! Customer cart and checkout.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use bazaar_core::{CommerceError, ItemId, ShippingAddress};

use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::routes::extract::{AppJson, AppQuery};
use crate::routes::parse_id;
use crate::services::cart::parse_quantity;
use crate::services::{CartService, CheckoutService};
use crate::state::AppState;

const MISSING_CART_FLAG: &str =
    "Please provide cart params either addToCart=add or removeFromCart=remove";

/// Body of the cart mutations. Fields are checked by the handlers so a bad
/// value gets the matching business message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineBody {
    #[serde(default)]
    pub item_id: Value,
    #[serde(default)]
    pub quantity: Option<Value>,
}

impl CartLineBody {
    fn item_id(&self) -> std::result::Result<ItemId, CommerceError> {
        parse_id(&self.item_id).ok_or_else(CommerceError::item_not_found)
    }
}

/// `PUT /customer/cart` query flags.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartFlags {
    pub add_to_cart: Option<String>,
    pub remove_from_cart: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineChange {
    Increase,
    Decrease,
}

impl CartFlags {
    fn change(&self) -> Option<LineChange> {
        if self.add_to_cart.as_deref() == Some("add") {
            Some(LineChange::Increase)
        } else if self.remove_from_cart.as_deref() == Some("remove") {
            Some(LineChange::Decrease)
        } else {
            None
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AddressBody {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[serde(default, alias = "ShippingAddress")]
    pub shipping_address: AddressBody,
}

/// `GET /customer/cart`
pub async fn show(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
) -> Result<Json<Value>> {
    let lines = CartService::new(state.store()).list_lines(&actor).await?;
    Ok(Json(json!({ "cart": lines })))
}

/// `POST /customer/cart`
pub async fn add(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    AppJson(body): AppJson<CartLineBody>,
) -> Result<Json<Value>> {
    let quantity = parse_quantity(body.quantity.as_ref())?;
    let item_id = body.item_id()?;

    CartService::new(state.store())
        .add_line(&actor, item_id, quantity)
        .await?;
    Ok(Json(json!({ "message": "Item added to cart" })))
}

/// `PUT /customer/cart?addToCart=add` or `PUT /customer/cart?removeFromCart=remove`
pub async fn update(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    AppQuery(flags): AppQuery<CartFlags>,
    AppJson(body): AppJson<CartLineBody>,
) -> Result<Json<Value>> {
    let change = flags
        .change()
        .ok_or_else(|| AppError::BadRequest(MISSING_CART_FLAG.to_owned()))?;
    let quantity = parse_quantity(body.quantity.as_ref())?;
    let item_id = body.item_id().map_err(|_| CommerceError::NotInCart)?;

    let cart = CartService::new(state.store());
    let message = match change {
        LineChange::Increase => {
            cart.increase_line(&actor, item_id, quantity).await?;
            "Item in cart quantity added successfully"
        }
        LineChange::Decrease => {
            cart.decrease_line(&actor, item_id, quantity).await?;
            "Item in cart quantity removed successfully"
        }
    };
    Ok(Json(json!({ "message": message })))
}

/// `DELETE /customer/cart`
pub async fn remove(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    AppJson(body): AppJson<CartLineBody>,
) -> Result<Json<Value>> {
    let item_id = body.item_id().map_err(|_| CommerceError::NotInCart)?;

    CartService::new(state.store())
        .remove_line(&actor, item_id)
        .await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

/// `POST /customer/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(actor): RequireUser,
    AppJson(body): AppJson<CheckoutBody>,
) -> Result<Json<Value>> {
    let AddressBody { address, city } = body.shipping_address;

    let order = CheckoutService::new(state.store())
        .checkout(&actor, ShippingAddress { address, city })
        .await?;
    Ok(Json(json!({ "message": "Order placed successfully", "order": order })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flags() {
        let flags: CartFlags = serde_json::from_value(json!({ "addToCart": "add" })).unwrap();
        assert_eq!(flags.change(), Some(LineChange::Increase));

        let flags: CartFlags =
            serde_json::from_value(json!({ "removeFromCart": "remove" })).unwrap();
        assert_eq!(flags.change(), Some(LineChange::Decrease));

        let flags: CartFlags = serde_json::from_value(json!({ "addToCart": "yes" })).unwrap();
        assert_eq!(flags.change(), None);
        assert_eq!(CartFlags::default().change(), None);
    }

    #[test]
    fn test_checkout_body_accepts_either_casing() {
        let body: CheckoutBody = serde_json::from_value(json!({
            "ShippingAddress": { "address": "Downtown", "city": "Dubai" }
        }))
        .unwrap();
        assert_eq!(body.shipping_address.city, "Dubai");

        let body: CheckoutBody = serde_json::from_value(json!({})).unwrap();
        assert!(body.shipping_address.address.is_empty());
    }
}
