//! Cart lines as listed to the customer.

use rust_decimal::Decimal;
use serde::Serialize;

use bazaar_core::{CartLine, CommerceError, Item, ItemId, Price, Quantity};

/// A cart line joined with its item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub item_id: ItemId,
    pub item_name: String,
    pub quantity: Quantity,
    pub price: Price,
    #[serde(serialize_with = "rust_decimal::serde::float::serialize")]
    pub total_price: Decimal,
}

impl CartLineView {
    /// # Errors
    ///
    /// Returns [`CommerceError::AmountOverflow`] if the line total does not
    /// fit a decimal.
    pub fn new(line: &CartLine, item: &Item) -> Result<Self, CommerceError> {
        Ok(Self {
            item_id: line.item_id,
            item_name: item.title.clone(),
            quantity: line.quantity,
            price: item.price,
            total_price: item
                .price
                .line_total(line.quantity)
                .ok_or(CommerceError::AmountOverflow)?,
        })
    }
}
