//! The per-user cart aggregate.
//!
//! Every operation that changes a line quantity moves the same number of
//! units through the item's [`Stock`](crate::Stock), so the pair must be
//! persisted together. Each method validates first and mutates last: when an
//! error is returned neither the cart nor the item has changed.

use serde::{Deserialize, Serialize};

use crate::{CommerceError, Item, ItemId, Quantity};

/// One reserved quantity of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: ItemId,
    pub quantity: Quantity,
}

/// A user's pending reservations, in the order they were added.
///
/// Holds at most one line per item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// The lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `item_id`, if any.
    #[must_use]
    pub fn line(&self, item_id: ItemId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.item_id == item_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Distinct item ids in ascending order, the order rows are locked in.
    #[must_use]
    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.lines.iter().map(|line| line.item_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Reserve `quantity` units of `item` and append a new line.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::DuplicateLine`] if the cart already holds the item
    /// - [`CommerceError::InsufficientStock`] if the item cannot cover it
    pub fn add_line(&mut self, item: &mut Item, quantity: Quantity) -> Result<(), CommerceError> {
        if self.line(item.id).is_some() {
            return Err(CommerceError::DuplicateLine);
        }
        item.available_count.reserve(quantity)?;
        self.lines.push(CartLine {
            item_id: item.id,
            quantity,
        });
        Ok(())
    }

    /// Reserve `quantity` more units for an existing line.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotInCart`] if there is no line for the item
    /// - [`CommerceError::InsufficientStock`] if the item cannot cover it
    pub fn increase_line(&mut self, item: &mut Item, quantity: Quantity) -> Result<(), CommerceError> {
        let line = self.line_mut(item.id)?;
        let total = line
            .quantity
            .get()
            .checked_add(quantity.get())
            .and_then(|total| Quantity::new(total).ok())
            .ok_or(CommerceError::StockOverflow {
                max: Quantity::MAX,
            })?;
        item.available_count.reserve(quantity)?;
        line.quantity = total;
        Ok(())
    }

    /// Give `quantity` units of an existing line back to the item.
    ///
    /// A line never reaches zero this way: the decrease must be strictly
    /// smaller than what the line holds. Use [`Cart::remove_line`] to drop it.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotInCart`] if there is no line for the item
    /// - [`CommerceError::DecreaseWouldEmpty`] if `quantity >= held`
    pub fn decrease_line(&mut self, item: &mut Item, quantity: Quantity) -> Result<(), CommerceError> {
        let line = self.line_mut(item.id)?;
        let held = line.quantity;
        let remaining = held
            .get()
            .checked_sub(quantity.get())
            .and_then(|rest| Quantity::new(rest).ok())
            .ok_or(CommerceError::DecreaseWouldEmpty { held })?;
        item.available_count.release(quantity)?;
        line.quantity = remaining;
        Ok(())
    }

    /// Delete the line for `item_id` and return its full quantity to `item`.
    ///
    /// `item` is `None` when the catalog entry was deleted after the line was
    /// added; the line is dropped and nothing is released.
    ///
    /// # Errors
    ///
    /// - [`CommerceError::NotInCart`] if there is no line for the item
    pub fn remove_line(
        &mut self,
        item_id: ItemId,
        item: Option<&mut Item>,
    ) -> Result<CartLine, CommerceError> {
        let (index, quantity) = self
            .lines
            .iter()
            .enumerate()
            .find(|(_, line)| line.item_id == item_id)
            .map(|(index, line)| (index, line.quantity))
            .ok_or(CommerceError::NotInCart)?;
        if let Some(item) = item {
            item.available_count.release(quantity)?;
        }
        Ok(self.lines.remove(index))
    }

    /// Empty the cart without touching stock. Used once the lines have been
    /// turned into an order.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    fn line_mut(&mut self, item_id: ItemId) -> Result<&mut CartLine, CommerceError> {
        self.lines
            .iter_mut()
            .find(|line| line.item_id == item_id)
            .ok_or(CommerceError::NotInCart)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::tests::sample_item;

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn test_add_line_reserves_and_appends_once() {
        let mut item = sample_item(150);
        let mut cart = Cart::new();

        cart.add_line(&mut item, qty(10)).unwrap();
        assert_eq!(item.available_count.get(), 140);
        assert_eq!(cart.lines(), &[CartLine { item_id: item.id, quantity: qty(10) }]);

        // Any quantity, even one that fits, is a duplicate now
        assert_eq!(cart.add_line(&mut item, qty(1)), Err(CommerceError::DuplicateLine));
        assert_eq!(item.available_count.get(), 140);
        assert_eq!(cart.len(), 1);
    }

    #[test]
    fn test_add_line_insufficient_stock_changes_nothing() {
        let mut item = sample_item(150);
        let mut cart = Cart::new();
        assert!(matches!(
            cart.add_line(&mut item, qty(151)),
            Err(CommerceError::InsufficientStock { requested: 151, available: 150 })
        ));
        assert!(cart.is_empty());
        assert_eq!(item.available_count.get(), 150);
    }

    #[test]
    fn test_increase_requires_line_and_stock() {
        let mut item = sample_item(150);
        let mut cart = Cart::new();
        assert_eq!(cart.increase_line(&mut item, qty(10)), Err(CommerceError::NotInCart));

        cart.add_line(&mut item, qty(10)).unwrap();
        assert!(matches!(
            cart.increase_line(&mut item, qty(141)),
            Err(CommerceError::InsufficientStock { .. })
        ));
        assert_eq!(cart.line(item.id).unwrap().quantity, qty(10));
        assert_eq!(item.available_count.get(), 140);
    }

    #[test]
    fn test_decrease_by_full_quantity_is_rejected() {
        let mut item = sample_item(150);
        let mut cart = Cart::new();
        cart.add_line(&mut item, qty(10)).unwrap();

        assert_eq!(
            cart.decrease_line(&mut item, qty(10)),
            Err(CommerceError::DecreaseWouldEmpty { held: qty(10) })
        );
        assert_eq!(
            cart.decrease_line(&mut item, qty(11)),
            Err(CommerceError::DecreaseWouldEmpty { held: qty(10) })
        );
        assert_eq!(item.available_count.get(), 140);

        cart.decrease_line(&mut item, qty(9)).unwrap();
        assert_eq!(cart.line(item.id).unwrap().quantity, Quantity::ONE);
        assert_eq!(item.available_count.get(), 149);
    }

    #[test]
    fn test_remove_restores_stock_and_is_not_repeatable() {
        let mut item = sample_item(20);
        let mut cart = Cart::new();
        cart.add_line(&mut item, qty(7)).unwrap();

        let removed = cart.remove_line(item.id, Some(&mut item)).unwrap();
        assert_eq!(removed.quantity, qty(7));
        assert_eq!(item.available_count.get(), 20);
        assert!(cart.is_empty());

        assert_eq!(
            cart.remove_line(item.id, Some(&mut item)),
            Err(CommerceError::NotInCart)
        );
        assert_eq!(item.available_count.get(), 20);
    }

    #[test]
    fn test_remove_line_for_deleted_item() {
        let mut item = sample_item(20);
        let mut cart = Cart::new();
        cart.add_line(&mut item, qty(3)).unwrap();

        cart.remove_line(item.id, None).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_150_walkthrough() {
        let mut item = sample_item(150);
        let mut cart = Cart::new();

        cart.add_line(&mut item, qty(10)).unwrap();
        assert_eq!(item.available_count.get(), 140);
        assert_eq!(cart.lines(), &[CartLine { item_id: item.id, quantity: qty(10) }]);

        cart.increase_line(&mut item, qty(10)).unwrap();
        assert_eq!(item.available_count.get(), 130);
        assert_eq!(cart.line(item.id).unwrap().quantity, qty(20));

        cart.decrease_line(&mut item, qty(10)).unwrap();
        assert_eq!(item.available_count.get(), 140);
        assert_eq!(cart.line(item.id).unwrap().quantity, qty(10));

        cart.remove_line(item.id, Some(&mut item)).unwrap();
        assert_eq!(item.available_count.get(), 150);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_item_ids_sorted_and_distinct() {
        let mut a = sample_item(5);
        a.id = ItemId::new(9);
        let mut b = sample_item(5);
        b.id = ItemId::new(2);

        let mut cart = Cart::new();
        cart.add_line(&mut a, qty(1)).unwrap();
        cart.add_line(&mut b, qty(1)).unwrap();
        assert_eq!(cart.item_ids(), vec![ItemId::new(2), ItemId::new(9)]);
    }

    #[test]
    fn test_serializes_as_array() {
        let mut item = sample_item(5);
        let mut cart = Cart::new();
        cart.add_line(&mut item, qty(2)).unwrap();
        assert_eq!(
            serde_json::to_value(&cart).unwrap(),
            serde_json::json!([{ "itemId": 1, "quantity": 2 }])
        );
    }
}
