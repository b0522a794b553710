//! Business rule violations raised by the cart, stock and checkout rules.

use crate::Quantity;

/// Kind of document a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Entity {
    /// A catalog item.
    Item,
    /// A user account.
    User,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Item => write!(f, "Item"),
            Self::User => write!(f, "User"),
        }
    }
}

/// Errors produced by the domain rules.
///
/// Every variant is detected before anything is mutated, so a caller that
/// receives one can discard its unit of work without compensating writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommerceError {
    /// A referenced document does not exist.
    #[error("{0} not found")]
    NotFound(Entity),

    /// Quantity missing, zero, negative or not a number.
    #[error("Please provide a valid quantity above Zero")]
    InvalidQuantity,

    /// The item cannot cover the requested reservation.
    #[error("Insufficient quantity")]
    InsufficientStock {
        /// Units requested.
        requested: u32,
        /// Units currently available.
        available: u32,
    },

    /// The cart already holds a line for this item.
    #[error("Item already in cart")]
    DuplicateLine,

    /// The cart has no line for this item.
    #[error("Item not in cart")]
    NotInCart,

    /// A decrease would take the line to zero or below.
    #[error(
        "Wrong amount: only {held} available in cart and must have a default value of 1 in cart"
    )]
    DecreaseWouldEmpty {
        /// Units currently held by the line.
        held: Quantity,
    },

    /// Checkout was attempted with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// A field failed validation.
    #[error("{0}")]
    InvalidInput(String),

    /// A line or order total does not fit in a decimal.
    #[error("order total is out of range")]
    AmountOverflow,

    /// Releasing stock would exceed the storable range.
    #[error("stock count would exceed {max}")]
    StockOverflow {
        /// Largest storable stock count.
        max: u32,
    },
}

impl CommerceError {
    /// Shorthand for an item lookup failure.
    #[must_use]
    pub const fn item_not_found() -> Self {
        Self::NotFound(Entity::Item)
    }

    /// Shorthand for a user lookup failure.
    #[must_use]
    pub const fn user_not_found() -> Self {
        Self::NotFound(Entity::User)
    }
}
