//! Positive quantity type used by cart lines and stock movements.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be at least 1, got {0}")]
    NotPositive(i64),
    /// Larger than stock can ever hold.
    #[error("quantity must be at most {max}, got {value}")]
    TooLarge {
        /// The rejected value.
        value: i64,
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A strictly positive number of units.
///
/// Bounded above by `i32::MAX` so every quantity fits the `INTEGER` column
/// that stores stock counts.
///
/// ```
/// use bazaar_core::Quantity;
///
/// assert_eq!(Quantity::try_from(10_i64).unwrap().get(), 10);
/// assert!(Quantity::try_from(0_i64).is_err());
/// assert!(Quantity::try_from(-3_i64).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest representable quantity.
    #[allow(clippy::cast_sign_loss)]
    pub const MAX: u32 = i32::MAX as u32;

    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity, rejecting zero and values above [`Self::MAX`].
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] when the value is out of range.
    pub fn new(value: u32) -> Result<Self, QuantityError> {
        Self::try_from(i64::from(value))
    }

    /// Returns the number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 1 {
            return Err(QuantityError::NotPositive(value));
        }
        u32::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(QuantityError::TooLarge {
                value,
                max: Self::MAX,
            })
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
