//! Per-item stock ledger.
//!
//! An item's `availableCount` is the pool that cart lines reserve from. The
//! ledger only knows how to move units in and out of that pool; pairing each
//! movement with the matching cart change is the caller's job, and both land
//! in the same unit of work.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{CommerceError, Quantity};

/// Units of an item available to sell.
///
/// ```
/// use bazaar_core::{Quantity, Stock};
///
/// let mut stock = Stock::new(150).unwrap();
/// stock.reserve(Quantity::new(10).unwrap()).unwrap();
/// assert_eq!(stock.get(), 140);
///
/// stock.release(Quantity::new(10).unwrap()).unwrap();
/// assert_eq!(stock.get(), 150);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "i64", into = "u32")]
pub struct Stock(u32);

impl Stock {
    /// Largest stock count that fits the storage column.
    pub const MAX: u32 = Quantity::MAX;

    /// Create a stock count.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::StockOverflow`] above [`Self::MAX`].
    pub fn new(count: u32) -> Result<Self, CommerceError> {
        if count > Self::MAX {
            return Err(CommerceError::StockOverflow { max: Self::MAX });
        }
        Ok(Self(count))
    }

    /// Returns the number of available units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether `quantity` units could be reserved right now.
    #[must_use]
    pub const fn covers(self, quantity: Quantity) -> bool {
        self.0 >= quantity.get()
    }

    /// Take `quantity` units out of the pool.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InsufficientStock`] when fewer than
    /// `quantity` units are available. The count is left untouched.
    pub fn reserve(&mut self, quantity: Quantity) -> Result<(), CommerceError> {
        let remaining =
            self.0
                .checked_sub(quantity.get())
                .ok_or(CommerceError::InsufficientStock {
                    requested: quantity.get(),
                    available: self.0,
                })?;
        self.0 = remaining;
        Ok(())
    }

    /// Return `quantity` units to the pool.
    ///
    /// There is no ceiling tied to an original stock level; the count only
    /// has to stay storable.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::StockOverflow`] if the result would exceed
    /// [`Self::MAX`]. The count is left untouched.
    pub fn release(&mut self, quantity: Quantity) -> Result<(), CommerceError> {
        let total = self
            .0
            .checked_add(quantity.get())
            .filter(|total| *total <= Self::MAX)
            .ok_or(CommerceError::StockOverflow { max: Self::MAX })?;
        self.0 = total;
        Ok(())
    }
}

impl TryFrom<i64> for Stock {
    type Error = CommerceError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(CommerceError::InvalidInput(format!(
                "availableCount cannot be negative, got {value}"
            )));
        }
        u32::try_from(value)
            .map_err(|_| CommerceError::StockOverflow { max: Self::MAX })
            .and_then(Self::new)
    }
}

impl From<Stock> for u32 {
    fn from(stock: Stock) -> Self {
        stock.0
    }
}

impl From<Stock> for i64 {
    fn from(stock: Stock) -> Self {
        Self::from(stock.0)
    }
}

impl fmt::Display for Stock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
