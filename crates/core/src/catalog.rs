//! Catalog items, admin patches and customer search filters.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{CommerceError, ItemId, Price, Stock};

/// A sellable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub title: String,
    /// Image URL.
    pub image: String,
    pub price: Price,
    pub description: String,
    /// Units left to reserve. Already reduced by every open cart line.
    pub available_count: Stock,
    #[serde(alias = "genreOrCategory")]
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Build an item from validated input.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidInput`] if a text field is blank or
    /// the price is out of range.
    pub fn create(id: ItemId, new: NewItem, created_at: DateTime<Utc>) -> Result<Self, CommerceError> {
        let price = new.validate()?;
        Ok(Self {
            id,
            title: new.title.trim().to_owned(),
            image: new.image.trim().to_owned(),
            price,
            description: new.description.trim().to_owned(),
            available_count: new.available_count,
            category: new.category.trim().to_owned(),
            created_at,
        })
    }
}

/// Admin input for creating an item.
///
/// The price is kept as sent and checked by [`NewItem::validate`], so an out
/// of range amount is reported like any other invalid field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub title: String,
    pub image: String,
    pub price: Decimal,
    pub description: String,
    pub available_count: Stock,
    #[serde(alias = "genreOrCategory")]
    pub category: String,
}

impl NewItem {
    /// Check the required text fields and the price, returning the price.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidInput`] naming the first invalid field.
    pub fn validate(&self) -> Result<Price, CommerceError> {
        require("title", &self.title)?;
        require("image", &self.image)?;
        require("description", &self.description)?;
        require("genreOrCategory", &self.category)?;
        item_price(self.price)
    }
}

/// Partial update of an item. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub title: Option<String>,
    pub image: Option<String>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub available_count: Option<Stock>,
    #[serde(alias = "genreOrCategory")]
    pub category: Option<String>,
}

impl ItemPatch {
    /// Apply the patch.
    ///
    /// # Errors
    ///
    /// Returns [`CommerceError::InvalidInput`] if a provided text field is
    /// blank or the price is out of range. The item is unchanged on error.
    pub fn apply(self, item: &mut Item) -> Result<(), CommerceError> {
        for (field, value) in [
            ("title", &self.title),
            ("image", &self.image),
            ("description", &self.description),
            ("genreOrCategory", &self.category),
        ] {
            if let Some(value) = value {
                require(field, value)?;
            }
        }
        let price = self.price.map(item_price).transpose()?;

        if let Some(title) = self.title {
            item.title = title.trim().to_owned();
        }
        if let Some(image) = self.image {
            item.image = image.trim().to_owned();
        }
        if let Some(price) = price {
            item.price = price;
        }
        if let Some(description) = self.description {
            item.description = description.trim().to_owned();
        }
        if let Some(count) = self.available_count {
            item.available_count = count;
        }
        if let Some(category) = self.category {
            item.category = category.trim().to_owned();
        }
        Ok(())
    }
}

fn item_price(amount: Decimal) -> Result<Price, CommerceError> {
    Price::new(amount)
        .map_err(|e| CommerceError::InvalidInput(format!("item validation failed: {e}")))
}

fn require(field: &str, value: &str) -> Result<(), CommerceError> {
    if value.trim().is_empty() {
        return Err(CommerceError::InvalidInput(format!(
            "item validation failed: {field} is required"
        )));
    }
    Ok(())
}

/// Catalog search criteria. Every field is optional and they combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Case-insensitive substring of the description.
    pub description: Option<String>,
    /// Exact category.
    pub category: Option<String>,
    /// Case-insensitive substring of the category.
    pub category_contains: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
}

impl ItemFilter {
    /// Parse a price bound from a query string value.
    ///
    /// Only plain unsigned decimals (`12`, `12.50`) count; anything else is
    /// ignored rather than rejected, so a bad bound widens the search.
    #[must_use]
    pub fn parse_price_bound(raw: Option<&str>) -> Option<Decimal> {
        let raw = raw?;
        let (whole, fraction) = match raw.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (raw, None),
        };
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        if !digits(whole) || fraction.is_some_and(|f| !digits(f)) {
            return None;
        }
        raw.parse().ok()
    }

    /// Treat empty strings as absent.
    #[must_use]
    pub fn non_empty(value: Option<String>) -> Option<String> {
        value.filter(|v| !v.is_empty())
    }

    /// Whether `item` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        let contains = |haystack: &str, needle: &Option<String>| {
            needle
                .as_deref()
                .is_none_or(|n| haystack.to_lowercase().contains(&n.to_lowercase()))
        };
        let price = item.price.amount();

        contains(&item.title, &self.title)
            && contains(&item.description, &self.description)
            && self.category.as_deref().is_none_or(|c| item.category == c)
            && contains(&item.category, &self.category_contains)
            && self.min_price.is_none_or(|min| price >= min)
            && self.max_price.is_none_or(|max| price <= max)
    }
}
