//! Catalog service: admin item management and customer search.

use tracing::instrument;

use bazaar_core::{CommerceError, Item, ItemFilter, ItemId, ItemPatch, NewItem};

use super::ShopError;
use crate::db::Store;

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add an item to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` if a text field is blank.
    #[instrument(skip(self, item), fields(title = %item.title))]
    pub async fn create(&self, item: NewItem) -> Result<Item, ShopError> {
        item.validate()?;
        let item = self.store.insert_item(item).await?;
        tracing::info!(item_id = %item.id, "item created");
        Ok(item)
    }

    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if there is no such item.
    pub async fn get(&self, id: ItemId) -> Result<Item, ShopError> {
        Ok(self
            .store
            .get_item(id)
            .await?
            .ok_or_else(CommerceError::item_not_found)?)
    }

    /// Items matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::Repository` if the store fails.
    pub async fn search(&self, filter: &ItemFilter) -> Result<Vec<Item>, ShopError> {
        Ok(self.store.search_items(filter).await?)
    }

    /// Apply a partial update.
    ///
    /// Stock can be set directly here; carts holding the item keep their
    /// reservations.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if there is no such item, or
    /// `CommerceError::InvalidInput` if the patch blanks a text field.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: ItemId, patch: ItemPatch) -> Result<Item, ShopError> {
        let mut uow = self.store.begin().await?;
        let mut item = uow
            .item_for_update(id)
            .await?
            .ok_or_else(CommerceError::item_not_found)?;
        patch.apply(&mut item)?;
        uow.save_item(&item).await?;
        uow.commit().await?;
        Ok(item)
    }

    /// Remove an item. Orders keep their snapshot of it; cart lines that
    /// still point at it can only be removed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if there is no such item.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ItemId) -> Result<(), ShopError> {
        if !self.store.delete_item(id).await? {
            return Err(CommerceError::item_not_found().into());
        }
        tracing::info!("item deleted");
        Ok(())
    }
}
