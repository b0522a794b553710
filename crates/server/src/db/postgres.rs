//! `PostgreSQL` backend.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use bazaar_core::{Email, Item, ItemFilter, ItemId, NewItem, NewUser, User, UserId};

use super::{RepositoryError, Store, UnitOfWork, items, users};

/// Store backed by a connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for the session store and migrations.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn insert_item(&self, item: NewItem) -> Result<Item, RepositoryError> {
        items::insert(&self.pool, &item).await
    }

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        items::get(&self.pool, id, false).await
    }

    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError> {
        items::search(&self.pool, filter).await
    }

    async fn delete_item(&self, id: ItemId) -> Result<bool, RepositoryError> {
        items::delete(&self.pool, id).await
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        users::insert(&self.pool, &user).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        users::get(&self.pool, id, false).await
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        users::get_by_email(&self.pool, email, false).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        users::list(&self.pool).await
    }
}

/// A transaction. Rows read "for update" stay locked until commit or rollback;
/// dropping it rolls back.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        items::get(&mut *self.tx, id, true).await
    }

    async fn user_for_update(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        users::get(&mut *self.tx, id, true).await
    }

    async fn user_by_email_for_update(
        &mut self,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError> {
        users::get_by_email(&mut *self.tx, email, true).await
    }

    async fn save_item(&mut self, item: &Item) -> Result<(), RepositoryError> {
        items::update(&mut *self.tx, item).await
    }

    async fn save_user(&mut self, user: &User) -> Result<(), RepositoryError> {
        users::update(&mut *self.tx, user).await
    }

    async fn delete_user(&mut self, id: UserId) -> Result<bool, RepositoryError> {
        users::delete(&mut *self.tx, id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
