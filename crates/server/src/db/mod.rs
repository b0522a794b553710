//! Document storage.
//!
//! # Documents
//!
//! - `items` - Catalog items with their `available_count` stock ledger
//! - `users` - Accounts; the cart and the order history are embedded (`JSONB`)
//! - `tower_sessions.session` - Session storage (created by the session store migration)
//!
//! # Backends
//!
//! - [`PgStore`] - `PostgreSQL`. A unit of work is a transaction and documents
//!   loaded "for update" are row-locked.
//! - [`MemoryStore`] - In-process documents behind a tokio mutex. Used by tests
//!   and `BAZAAR_STORAGE=memory`.
//!
//! # Lock order
//!
//! A unit of work that touches a user and items locks the user first, then the
//! items in ascending id order. Every service follows this order so concurrent
//! cart operations cannot deadlock.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! ```

pub mod items;
pub mod memory;
pub mod postgres;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bazaar_core::{Email, Item, ItemFilter, ItemId, NewItem, NewUser, User, UserId};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Schema migrations for the document tables.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Access to item and user documents.
///
/// Plain reads and single-document writes go through the store directly.
/// Anything that must change several documents together, or read-modify-write
/// one, goes through [`Store::begin`].
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;

    /// Insert a validated item and return it with its new id.
    async fn insert_item(&self, item: NewItem) -> Result<Item, RepositoryError>;

    async fn get_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    /// Items matching `filter`, oldest first.
    async fn search_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, RepositoryError>;

    /// Delete an item. Returns `false` if it did not exist.
    async fn delete_item(&self, id: ItemId) -> Result<bool, RepositoryError>;

    /// Insert a user with an empty cart and no orders.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Every user, oldest first.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
}

/// A set of reads and writes that commit or roll back together.
///
/// Documents loaded through a unit of work stay locked until it ends. Writes
/// are invisible to other callers until [`UnitOfWork::commit`]; dropping the
/// unit of work without committing discards them.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn item_for_update(&mut self, id: ItemId) -> Result<Option<Item>, RepositoryError>;

    async fn user_for_update(&mut self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn user_by_email_for_update(
        &mut self,
        email: &Email,
    ) -> Result<Option<User>, RepositoryError>;

    /// Write back an item loaded in this unit of work.
    async fn save_item(&mut self, item: &Item) -> Result<(), RepositoryError>;

    /// Write back a user loaded in this unit of work.
    ///
    /// Returns `RepositoryError::Conflict` if the email is taken by another user.
    async fn save_user(&mut self, user: &User) -> Result<(), RepositoryError>;

    /// Delete a user. Returns `false` if it did not exist.
    async fn delete_user(&mut self, id: UserId) -> Result<bool, RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `Conflict`, everything else into `Database`.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
