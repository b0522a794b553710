//! User queries.
//!
//! The cart and the order history live in `JSONB` columns on the user row, so
//! a user is always read and written as one document.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor};

use bazaar_core::{Cart, Email, NewUser, Order, User, UserId};

use super::{RepositoryError, conflict_or_database};

const COLUMNS: &str =
    "id, name, email, password_hash, date_of_birth, is_admin, created_at, cart, orders";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    password_hash: String,
    date_of_birth: Option<NaiveDate>,
    is_admin: bool,
    created_at: DateTime<Utc>,
    cart: Json<Cart>,
    orders: Json<Vec<Order>>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            password_hash: row.password_hash,
            date_of_birth: row.date_of_birth,
            is_admin: row.is_admin,
            created_at: row.created_at,
            cart: row.cart.0,
            orders: row.orders.0,
        })
    }
}

/// Insert a user with an empty cart and no orders.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if the email already exists.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, user: &NewUser) -> Result<User, RepositoryError> {
    let sql = format!(
        "INSERT INTO users (name, email, password_hash, date_of_birth, is_admin) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {COLUMNS}"
    );

    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.date_of_birth)
        .bind(user.is_admin)
        .fetch_one(exec)
        .await
        .map_err(|e| conflict_or_database(e, "email"))?;

    row.try_into()
}

/// Get a user by id, optionally locking the row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get<'e>(
    exec: impl PgExecutor<'e>,
    id: UserId,
    for_update: bool,
) -> Result<Option<User>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {COLUMNS} FROM users WHERE id = $1{lock}");

    sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Get a user by email, optionally locking the row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get_by_email<'e>(
    exec: impl PgExecutor<'e>,
    email: &Email,
    for_update: bool,
) -> Result<Option<User>, RepositoryError> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let sql = format!("SELECT {COLUMNS} FROM users WHERE email = $1{lock}");

    sqlx::query_as::<_, UserRow>(&sql)
        .bind(email)
        .fetch_optional(exec)
        .await?
        .map(User::try_from)
        .transpose()
}

/// Every user, oldest first.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn list<'e>(exec: impl PgExecutor<'e>) -> Result<Vec<User>, RepositoryError> {
    let sql = format!("SELECT {COLUMNS} FROM users ORDER BY created_at, id");

    sqlx::query_as::<_, UserRow>(&sql)
        .fetch_all(exec)
        .await?
        .into_iter()
        .map(User::try_from)
        .collect()
}

/// Overwrite a user document.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the user no longer exists.
/// Returns `RepositoryError::Conflict` if the new email belongs to someone else.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn update<'e>(exec: impl PgExecutor<'e>, user: &User) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE users
        SET name = $2, email = $3, password_hash = $4, date_of_birth = $5,
            is_admin = $6, cart = $7, orders = $8
        WHERE id = $1
        ",
    )
    .bind(user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.date_of_birth)
    .bind(user.is_admin)
    .bind(Json(&user.cart))
    .bind(Json(&user.orders))
    .execute(exec)
    .await
    .map_err(|e| conflict_or_database(e, "email"))?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Delete a user.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: UserId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(exec)
        .await?;

    Ok(result.rows_affected() > 0)
}
