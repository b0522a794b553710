//! Item queries.
//!
//! Queries are built at runtime (`query_as` / `QueryBuilder`) and are generic
//! over the executor so the same statement runs on the pool or inside a unit
//! of work's transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgExecutor, Postgres, QueryBuilder};

use bazaar_core::{Item, ItemFilter, ItemId, NewItem, Price, Stock};

use super::RepositoryError;

#[derive(Debug, FromRow)]
struct ItemRow {
    id: i32,
    title: String,
    image: String,
    price: Decimal,
    description: String,
    available_count: i32,
    category: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = RepositoryError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for item {}: {e}", row.id))
        })?;
        let available_count = Stock::try_from(i64::from(row.available_count)).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid stock for item {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ItemId::new(row.id),
            title: row.title,
            image: row.image,
            price,
            description: row.description,
            available_count,
            category: row.category,
            created_at: row.created_at,
        })
    }
}

fn stock_column(stock: Stock) -> Result<i32, RepositoryError> {
    i32::try_from(stock.get())
        .map_err(|_| RepositoryError::DataCorruption(format!("stock {stock} exceeds column range")))
}

/// Insert an item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn insert<'e>(exec: impl PgExecutor<'e>, item: &NewItem) -> Result<Item, RepositoryError> {
    let row = sqlx::query_as::<_, ItemRow>(
        r"
        INSERT INTO items (title, image, price, description, available_count, category)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, image, price, description, available_count, category, created_at
        ",
    )
    .bind(item.title.trim())
    .bind(item.image.trim())
    .bind(item.price.normalize())
    .bind(item.description.trim())
    .bind(stock_column(item.available_count)?)
    .bind(item.category.trim())
    .fetch_one(exec)
    .await?;

    row.try_into()
}

/// Get an item by id, optionally locking its row until the transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
pub async fn get<'e>(
    exec: impl PgExecutor<'e>,
    id: ItemId,
    for_update: bool,
) -> Result<Option<Item>, RepositoryError> {
    let sql = if for_update {
        r"
        SELECT id, title, image, price, description, available_count, category, created_at
        FROM items
        WHERE id = $1
        FOR UPDATE
        "
    } else {
        r"
        SELECT id, title, image, price, description, available_count, category, created_at
        FROM items
        WHERE id = $1
        "
    };

    sqlx::query_as::<_, ItemRow>(sql)
        .bind(id)
        .fetch_optional(exec)
        .await?
        .map(Item::try_from)
        .transpose()
}

/// Search items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn search<'e>(
    exec: impl PgExecutor<'e>,
    filter: &ItemFilter,
) -> Result<Vec<Item>, RepositoryError> {
    let mut query = QueryBuilder::<Postgres>::new(
        "SELECT id, title, image, price, description, available_count, category, created_at \
         FROM items WHERE TRUE",
    );

    for (column, needle) in [
        ("title", &filter.title),
        ("description", &filter.description),
        ("category", &filter.category_contains),
    ] {
        if let Some(needle) = needle {
            query
                .push(format!(" AND strpos(lower({column}), lower("))
                .push_bind(needle.clone())
                .push(")) > 0");
        }
    }
    if let Some(category) = &filter.category {
        query.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(min) = filter.min_price {
        query.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query.push(" AND price <= ").push_bind(max);
    }
    query.push(" ORDER BY created_at, id");

    query
        .build_query_as::<ItemRow>()
        .fetch_all(exec)
        .await?
        .into_iter()
        .map(Item::try_from)
        .collect()
}

/// Overwrite every mutable column of an item.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the item no longer exists.
/// Returns `RepositoryError::Database` if the query fails.
pub async fn update<'e>(exec: impl PgExecutor<'e>, item: &Item) -> Result<(), RepositoryError> {
    let result = sqlx::query(
        r"
        UPDATE items
        SET title = $2, image = $3, price = $4, description = $5,
            available_count = $6, category = $7
        WHERE id = $1
        ",
    )
    .bind(item.id)
    .bind(&item.title)
    .bind(&item.image)
    .bind(item.price.amount())
    .bind(&item.description)
    .bind(stock_column(item.available_count)?)
    .bind(&item.category)
    .execute(exec)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Delete an item.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete<'e>(exec: impl PgExecutor<'e>, id: ItemId) -> Result<bool, RepositoryError> {
    let result = sqlx::query("DELETE FROM items WHERE id = $1")
        .bind(id)
        .execute(exec)
        .await?;

    Ok(result.rows_affected() > 0)
}
