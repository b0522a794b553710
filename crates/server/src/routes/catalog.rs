//! Catalog browsing. Open to anonymous visitors.

use axum::{Json, extract::State};
use serde::Deserialize;

use bazaar_core::{CommerceError, Item, ItemFilter, ItemId};

use crate::error::Result;
use crate::routes::extract::{AppPath, AppQuery};
use crate::routes::parse_path_id;
use crate::services::CatalogService;
use crate::state::AppState;

/// Customer search parameters. Empty values are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    pub title: Option<String>,
    pub description: Option<String>,
    pub genre_or_category: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl From<ItemQuery> for ItemFilter {
    fn from(query: ItemQuery) -> Self {
        Self {
            title: Self::non_empty(query.title),
            description: Self::non_empty(query.description),
            category: Self::non_empty(query.genre_or_category),
            category_contains: None,
            min_price: Self::parse_price_bound(query.min_price.as_deref()),
            max_price: Self::parse_price_bound(query.max_price.as_deref()),
        }
    }
}

/// `GET /customer/items`
pub async fn index(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ItemQuery>,
) -> Result<Json<Vec<Item>>> {
    let items = CatalogService::new(state.store())
        .search(&ItemFilter::from(query))
        .await?;
    Ok(Json(items))
}

/// `GET /customer/items/{id}`
pub async fn show(
    State(state): State<AppState>,
    AppPath(id): AppPath<String>,
) -> Result<Json<Item>> {
    let id: ItemId = parse_path_id(&id).ok_or_else(CommerceError::item_not_found)?;
    let item = CatalogService::new(state.store()).get(id).await?;
    Ok(Json(item))
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    #[test]
    fn test_query_to_filter() {
        let filter = ItemFilter::from(ItemQuery {
            title: Some(String::new()),
            description: Some("spice".to_owned()),
            genre_or_category: Some("Sci-Fi".to_owned()),
            min_price: Some("5".to_owned()),
            max_price: Some("ten".to_owned()),
        });
        assert_eq!(filter.title, None);
        assert_eq!(filter.description.as_deref(), Some("spice"));
        assert_eq!(filter.category.as_deref(), Some("Sci-Fi"));
        assert_eq!(filter.min_price, Some(Decimal::new(5, 0)));
        assert_eq!(filter.max_price, None);
    }
}
