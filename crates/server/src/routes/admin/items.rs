//! Catalog management.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::{Value, json};

use bazaar_core::{CommerceError, Item, ItemFilter, ItemId, ItemPatch, NewItem};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::routes::extract::{AppJson, AppPath, AppQuery};
use crate::routes::parse_path_id;
use crate::services::CatalogService;
use crate::state::AppState;

/// Admin search parameters: substring matches, empty values ignored.
#[derive(Debug, Default, Deserialize)]
pub struct AdminItemQuery {
    pub name: Option<String>,
    pub description: Option<String>,
    pub genre: Option<String>,
}

impl From<AdminItemQuery> for ItemFilter {
    fn from(query: AdminItemQuery) -> Self {
        Self {
            title: Self::non_empty(query.name),
            description: Self::non_empty(query.description),
            category_contains: Self::non_empty(query.genre),
            ..Self::default()
        }
    }
}

fn item_id(raw: &str) -> Result<ItemId> {
    Ok(parse_path_id(raw).ok_or_else(CommerceError::item_not_found)?)
}

/// `POST /admin/items`
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    AppJson(item): AppJson<NewItem>,
) -> Result<impl IntoResponse> {
    let item = CatalogService::new(state.store()).create(item).await?;
    tracing::info!(item_id = %item.id, admin_id = %admin.actor.id, "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// `GET /admin/items`
pub async fn index(State(state): State<AppState>, _admin: RequireAdmin) -> Result<Json<Vec<Item>>> {
    let items = CatalogService::new(state.store())
        .search(&ItemFilter::default())
        .await?;
    Ok(Json(items))
}

/// `GET /admin/items/search`
pub async fn search(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppQuery(query): AppQuery<AdminItemQuery>,
) -> Result<Json<Vec<Item>>> {
    let items = CatalogService::new(state.store())
        .search(&ItemFilter::from(query))
        .await?;
    Ok(Json(items))
}

/// `GET /admin/items/{id}`
pub async fn show(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppPath(id): AppPath<String>,
) -> Result<Json<Item>> {
    let item = CatalogService::new(state.store()).get(item_id(&id)?).await?;
    Ok(Json(item))
}

/// `PUT /admin/items/{id}`
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    AppPath(id): AppPath<String>,
    AppJson(patch): AppJson<ItemPatch>,
) -> Result<Json<Item>> {
    let item = CatalogService::new(state.store())
        .update(item_id(&id)?, patch)
        .await?;
    Ok(Json(item))
}

/// `DELETE /admin/items/{id}`
pub async fn delete(
    State(state): State<AppState>,
    admin: RequireAdmin,
    AppPath(id): AppPath<String>,
) -> Result<Json<Value>> {
    let id = item_id(&id)?;
    CatalogService::new(state.store()).delete(id).await?;
    tracing::info!(item_id = %id, admin_id = %admin.actor.id, "item deleted");
    Ok(Json(json!({ "message": "Item deleted successfully" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_query_matches_substrings() {
        let filter = ItemFilter::from(AdminItemQuery {
            name: Some("dune".to_owned()),
            description: Some(String::new()),
            genre: Some("fi".to_owned()),
        });
        assert_eq!(filter.title.as_deref(), Some("dune"));
        assert_eq!(filter.description, None);
        assert_eq!(filter.category, None);
        assert_eq!(filter.category_contains.as_deref(), Some("fi"));
    }
}
