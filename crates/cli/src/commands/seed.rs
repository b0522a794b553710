//! Seed the catalog from a YAML file.
//!
//! The file is a list of items in the same shape the admin API accepts:
//!
//! ```yaml
//! - title: Dune
//!   image: https://example.com/dune.jpg
//!   price: 12.5
//!   description: Desert planet epic
//!   availableCount: 150
//!   category: Sci-Fi
//! ```

use std::path::Path;

use tracing::info;

use bazaar_core::NewItem;
use bazaar_server::db::PgStore;
use bazaar_server::services::CatalogService;

use super::connect;

/// Insert every item in `file_path`.
///
/// The whole file is parsed and validated before anything is written.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, an item fails
/// validation, or the database rejects an insert.
pub async fn items(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog items from file");
    let content = tokio::fs::read_to_string(path).await?;
    let items: Vec<NewItem> = serde_yaml::from_str(&content)?;
    for (index, item) in items.iter().enumerate() {
        item.validate()
            .map_err(|e| format!("item {} ({}): {e}", index + 1, item.title))?;
    }
    info!(items = items.len(), "Parsed and validated catalog");

    let store = PgStore::new(connect().await?);
    let catalog = CatalogService::new(&store);
    for item in items {
        let created = catalog.create(item).await?;
        info!(item_id = %created.id, title = %created.title, "Item created");
    }

    info!("Seeding complete");
    Ok(())
}
