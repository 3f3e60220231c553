//! Read-only JSON API for external consumers. Items are projected to
//! `{id, title, description, category_id}`; owner and image fields are
//! never exposed here.

use axum::extract::{Path, State};
use serde_json::json;

use crate::database::models::{ApiItem, Category, Item};
use crate::database::store;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/:category_id/items/ - items of one category
pub async fn category_items(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<Vec<ApiItem>> {
    store::get_category(&state.pool, category_id).await?;
    let items = store::items_in_category(&state.pool, category_id).await?;
    Ok(ApiResponse::success(items.iter().map(ApiItem::from).collect()))
}

/// GET /api/:item_id/item/ - a single item
pub async fn item(State(state): State<AppState>, Path(item_id): Path<i64>) -> ApiResult<ApiItem> {
    let item = store::get_item(&state.pool, item_id).await?;
    Ok(ApiResponse::success(ApiItem::from(&item)))
}

/// GET /api/all/ - every category with its items nested
pub async fn all(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let categories = store::list_categories(&state.pool).await?;
    let items = store::list_items(&state.pool).await?;
    Ok(ApiResponse::success(catalog_tree(&categories, &items)))
}

/// Group the full item list under its categories. Every category gets
/// exactly one entry, item-less ones included.
fn catalog_tree(categories: &[Category], items: &[Item]) -> serde_json::Value {
    let out: Vec<serde_json::Value> = categories
        .iter()
        .map(|category| {
            let nested: Vec<ApiItem> = items
                .iter()
                .filter(|i| i.category_id == category.id)
                .map(ApiItem::from)
                .collect();
            json!({
                "id": category.id,
                "name": category.name,
                "items": nested,
            })
        })
        .collect();

    json!({ "categories": out })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn category(id: i64, name: &str) -> Category {
        Category {
            id,
            name: name.to_string(),
            user_id: 1,
            created_at: Utc::now(),
        }
    }

    fn item(id: i64, category_id: i64, title: &str) -> Item {
        Item {
            id,
            title: title.to_string(),
            description: "desc".to_string(),
            image_url: Some("key_unused.png".to_string()),
            category_id,
            user_id: 1,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn tree_has_one_entry_per_category_with_its_items() {
        let categories = vec![category(1, "Bats"), category(2, "Gloves"), category(3, "Empty")];
        let items = vec![item(10, 1, "Ash bat"), item(11, 2, "Catcher mitt"), item(12, 1, "Maple bat")];

        let tree = catalog_tree(&categories, &items);
        let entries = tree["categories"].as_array().unwrap();
        assert_eq!(entries.len(), 3);

        let bats = &entries[0];
        assert_eq!(bats["id"], 1);
        assert_eq!(bats["name"], "Bats");
        let bat_items = bats["items"].as_array().unwrap();
        assert_eq!(bat_items.len(), 2);
        for it in bat_items {
            assert_eq!(it["category_id"], 1);
        }

        // A category with no items still appears, with an empty list.
        assert_eq!(entries[2]["items"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn tree_items_expose_only_the_public_fields() {
        let categories = vec![category(1, "Bats")];
        let items = vec![item(10, 1, "Ash bat")];

        let tree = catalog_tree(&categories, &items);
        let entry = &tree["categories"][0]["items"][0];
        let keys: Vec<&str> = entry.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"id"));
        assert!(keys.contains(&"title"));
        assert!(keys.contains(&"description"));
        assert!(keys.contains(&"category_id"));
        assert!(!keys.contains(&"user_id"));
        assert!(!keys.contains(&"image_url"));
    }
}
