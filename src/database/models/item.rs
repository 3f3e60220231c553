use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Item {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Key into the media store; if set, the referenced file exists.
    pub image_url: Option<String>,
    pub category_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Public JSON projection for the read-only API. Owner and image fields
/// are deliberately not exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: i64,
}

impl From<&Item> for ApiItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            description: item.description.clone(),
            category_id: item.category_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn api_projection_drops_owner_and_image() {
        let item = Item {
            id: 7,
            title: "Glove".to_string(),
            description: "Leather".to_string(),
            image_url: Some("abc_glove.png".to_string()),
            category_id: 3,
            user_id: 42,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(ApiItem::from(&item)).unwrap();
        let keys: Vec<&str> = value.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys.len(), 4);
        assert!(keys.contains(&"id"));
        assert!(keys.contains(&"title"));
        assert!(keys.contains(&"description"));
        assert!(keys.contains(&"category_id"));
    }
}
