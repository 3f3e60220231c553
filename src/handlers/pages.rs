//! Read-only view endpoints: catalog browsing and stored media.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::json;

use crate::database::store;
use crate::error::ApiError;
use crate::media::MediaError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const LATEST_ITEMS_LIMIT: i64 = 20;

/// GET / - all categories plus the latest items
pub async fn index(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let categories = store::list_categories(&state.pool).await?;
    let latest = store::latest_items(&state.pool, LATEST_ITEMS_LIMIT).await?;

    Ok(ApiResponse::success(json!({
        "categories": categories,
        "latest_items": latest,
    })))
}

/// GET /category/:id/items/ - one category and its items
pub async fn category_items(
    State(state): State<AppState>,
    Path(category_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let category = store::get_category(&state.pool, category_id).await?;
    let items = store::items_in_category(&state.pool, category_id).await?;

    Ok(ApiResponse::success(json!({
        "category": category,
        "items": items,
    })))
}

/// GET /item/:id/ - item detail
pub async fn item_show(
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> ApiResult<crate::database::models::Item> {
    let item = store::get_item(&state.pool, item_id).await?;
    Ok(ApiResponse::success(item))
}

/// GET /media/:key - serve a stored image back to the browser
pub async fn media_get(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = state.media.read(&key).await.map_err(|e| match e {
        MediaError::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
            ApiError::not_found(format!("No media stored under {}", key))
        }
        other => other.into(),
    })?;

    let content_type = match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        _ => "application/octet-stream",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
