//! Item form and mutation endpoints. Create and edit take multipart
//! forms so an image can ride along with the text fields.

use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde_json::json;

use crate::database::models::Item;
use crate::database::store;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::SessionId;
use crate::state::AppState;
use crate::workflows;
use crate::workflows::item::{ItemChanges, NewItem, Upload};

/// GET /item/new/ - fresh CSRF token plus the selectable categories
pub async fn new_get(
    State(state): State<AppState>,
    sid: SessionId,
) -> Result<impl IntoResponse, ApiError> {
    let token = state.sessions.issue_csrf(sid.0).await;
    let categories = store::list_categories(&state.pool).await?;
    Ok((
        [(header::SET_COOKIE, sid.cookie())],
        ApiResponse::success(json!({ "csrf_token": token, "categories": categories })),
    ))
}

/// POST /item/new/ - run the create-item workflow
pub async fn new_post(
    State(state): State<AppState>,
    sid: SessionId,
    multipart: Multipart,
) -> ApiResult<Item> {
    let form = read_form(multipart).await?;

    let input = NewItem {
        title: form.title.unwrap_or_default(),
        description: form.description.unwrap_or_default(),
        category_id: form
            .category_id
            .ok_or_else(|| ApiError::validation_failed("A category is required"))?,
        upload: form.upload,
        csrf_token: form.csrf_token.unwrap_or_default(),
    };

    let item = workflows::item::create(&state, sid.0, input).await?;
    Ok(ApiResponse::created(item))
}

/// GET /item/:id/edit/ - fresh CSRF token plus the item's current state
pub async fn edit_get(
    State(state): State<AppState>,
    sid: SessionId,
    Path(item_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let item = store::get_item(&state.pool, item_id).await?;
    let categories = store::list_categories(&state.pool).await?;
    let token = state.sessions.issue_csrf(sid.0).await;
    Ok((
        [(header::SET_COOKIE, sid.cookie())],
        ApiResponse::success(json!({
            "csrf_token": token,
            "item": item,
            "categories": categories,
        })),
    ))
}

/// POST /item/:id/edit/ - run the edit-item workflow
pub async fn edit_post(
    State(state): State<AppState>,
    sid: SessionId,
    Path(item_id): Path<i64>,
    multipart: Multipart,
) -> ApiResult<Item> {
    let form = read_form(multipart).await?;

    let changes = ItemChanges {
        title: form.title,
        description: form.description,
        category_id: form.category_id,
        upload: form.upload,
        delete_image: form.delete_image,
        csrf_token: form.csrf_token.unwrap_or_default(),
    };

    let item = workflows::item::edit(&state, sid.0, item_id, changes).await?;
    Ok(ApiResponse::success(item))
}

/// POST /item/:id/delete - run the delete-item workflow
pub async fn delete_post(
    State(state): State<AppState>,
    sid: SessionId,
    Path(item_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    workflows::item::delete(&state, sid.0, item_id).await?;
    Ok(ApiResponse::success(json!({ "deleted": item_id })))
}

#[derive(Debug, Default)]
struct ItemForm {
    title: Option<String>,
    description: Option<String>,
    category_id: Option<i64>,
    upload: Option<Upload>,
    delete_image: bool,
    csrf_token: Option<String>,
}

/// Pull the known fields out of the multipart form. Unknown fields are
/// ignored; a file part without a filename counts as no upload.
async fn read_form(mut multipart: Multipart) -> Result<ItemForm, ApiError> {
    let mut form = ItemForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation_failed(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = Some(text(field).await?),
            "description" => form.description = Some(text(field).await?),
            "category_id" => {
                let raw = text(field).await?;
                let parsed = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| ApiError::validation_failed(format!("Invalid category id: {}", raw)))?;
                form.category_id = Some(parsed);
            }
            "csrf_token" => form.csrf_token = Some(text(field).await?),
            "delete_image" => {
                let raw = text(field).await?;
                form.delete_image = matches!(raw.trim(), "true" | "on" | "1");
            }
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation_failed(e.to_string()))?;
                if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                    if !bytes.is_empty() {
                        form.upload = Some(Upload { filename, bytes: bytes.to_vec() });
                    }
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation_failed(e.to_string()))
}
