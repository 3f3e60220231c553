//! Category form and mutation endpoints.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::database::models::Category;
use crate::middleware::{ApiResponse, ApiResult};
use crate::session::SessionId;
use crate::state::AppState;
use crate::workflows;

/// GET /category/new/ - fresh CSRF token for the create form
pub async fn new_get(State(state): State<AppState>, sid: SessionId) -> impl IntoResponse {
    let token = state.sessions.issue_csrf(sid.0).await;
    (
        [(header::SET_COOKIE, sid.cookie())],
        ApiResponse::success(json!({ "csrf_token": token })),
    )
}

#[derive(Debug, Deserialize)]
pub struct NewCategoryForm {
    pub name: String,
    pub csrf_token: String,
}

/// POST /category/new/ - run the create-category workflow
pub async fn new_post(
    State(state): State<AppState>,
    sid: SessionId,
    Json(form): Json<NewCategoryForm>,
) -> ApiResult<Category> {
    let category = workflows::category::create(&state, sid.0, &form.name, &form.csrf_token).await?;
    Ok(ApiResponse::created(category))
}

/// POST /category/:id/delete - run the cascading delete workflow
pub async fn delete_post(
    State(state): State<AppState>,
    sid: SessionId,
    Path(category_id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    let outcome = workflows::category::delete(&state, sid.0, category_id).await?;
    Ok(ApiResponse::success(json!({
        "deleted": outcome.category_id,
        "items_removed": outcome.items_removed,
    })))
}
