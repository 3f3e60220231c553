//! Create and delete workflows for categories.

use tracing::{error, info};
use uuid::Uuid;

use super::{require_csrf, require_login};
use crate::database::models::{Category, Item};
use crate::database::store::{self, StoreError};
use crate::error::ApiError;
use crate::media::MediaStore;
use crate::policy;
use crate::state::AppState;

/// Create a category owned by the current user.
pub async fn create(
    state: &AppState,
    sid: Uuid,
    name: &str,
    csrf_token: &str,
) -> Result<Category, ApiError> {
    let user = require_login(state, sid).await?;
    require_csrf(state, sid, csrf_token).await?;

    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::validation_failed("Category name must not be empty"));
    }

    let category = store::insert_category(&state.pool, name, user.user_id).await?;
    info!(category_id = category.id, owner = user.user_id, "Created category");
    Ok(category)
}

/// Outcome of a cascading category delete.
#[derive(Debug)]
pub struct CategoryDeleted {
    pub category_id: i64,
    pub items_removed: usize,
}

/// Delete a category and everything in it, owner-only.
///
/// The cascade is explicit: each item's media file is removed
/// best-effort, then its row, then the category row. Statements commit
/// individually, so a failure part-way leaves earlier deletions applied;
/// that partial state is reported as `DeleteFailed`.
pub async fn delete(state: &AppState, sid: Uuid, category_id: i64) -> Result<CategoryDeleted, ApiError> {
    let user = require_login(state, sid).await?;
    let category = store::get_category(&state.pool, category_id).await?;
    policy::require_owner(Some(&user), category.user_id)?;

    let removed = run_cascade(&PgCascade(&state.pool), &state.media, category_id).await?;

    info!(category_id, items_removed = removed, "Deleted category");
    Ok(CategoryDeleted { category_id, items_removed: removed })
}

/// Row operations the cascade performs, seamed out so the loop can run
/// against an in-memory store in tests.
trait CascadeStore {
    async fn items_in_category(&self, category_id: i64) -> Result<Vec<Item>, StoreError>;
    async fn delete_item_row(&self, id: i64) -> Result<(), StoreError>;
    async fn delete_category_row(&self, id: i64) -> Result<(), StoreError>;
}

struct PgCascade<'a>(&'a sqlx::PgPool);

impl CascadeStore for PgCascade<'_> {
    async fn items_in_category(&self, category_id: i64) -> Result<Vec<Item>, StoreError> {
        store::items_in_category(self.0, category_id).await
    }

    async fn delete_item_row(&self, id: i64) -> Result<(), StoreError> {
        store::delete_item_row(self.0, id).await
    }

    async fn delete_category_row(&self, id: i64) -> Result<(), StoreError> {
        store::delete_category_row(self.0, id).await
    }
}

/// The cascade itself: each item's media file, then its row, then the
/// category row. Returns the number of items removed.
async fn run_cascade(
    rows: &impl CascadeStore,
    media: &MediaStore,
    category_id: i64,
) -> Result<usize, ApiError> {
    let items = rows
        .items_in_category(category_id)
        .await
        .map_err(|e| cascade_failure("listing items", e))?;

    let mut removed = 0usize;
    for item in &items {
        if let Some(key) = &item.image_url {
            // A missing file is not fatal mid-cascade.
            media.remove_quiet(key).await;
        }
        rows.delete_item_row(item.id)
            .await
            .map_err(|e| cascade_failure("deleting item", e))?;
        removed += 1;
    }

    rows.delete_category_row(category_id)
        .await
        .map_err(|e| cascade_failure("deleting category", e))?;

    Ok(removed)
}

fn cascade_failure(step: &str, err: StoreError) -> ApiError {
    error!("Cascading delete failed while {}: {}", step, err);
    ApiError::delete_failed("Delete did not complete; some items may already be removed")
}
