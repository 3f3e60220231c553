//! Create, edit and delete workflows for items.

use tracing::{error, info};
use uuid::Uuid;

use super::{require_csrf, require_login};
use crate::database::models::Item;
use crate::database::store;
use crate::error::ApiError;
use crate::media::MediaStore;
use crate::policy;
use crate::state::AppState;

/// An uploaded file as pulled from the multipart form.
#[derive(Debug)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug)]
pub struct NewItem {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub upload: Option<Upload>,
    pub csrf_token: String,
}

#[derive(Debug, Default)]
pub struct ItemChanges {
    /// Blank fields keep the stored value.
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<i64>,
    pub upload: Option<Upload>,
    pub delete_image: bool,
    pub csrf_token: String,
}

/// Create an item owned by the current user, optionally storing an
/// uploaded image. An upload with an unacceptable extension is silently
/// ignored: the item is created with no image and no file is written.
pub async fn create(state: &AppState, sid: Uuid, input: NewItem) -> Result<Item, ApiError> {
    let user = require_login(state, sid).await?;
    require_csrf(state, sid, &input.csrf_token).await?;

    let title = input.title.trim();
    let description = input.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(ApiError::validation_failed("Title and description are required"));
    }

    // The category must exist before anything is written.
    store::get_category(&state.pool, input.category_id).await?;

    let image_key = match &input.upload {
        Some(upload) if MediaStore::accepts(&upload.filename) => {
            Some(state.media.store(&upload.filename, &upload.bytes).await?)
        }
        _ => None,
    };

    match store::insert_item(
        &state.pool,
        title,
        description,
        image_key.as_deref(),
        input.category_id,
        user.user_id,
    )
    .await
    {
        Ok(item) => {
            info!(item_id = item.id, owner = user.user_id, "Created item");
            Ok(item)
        }
        Err(e) => {
            // Roll back the in-flight file so the failed insert leaves no orphan.
            if let Some(key) = &image_key {
                state.media.remove_quiet(key).await;
            }
            Err(e.into())
        }
    }
}

/// Edit an item, owner-only. Ownership is checked before any file side
/// effect, so a non-owner's upload never touches the media store.
pub async fn edit(state: &AppState, sid: Uuid, item_id: i64, changes: ItemChanges) -> Result<Item, ApiError> {
    let user = require_login(state, sid).await?;
    require_csrf(state, sid, &changes.csrf_token).await?;

    let item = store::get_item(&state.pool, item_id).await?;
    policy::require_owner(Some(&user), item.user_id)?;

    apply_edit(state, item, changes).await
}

/// Apply validated changes to an owned item. The previous image file is
/// only removed after the UPDATE has committed; until then the row's
/// `image_url` keeps pointing at a file that exists.
async fn apply_edit(state: &AppState, mut item: Item, changes: ItemChanges) -> Result<Item, ApiError> {
    if let Some(category_id) = changes.category_id {
        if category_id != item.category_id {
            store::get_category(&state.pool, category_id).await?;
        }
    }

    // Stage the replacement image without touching the current one.
    let staged = match &changes.upload {
        Some(upload) if MediaStore::accepts(&upload.filename) => {
            Some(state.media.store(&upload.filename, &upload.bytes).await?)
        }
        _ => None,
    };

    let superseded = if let Some(new_key) = staged.clone() {
        item.image_url.replace(new_key)
    } else if changes.delete_image {
        item.image_url.take()
    } else {
        None
    };

    merge_fields(&mut item, &changes);

    match store::update_item(&state.pool, &item).await {
        Ok(updated) => {
            if let Some(old_key) = superseded {
                state.media.remove_quiet(&old_key).await;
            }
            info!(item_id = updated.id, "Updated item");
            Ok(updated)
        }
        Err(e) => {
            // The row still references its old file; discard the staged one.
            if let Some(new_key) = staged {
                state.media.remove_quiet(&new_key).await;
            }
            Err(e.into())
        }
    }
}

/// Fold submitted text and category changes into the loaded item. Blank
/// text fields keep the stored value.
fn merge_fields(item: &mut Item, changes: &ItemChanges) {
    if let Some(category_id) = changes.category_id {
        item.category_id = category_id;
    }
    if let Some(title) = non_blank(changes.title.clone()) {
        item.title = title;
    }
    if let Some(description) = non_blank(changes.description.clone()) {
        item.description = description;
    }
}

/// Delete an item, owner-only. Removing the image file is not
/// best-effort here: a filesystem failure aborts the workflow before the
/// row is touched.
pub async fn delete(state: &AppState, sid: Uuid, item_id: i64) -> Result<(), ApiError> {
    let user = require_login(state, sid).await?;
    let item = store::get_item(&state.pool, item_id).await?;
    policy::require_owner(Some(&user), item.user_id)?;

    if let Some(key) = &item.image_url {
        state.media.remove(key).await.map_err(|e| {
            error!("Failed to remove image {} for item {}: {}", key, item_id, e);
            ApiError::delete_failed("Could not remove the item's image")
        })?;
    }

    store::delete_item_row(&state.pool, item_id)
        .await
        .map_err(|e| {
            error!("Failed to delete item {}: {}", item_id, e);
            ApiError::delete_failed("Could not delete the item")
        })?;

    info!(item_id, "Deleted item");
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
