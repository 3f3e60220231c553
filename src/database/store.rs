//! Typed SQL access for the catalog tables. Every function takes the pool
//! explicitly; there is no process-global database session.

use sqlx::PgPool;
use thiserror::Error;

use super::models::{Category, Item, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // Surface constraint violations distinctly; everything else is opaque.
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                if code == "23505" {
                    return StoreError::Conflict("Record violates a uniqueness constraint".to_string());
                }
                if code == "23503" {
                    return StoreError::Conflict("Record references a missing row".to_string());
                }
            }
        }
        StoreError::Sqlx(err)
    }
}

fn missing_row_as_not_found(err: sqlx::Error, what: impl FnOnce() -> String) -> StoreError {
    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound(what()),
        other => other.into(),
    }
}

// ── Users ────────────────────────────────────────────────────────────

/// Look up a user by email, creating the row on first login. Cached
/// profile fields are not refreshed for an existing user.
pub async fn find_or_create_user(
    pool: &PgPool,
    name: &str,
    email: &str,
    picture: Option<&str>,
) -> Result<User, StoreError> {
    let existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    if let Some(user) = existing {
        return Ok(user);
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (name, email, picture) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(name)
    .bind(email)
    .bind(picture)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

// ── Categories ───────────────────────────────────────────────────────

pub async fn list_categories(pool: &PgPool) -> Result<Vec<Category>, StoreError> {
    let rows = sqlx::query_as::<_, Category>("SELECT * FROM category ORDER BY name")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_category(pool: &PgPool, id: i64) -> Result<Category, StoreError> {
    sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Category {} not found", id)))
}

pub async fn insert_category(pool: &PgPool, name: &str, user_id: i64) -> Result<Category, StoreError> {
    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO category (name, user_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(name)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(category)
}

pub async fn delete_category_row(pool: &PgPool, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM category WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("Category {} not found", id)));
    }
    Ok(())
}

// ── Items ────────────────────────────────────────────────────────────

pub async fn latest_items(pool: &PgPool, limit: i64) -> Result<Vec<Item>, StoreError> {
    let rows = sqlx::query_as::<_, Item>("SELECT * FROM item ORDER BY created_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_items(pool: &PgPool) -> Result<Vec<Item>, StoreError> {
    let rows = sqlx::query_as::<_, Item>("SELECT * FROM item ORDER BY category_id, title")
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn items_in_category(pool: &PgPool, category_id: i64) -> Result<Vec<Item>, StoreError> {
    let rows = sqlx::query_as::<_, Item>("SELECT * FROM item WHERE category_id = $1 ORDER BY title")
        .bind(category_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn get_item(pool: &PgPool, id: i64) -> Result<Item, StoreError> {
    sqlx::query_as::<_, Item>("SELECT * FROM item WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("Item {} not found", id)))
}

pub async fn insert_item(
    pool: &PgPool,
    title: &str,
    description: &str,
    image_url: Option<&str>,
    category_id: i64,
    user_id: i64,
) -> Result<Item, StoreError> {
    let item = sqlx::query_as::<_, Item>(
        "INSERT INTO item (title, description, image_url, category_id, user_id) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(title)
    .bind(description)
    .bind(image_url)
    .bind(category_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

pub async fn update_item(pool: &PgPool, item: &Item) -> Result<Item, StoreError> {
    sqlx::query_as::<_, Item>(
        "UPDATE item SET title = $1, description = $2, image_url = $3, category_id = $4 \
         WHERE id = $5 RETURNING *",
    )
    .bind(&item.title)
    .bind(&item.description)
    .bind(&item.image_url)
    .bind(item.category_id)
    .bind(item.id)
    .fetch_one(pool)
    .await
    // The row can vanish between load and update under a concurrent
    // delete; that is a 404, not a server fault.
    .map_err(|e| missing_row_as_not_found(e, || format!("Item {} not found", item.id)))
}

pub async fn delete_item_row(pool: &PgPool, id: i64) -> Result<(), StoreError> {
    let result = sqlx::query("DELETE FROM item WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound(format!("Item {} not found", id)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_maps_to_not_found() {
        let err = missing_row_as_not_found(sqlx::Error::RowNotFound, || "Item 9 not found".to_string());
        assert!(matches!(err, StoreError::NotFound(ref msg) if msg == "Item 9 not found"));
    }

    #[test]
    fn other_errors_pass_through_mapping() {
        let err = missing_row_as_not_found(sqlx::Error::PoolClosed, || unreachable!());
        assert!(matches!(err, StoreError::Sqlx(_)));
    }
}
