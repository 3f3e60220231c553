//! Mutation workflows composing the session guard, ownership policy,
//! relational store and media store into single user-visible operations.
//!
//! Ordering is uniform: authentication, then CSRF, then authorization,
//! then file side effects, then the row mutation. Cascades commit one
//! statement at a time; a mid-cascade failure leaves earlier steps
//! applied and is reported, not hidden.

pub mod auth;
pub mod category;
pub mod item;

use uuid::Uuid;

use crate::error::ApiError;
use crate::session::Identity;
use crate::state::AppState;

/// Resolve the session's bound identity or refuse the request.
pub async fn require_login(state: &AppState, sid: Uuid) -> Result<Identity, ApiError> {
    state
        .sessions
        .current_user(sid)
        .await
        .ok_or_else(|| ApiError::unauthenticated("Login required"))
}

/// Check and consume the session's CSRF token.
pub async fn require_csrf(state: &AppState, sid: Uuid, submitted: &str) -> Result<(), ApiError> {
    if state.sessions.verify_csrf(sid, submitted).await {
        Ok(())
    } else {
        Err(ApiError::CsrfMismatch)
    }
}
