//! Login entry point, OAuth callback and logout.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::ApiResponse;
use crate::session::SessionId;
use crate::state::AppState;
use crate::workflows;

/// GET /login/ - anti-forgery state token for the provider handshake
pub async fn login_get(State(state): State<AppState>, sid: SessionId) -> impl IntoResponse {
    let token = state.sessions.issue_csrf(sid.0).await;
    (
        [(header::SET_COOKIE, sid.cookie())],
        ApiResponse::success(json!({ "csrf_token": token })),
    )
}

#[derive(Debug, Deserialize)]
pub struct GconnectQuery {
    /// The CSRF token rides the `state` query parameter, as the provider
    /// handshake defines it.
    pub state: Option<String>,
}

/// POST /gconnect - exchange the authorization code (request body) and
/// bind the verified identity to the session.
pub async fn gconnect(
    State(state): State<AppState>,
    sid: SessionId,
    Query(query): Query<GconnectQuery>,
    code: String,
) -> Result<impl IntoResponse, ApiError> {
    let state_token = query.state.unwrap_or_default();
    let identity = workflows::auth::login(&state, sid.0, &state_token, code.trim()).await?;

    Ok((
        [(header::SET_COOKIE, sid.cookie())],
        ApiResponse::success(json!({
            "name": identity.name,
            "email": identity.email,
            "picture": identity.picture,
        })),
    ))
}

/// GET /logout/ - revoke the provider credential and clear the session
pub async fn logout(State(state): State<AppState>, sid: SessionId) -> Result<impl IntoResponse, ApiError> {
    workflows::auth::logout(&state, sid.0).await?;
    Ok(ApiResponse::success(json!({ "logged_out": true })))
}
