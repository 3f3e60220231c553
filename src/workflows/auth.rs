//! Login (identity verification + session binding) and logout workflows.

use tracing::info;
use uuid::Uuid;

use super::require_csrf;
use crate::database::store;
use crate::error::ApiError;
use crate::session::Identity;
use crate::state::AppState;

/// Complete a provider login: check the anti-forgery state token, run the
/// identity verifier on the authorization code, then find-or-create the
/// user row and bind the identity to the session.
pub async fn login(
    state: &AppState,
    sid: Uuid,
    state_token: &str,
    code: &str,
) -> Result<Identity, ApiError> {
    require_csrf(state, sid, state_token).await?;

    let (profile, credential) = state.verifier.authenticate(code).await?;

    let user = store::find_or_create_user(
        &state.pool,
        &profile.name,
        &profile.email,
        profile.picture.as_deref(),
    )
    .await?;

    let identity = Identity {
        user_id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        picture: user.picture.clone(),
    };

    state.sessions.bind_identity(sid, identity.clone(), credential).await;
    info!(user_id = user.id, "Login completed");
    Ok(identity)
}

/// Revoke the stored provider credential and clear the session. A failed
/// revocation leaves the session untouched so the user can retry.
pub async fn logout(state: &AppState, sid: Uuid) -> Result<(), ApiError> {
    let user = state
        .sessions
        .current_user(sid)
        .await
        .ok_or_else(|| ApiError::unauthenticated("Not logged in"))?;

    if let Some(credential) = state.sessions.credential(sid).await {
        state.verifier.revoke(&credential.access_token).await?;
    }

    state.sessions.clear(sid).await;
    info!(user_id = user.user_id, "Logged out");
    Ok(())
}
