use sqlx::PgPool;
use std::sync::Arc;

use crate::config;
use crate::identity::IdentityVerifier;
use crate::media::MediaStore;
use crate::session::SessionStore;

/// Shared application state, cloned into every handler via `State`.
/// Collaborators are injected here instead of living in process-wide
/// singletons, so tests can build a state around their own pool and a
/// temporary media directory.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sessions: Arc<SessionStore>,
    pub media: Arc<MediaStore>,
    pub verifier: Arc<IdentityVerifier>,
}

impl AppState {
    pub fn from_config(pool: PgPool) -> Self {
        let cfg = config::config();
        Self {
            pool,
            sessions: Arc::new(SessionStore::new()),
            media: Arc::new(MediaStore::new(cfg.media.root.clone())),
            verifier: Arc::new(IdentityVerifier::new(cfg.provider.clone())),
        }
    }
}
