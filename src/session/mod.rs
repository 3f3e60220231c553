//! Server-side sessions and the per-session CSRF guard.
//!
//! Each browser session is keyed by a random UUID carried in a cookie.
//! The session itself is typed: a current CSRF token, and once logged in,
//! the bound identity and provider credential. There is no free-form
//! key/value bag.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config;
use crate::identity::ProviderCredential;

/// Identity bound to a session after a successful external login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Session {
    csrf_token: Option<String>,
    identity: Option<Identity>,
    credential: Option<ProviderCredential>,
    last_seen: Instant,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            csrf_token: None,
            identity: None,
            credential: None,
            last_seen: Instant::now(),
        }
    }
}

impl Session {
    fn expired(&self, ttl: Duration) -> bool {
        self.last_seen.elapsed() > ttl
    }
}

/// In-process session store behind a read/write lock. Entries idle for
/// longer than the configured TTL are swept on the next token issuance,
/// so anonymous sessions minted by cookieless GETs cannot pile up.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(config::config().security.session_ttl_secs))
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Generate a fresh CSRF token for this session, replacing any
    /// previous one (last-issued-wins). Expired sessions are swept here,
    /// under the write lock already held for the insert.
    pub async fn issue_csrf(&self, sid: Uuid) -> String {
        let token = random_token(config::config().security.csrf_token_len);
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.expired(self.ttl));
        let session = sessions.entry(sid).or_default();
        session.csrf_token = Some(token.clone());
        session.last_seen = Instant::now();
        token
    }

    /// Check a submitted token against the session's current one. On
    /// success the stored token is consumed, so no token ever verifies
    /// twice.
    pub async fn verify_csrf(&self, sid: Uuid, submitted: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        if matches!(sessions.get(&sid), Some(s) if s.expired(self.ttl)) {
            sessions.remove(&sid);
            return false;
        }
        let Some(session) = sessions.get_mut(&sid) else {
            return false;
        };
        session.last_seen = Instant::now();
        match session.csrf_token.as_deref() {
            Some(current) if !submitted.is_empty() && current == submitted => {
                session.csrf_token = None;
                true
            }
            _ => false,
        }
    }

    /// Attach a verified identity and its provider credential.
    pub async fn bind_identity(&self, sid: Uuid, identity: Identity, credential: ProviderCredential) {
        let mut sessions = self.sessions.write().await;
        let session = sessions.entry(sid).or_default();
        session.identity = Some(identity);
        session.credential = Some(credential);
        session.last_seen = Instant::now();
    }

    pub async fn current_user(&self, sid: Uuid) -> Option<Identity> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&sid)
            .filter(|s| !s.expired(self.ttl))
            .and_then(|s| s.identity.clone())
    }

    pub async fn credential(&self, sid: Uuid) -> Option<ProviderCredential> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&sid)
            .filter(|s| !s.expired(self.ttl))
            .and_then(|s| s.credential.clone())
    }

    /// Drop all identity, credential and token state (logout).
    pub async fn clear(&self, sid: Uuid) {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&sid);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Session id from the request cookie, minting a fresh one when the
/// cookie is absent or malformed.
#[derive(Debug, Clone, Copy)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// `Set-Cookie` value that pins this session id to the browser.
    pub fn cookie(&self) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            config::config().security.session_cookie,
            self.0
        )
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let cookie_name = &config::config().security.session_cookie;

        let sid = parts
            .headers
            .get(axum::http::header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|cookies| {
                cookies.split(';').find_map(|pair| {
                    let (name, value) = pair.trim().split_once('=')?;
                    if name == cookie_name {
                        Uuid::parse_str(value.trim()).ok()
                    } else {
                        None
                    }
                })
            })
            .unwrap_or_else(Uuid::new_v4);

        Ok(SessionId(sid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            user_id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            picture: None,
        }
    }

    fn credential() -> ProviderCredential {
        ProviderCredential {
            access_token: "at".to_string(),
            id_token: "it".to_string(),
        }
    }

    #[tokio::test]
    async fn issued_token_verifies_once() {
        let store = SessionStore::new();
        let sid = Uuid::new_v4();

        let token = store.issue_csrf(sid).await;
        assert_eq!(token.len(), 32);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        assert!(store.verify_csrf(sid, &token).await);
        // Rotation: the same token never verifies twice
        assert!(!store.verify_csrf(sid, &token).await);
    }

    #[tokio::test]
    async fn stale_token_fails_after_reissue() {
        let store = SessionStore::new();
        let sid = Uuid::new_v4();

        let old = store.issue_csrf(sid).await;
        let fresh = store.issue_csrf(sid).await;
        assert_ne!(old, fresh);

        assert!(!store.verify_csrf(sid, &old).await);
        assert!(store.verify_csrf(sid, &fresh).await);
    }

    #[tokio::test]
    async fn foreign_and_empty_tokens_fail() {
        let store = SessionStore::new();
        let sid = Uuid::new_v4();
        let other = Uuid::new_v4();

        let token = store.issue_csrf(sid).await;
        assert!(!store.verify_csrf(other, &token).await);
        assert!(!store.verify_csrf(sid, "").await);
        assert!(!store.verify_csrf(sid, "someoneelsestoken").await);
    }

    #[tokio::test]
    async fn idle_sessions_are_swept_on_issue() {
        let store = SessionStore::with_ttl(Duration::from_millis(20));

        let stale = Uuid::new_v4();
        store.issue_csrf(stale).await;
        assert_eq!(store.len().await, 1);

        tokio::time::sleep(Duration::from_millis(50)).await;

        // A new session's issuance sweeps the idle one out of the map.
        let fresh = Uuid::new_v4();
        let token = store.issue_csrf(fresh).await;
        assert_eq!(store.len().await, 1);
        assert!(store.verify_csrf(fresh, &token).await);
    }

    #[tokio::test]
    async fn expired_session_no_longer_authenticates() {
        let store = SessionStore::with_ttl(Duration::from_millis(20));
        let sid = Uuid::new_v4();

        let token = store.issue_csrf(sid).await;
        store.bind_identity(sid, identity(), credential()).await;

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.current_user(sid).await.is_none());
        assert!(store.credential(sid).await.is_none());
        assert!(!store.verify_csrf(sid, &token).await);
    }

    #[tokio::test]
    async fn active_session_survives_the_sweep() {
        let store = SessionStore::with_ttl(Duration::from_secs(60));
        let sid = Uuid::new_v4();

        store.issue_csrf(sid).await;
        store.bind_identity(sid, identity(), credential()).await;

        // Another session's issuance must not sweep a live one.
        store.issue_csrf(Uuid::new_v4()).await;
        assert_eq!(store.len().await, 2);
        assert!(store.current_user(sid).await.is_some());
    }

    #[tokio::test]
    async fn bind_and_clear_identity() {
        let store = SessionStore::new();
        let sid = Uuid::new_v4();

        assert!(store.current_user(sid).await.is_none());

        store.bind_identity(sid, identity(), credential()).await;
        let bound = store.current_user(sid).await.unwrap();
        assert_eq!(bound.user_id, 1);
        assert_eq!(bound.email, "ada@example.com");
        assert!(store.credential(sid).await.is_some());

        store.clear(sid).await;
        assert!(store.current_user(sid).await.is_none());
        assert!(store.credential(sid).await.is_none());
    }
}
