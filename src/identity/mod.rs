//! Identity verification against an external OAuth2 provider.
//!
//! Exchanges a client-supplied authorization code for tokens, introspects
//! the access token, cross-checks subject and audience, and fetches the
//! profile. No session state is touched here; the caller binds the
//! returned profile to a session.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    #[error("Access token rejected by provider: {0}")]
    TokenInvalid(String),

    #[error("Introspected user does not match identity token subject")]
    IdentityMismatch,

    #[error("Token audience does not match this application")]
    AudienceMismatch,

    #[error("Token revocation failed: {0}")]
    RevocationFailed(String),

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
}

// Transport-level failures may be transient; keep them distinct from
// validation failures.
impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::ProviderUnavailable(err.to_string())
    }
}

/// Tokens received from the provider, held in the session for later
/// revocation at logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderCredential {
    pub access_token: String,
    pub id_token: String,
}

/// Profile fields returned once verification succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedProfile {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    id_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub user_id: Option<String>,
    pub issued_to: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    name: Option<String>,
    email: Option<String>,
    picture: Option<String>,
}

pub struct IdentityVerifier {
    client: reqwest::Client,
    provider: ProviderConfig,
}

impl IdentityVerifier {
    pub fn new(provider: ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(provider.timeout_secs))
            .build()
            .unwrap_or_else(|e| panic!("failed to build HTTP client: {}", e));

        Self { client, provider }
    }

    /// Run the full verification flow for an authorization code.
    pub async fn authenticate(
        &self,
        code: &str,
    ) -> Result<(VerifiedProfile, ProviderCredential), IdentityError> {
        let credential = self.exchange_code(code).await?;
        let info = self.introspect(&credential.access_token).await?;
        let subject = id_token_subject(&credential.id_token)?;

        check_claims(&info, &subject, &self.provider.client_id)?;

        let profile = self.fetch_profile(&credential.access_token).await?;
        Ok((profile, credential))
    }

    /// Exchange the authorization code for an access + identity token pair.
    async fn exchange_code(&self, code: &str) -> Result<ProviderCredential, IdentityError> {
        let params = [
            ("code", code),
            ("client_id", self.provider.client_id.as_str()),
            ("client_secret", self.provider.client_secret.as_str()),
            ("redirect_uri", self.provider.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .client
            .post(&self.provider.token_url)
            .form(&params)
            .send()
            .await?;

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        if let Some(error) = body.error {
            let detail = body.error_description.unwrap_or(error);
            return Err(IdentityError::TokenExchange(detail));
        }

        match (body.access_token, body.id_token) {
            (Some(access_token), Some(id_token)) => Ok(ProviderCredential { access_token, id_token }),
            _ => Err(IdentityError::MalformedResponse(
                "token response missing access_token or id_token".to_string(),
            )),
        }
    }

    /// Ask the provider what it knows about this access token.
    async fn introspect(&self, access_token: &str) -> Result<TokenInfo, IdentityError> {
        let response = self
            .client
            .get(&self.provider.tokeninfo_url)
            .query(&[("access_token", access_token)])
            .send()
            .await?;

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        if let Some(error) = info.error {
            return Err(IdentityError::TokenInvalid(error));
        }
        Ok(info)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<VerifiedProfile, IdentityError> {
        let response = self
            .client
            .get(&self.provider.userinfo_url)
            .query(&[("access_token", access_token), ("alt", "json")])
            .send()
            .await?;

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedResponse(e.to_string()))?;

        let email = info
            .email
            .ok_or_else(|| IdentityError::MalformedResponse("userinfo missing email".to_string()))?;
        let name = info.name.unwrap_or_else(|| email.clone());

        Ok(VerifiedProfile { name, email, picture: info.picture })
    }

    /// Revoke an access token at logout. A provider answer that the token
    /// is already expired or invalid counts as revoked.
    pub async fn revoke(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .get(&self.provider.revoke_url)
            .query(&[("token", access_token)])
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let lowered = body.to_ascii_lowercase();
        if lowered.contains("invalid_token") || lowered.contains("expired") {
            return Ok(());
        }
        Err(IdentityError::RevocationFailed(body))
    }
}

/// Extract the subject claim from the provider's identity token. The
/// signature is not verified: the token arrived over TLS directly from
/// the provider's token endpoint, not from the client.
fn id_token_subject(id_token: &str) -> Result<String, IdentityError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    // The signature is ignored, so the algorithm list is only a header gate.
    validation.algorithms = vec![Algorithm::RS256, Algorithm::ES256, Algorithm::HS256];
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = decode::<IdTokenClaims>(id_token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| IdentityError::MalformedResponse(format!("bad id_token: {}", e)))?;

    Ok(data.claims.sub)
}

/// Cross-check the introspection payload against the identity token
/// subject and our registered client id.
fn check_claims(info: &TokenInfo, subject: &str, client_id: &str) -> Result<(), IdentityError> {
    match info.user_id.as_deref() {
        Some(user_id) if user_id == subject => {}
        _ => return Err(IdentityError::IdentityMismatch),
    }
    match info.issued_to.as_deref() {
        Some(issued_to) if issued_to == client_id => {}
        _ => return Err(IdentityError::AudienceMismatch),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        sub: String,
        exp: i64,
    }

    fn make_id_token(sub: &str) -> String {
        let claims = TestClaims { sub: sub.to_string(), exp: 4_102_444_800 };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"test"))
            .expect("encode test token")
    }

    #[test]
    fn subject_extracted_without_signature_check() {
        let token = make_id_token("google-uid-123");
        assert_eq!(id_token_subject(&token).unwrap(), "google-uid-123");
    }

    #[test]
    fn garbage_id_token_is_malformed() {
        assert!(matches!(
            id_token_subject("not-a-jwt"),
            Err(IdentityError::MalformedResponse(_))
        ));
    }

    #[test]
    fn matching_claims_pass() {
        let info = TokenInfo {
            user_id: Some("uid-1".to_string()),
            issued_to: Some("client-abc".to_string()),
            error: None,
        };
        assert!(check_claims(&info, "uid-1", "client-abc").is_ok());
    }

    #[test]
    fn subject_mismatch_is_identity_mismatch() {
        let info = TokenInfo {
            user_id: Some("uid-2".to_string()),
            issued_to: Some("client-abc".to_string()),
            error: None,
        };
        assert!(matches!(
            check_claims(&info, "uid-1", "client-abc"),
            Err(IdentityError::IdentityMismatch)
        ));
    }

    #[test]
    fn audience_mismatch_detected_after_subject_check() {
        let info = TokenInfo {
            user_id: Some("uid-1".to_string()),
            issued_to: Some("someone-else".to_string()),
            error: None,
        };
        assert!(matches!(
            check_claims(&info, "uid-1", "client-abc"),
            Err(IdentityError::AudienceMismatch)
        ));
    }

    #[test]
    fn missing_introspection_fields_fail_closed() {
        let info = TokenInfo { user_id: None, issued_to: None, error: None };
        assert!(check_claims(&info, "uid-1", "client-abc").is_err());
    }
}
