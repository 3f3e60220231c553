// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    ValidationFailed(String),

    // 401 Unauthorized
    Unauthenticated(String),
    TokenExchange(String),
    TokenInvalid(String),
    IdentityMismatch,
    AudienceMismatch,

    // 403 Forbidden
    CsrfMismatch,
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    StorageConflict(String),

    // 500 Internal Server Error
    DeleteFailed(String),
    Internal(String),

    // 502 Bad Gateway (provider rejected the revocation)
    RevocationFailed(String),

    // 503 Service Unavailable (provider unreachable / timed out)
    ProviderUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationFailed(_) => 400,
            ApiError::Unauthenticated(_) => 401,
            ApiError::TokenExchange(_) => 401,
            ApiError::TokenInvalid(_) => 401,
            ApiError::IdentityMismatch => 401,
            ApiError::AudienceMismatch => 401,
            ApiError::CsrfMismatch => 403,
            ApiError::Unauthorized(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::StorageConflict(_) => 409,
            ApiError::DeleteFailed(_) => 500,
            ApiError::Internal(_) => 500,
            ApiError::RevocationFailed(_) => 502,
            ApiError::ProviderUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::ValidationFailed(msg) => msg,
            ApiError::Unauthenticated(msg) => msg,
            ApiError::TokenExchange(msg) => msg,
            ApiError::TokenInvalid(msg) => msg,
            ApiError::IdentityMismatch => "Token user does not match the identity token subject",
            ApiError::AudienceMismatch => "Token was not issued to this application",
            ApiError::CsrfMismatch => "Invalid state parameter",
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::StorageConflict(msg) => msg,
            ApiError::DeleteFailed(msg) => msg,
            ApiError::Internal(msg) => msg,
            ApiError::RevocationFailed(msg) => msg,
            ApiError::ProviderUnavailable(msg) => msg,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::ValidationFailed(_) => "VALIDATION_FAILED",
            ApiError::Unauthenticated(_) => "UNAUTHENTICATED",
            ApiError::TokenExchange(_) => "TOKEN_EXCHANGE_ERROR",
            ApiError::TokenInvalid(_) => "TOKEN_INVALID",
            ApiError::IdentityMismatch => "IDENTITY_MISMATCH",
            ApiError::AudienceMismatch => "AUDIENCE_MISMATCH",
            ApiError::CsrfMismatch => "CSRF_MISMATCH",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::StorageConflict(_) => "STORAGE_CONFLICT",
            ApiError::DeleteFailed(_) => "DELETE_FAILED",
            ApiError::Internal(_) => "INTERNAL_SERVER_ERROR",
            ApiError::RevocationFailed(_) => "REVOCATION_FAILED",
            ApiError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code()
        })
    }
}

// Static constructor methods for the string-carrying variants
impl ApiError {
    pub fn validation_failed(message: impl Into<String>) -> Self {
        ApiError::ValidationFailed(message.into())
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        ApiError::Unauthenticated(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn delete_failed(message: impl Into<String>) -> Self {
        ApiError::DeleteFailed(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<crate::database::store::StoreError> for ApiError {
    fn from(err: crate::database::store::StoreError) -> Self {
        match err {
            crate::database::store::StoreError::NotFound(msg) => ApiError::not_found(msg),
            crate::database::store::StoreError::Conflict(msg) => ApiError::StorageConflict(msg),
            crate::database::store::StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal("An error occurred while processing your request")
            }
        }
    }
}

impl From<crate::identity::IdentityError> for ApiError {
    fn from(err: crate::identity::IdentityError) -> Self {
        match err {
            crate::identity::IdentityError::TokenExchange(msg) => ApiError::TokenExchange(msg),
            crate::identity::IdentityError::TokenInvalid(msg) => ApiError::TokenInvalid(msg),
            crate::identity::IdentityError::IdentityMismatch => ApiError::IdentityMismatch,
            crate::identity::IdentityError::AudienceMismatch => ApiError::AudienceMismatch,
            crate::identity::IdentityError::RevocationFailed(msg) => ApiError::RevocationFailed(msg),
            crate::identity::IdentityError::ProviderUnavailable(msg) => {
                tracing::error!("Identity provider unreachable: {}", msg);
                ApiError::ProviderUnavailable("Identity provider temporarily unavailable".to_string())
            }
            crate::identity::IdentityError::MalformedResponse(msg) => {
                tracing::error!("Malformed provider response: {}", msg);
                ApiError::internal("Unexpected response from identity provider")
            }
        }
    }
}

impl From<crate::media::MediaError> for ApiError {
    fn from(err: crate::media::MediaError) -> Self {
        match err {
            crate::media::MediaError::InvalidKey(key) => {
                ApiError::validation_failed(format!("Invalid media key: {}", key))
            }
            crate::media::MediaError::Io(io_err) => {
                tracing::error!("Media store I/O error: {}", io_err);
                ApiError::internal("Failed to access stored media")
            }
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation_failed("x").status_code(), 400);
        assert_eq!(ApiError::unauthenticated("x").status_code(), 401);
        assert_eq!(ApiError::CsrfMismatch.status_code(), 403);
        assert_eq!(ApiError::unauthorized("x").status_code(), 403);
        assert_eq!(ApiError::not_found("x").status_code(), 404);
        assert_eq!(ApiError::StorageConflict("x".into()).status_code(), 409);
        assert_eq!(ApiError::ProviderUnavailable("x".into()).status_code(), 503);
        assert_eq!(ApiError::RevocationFailed("x".into()).status_code(), 502);
    }

    #[test]
    fn json_body_carries_code_and_message() {
        let body = ApiError::not_found("No such item").to_json();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["error"], "No such item");
    }
}
