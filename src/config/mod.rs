use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
    pub provider: ProviderConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: String,
    pub max_upload_bytes: usize,
}

/// OAuth2 provider endpoints. Defaults point at Google; every URL is
/// overridable so tests can aim the verifier at a local mock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub token_url: String,
    pub tokeninfo_url: String,
    pub userinfo_url: String,
    pub revoke_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub session_cookie: String,
    pub csrf_token_len: usize,
    pub session_ttl_secs: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Media overrides
        if let Ok(v) = env::var("CATALOG_MEDIA_DIR") {
            self.media.root = v;
        }
        if let Ok(v) = env::var("CATALOG_MAX_UPLOAD_BYTES") {
            self.media.max_upload_bytes = v.parse().unwrap_or(self.media.max_upload_bytes);
        }

        // Provider overrides
        if let Ok(v) = env::var("OAUTH_CLIENT_ID") {
            self.provider.client_id = v;
        }
        if let Ok(v) = env::var("OAUTH_CLIENT_SECRET") {
            self.provider.client_secret = v;
        }
        if let Ok(v) = env::var("OAUTH_REDIRECT_URI") {
            self.provider.redirect_uri = v;
        }
        if let Ok(v) = env::var("OAUTH_TOKEN_URL") {
            self.provider.token_url = v;
        }
        if let Ok(v) = env::var("OAUTH_TOKENINFO_URL") {
            self.provider.tokeninfo_url = v;
        }
        if let Ok(v) = env::var("OAUTH_USERINFO_URL") {
            self.provider.userinfo_url = v;
        }
        if let Ok(v) = env::var("OAUTH_REVOKE_URL") {
            self.provider.revoke_url = v;
        }
        if let Ok(v) = env::var("OAUTH_TIMEOUT_SECS") {
            self.provider.timeout_secs = v.parse().unwrap_or(self.provider.timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_SESSION_COOKIE") {
            self.security.session_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_SESSION_TTL_SECS") {
            self.security.session_ttl_secs = v.parse().unwrap_or(self.security.session_ttl_secs);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        self
    }

    fn base_provider() -> ProviderConfig {
        ProviderConfig {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: "postmessage".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            tokeninfo_url: "https://www.googleapis.com/oauth2/v1/tokeninfo".to_string(),
            userinfo_url: "https://www.googleapis.com/oauth2/v1/userinfo".to_string(),
            revoke_url: "https://accounts.google.com/o/oauth2/revoke".to_string(),
            timeout_secs: 10,
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                url: "postgres://localhost/catalog".to_string(),
                max_connections: 10,
                connection_timeout: 30,
            },
            media: MediaConfig {
                root: "media".to_string(),
                max_upload_bytes: 10 * 1024 * 1024, // 10MB
            },
            provider: Self::base_provider(),
            security: SecurityConfig {
                session_cookie: "catalog_session".to_string(),
                csrf_token_len: 32,
                session_ttl_secs: 24 * 60 * 60,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                url: "postgres://localhost/catalog".to_string(),
                max_connections: 20,
                connection_timeout: 10,
            },
            media: MediaConfig {
                root: "/var/lib/catalog/media".to_string(),
                max_upload_bytes: 5 * 1024 * 1024, // 5MB
            },
            provider: Self::base_provider(),
            security: SecurityConfig {
                session_cookie: "catalog_session".to_string(),
                csrf_token_len: 32,
                session_ttl_secs: 24 * 60 * 60,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                url: "postgres://localhost/catalog".to_string(),
                max_connections: 50,
                connection_timeout: 5,
            },
            media: MediaConfig {
                root: "/var/lib/catalog/media".to_string(),
                max_upload_bytes: 2 * 1024 * 1024, // 2MB
            },
            provider: Self::base_provider(),
            security: SecurityConfig {
                session_cookie: "catalog_session".to_string(),
                csrf_token_len: 32,
                session_ttl_secs: 24 * 60 * 60,
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.media.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.security.csrf_token_len, 32);
        assert!(config.provider.token_url.contains("googleapis"));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.media.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(config.database.max_connections, 50);
    }
}
