//! Server configuration.
//!
//! Loaded from environment variables, with an optional `.env` file in
//! the working directory.

use portcullis_auth::AuthConfig;
use portcullis_auth::config::reset_lifetime_from_secs;
use portcullis_db::DbConfig;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// SurrealDB connection settings.
    pub db: DbConfig,
    /// Server-side secret prepended to passwords before hashing.
    pub pepper: Option<String>,
    /// Password reset lifetime in seconds.
    pub reset_token_lifetime_secs: u64,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let host = std::env::var("PORTCULLIS_HOST").unwrap_or(defaults.host);
        let port = match std::env::var("PORTCULLIS_PORT") {
            Ok(v) => v
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORTCULLIS_PORT '{v}': {e}"))?,
            Err(_) => defaults.port,
        };

        let db = DbConfig {
            url: std::env::var("PORTCULLIS_DB_URL").unwrap_or(defaults.db.url),
            namespace: std::env::var("PORTCULLIS_DB_NAMESPACE").unwrap_or(defaults.db.namespace),
            database: std::env::var("PORTCULLIS_DB_DATABASE").unwrap_or(defaults.db.database),
            username: std::env::var("PORTCULLIS_DB_USER").unwrap_or(defaults.db.username),
            password: std::env::var("PORTCULLIS_DB_PASSWORD").unwrap_or(defaults.db.password),
        };

        let pepper = std::env::var("PORTCULLIS_PEPPER")
            .ok()
            .filter(|p| !p.is_empty());

        let reset_token_lifetime_secs = match std::env::var("PORTCULLIS_RESET_TOKEN_LIFETIME_SECS") {
            Ok(v) => parse_reset_lifetime(&v)?,
            Err(_) => defaults.reset_token_lifetime_secs,
        };

        Ok(Self {
            host,
            port,
            db,
            pepper,
            reset_token_lifetime_secs,
        })
    }

    /// Creates a configuration for testing.
    pub fn for_testing() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            pepper: Some("test-pepper".to_string()),
            ..Self::default()
        }
    }

    /// Settings for the authentication service.
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            pepper: self.pepper.clone(),
            reset_token_lifetime_secs: self.reset_token_lifetime_secs,
        }
    }
}

/// Parses a reset lifetime, rejecting values the auth service could not
/// turn into a future expiry.
fn parse_reset_lifetime(raw: &str) -> anyhow::Result<u64> {
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid PORTCULLIS_RESET_TOKEN_LIFETIME_SECS '{raw}': {e}"))?;

    let expiry = reset_lifetime_from_secs(secs)
        .and_then(|lifetime| chrono::Utc::now().checked_add_signed(lifetime));
    if expiry.is_none() {
        anyhow::bail!(
            "PORTCULLIS_RESET_TOKEN_LIFETIME_SECS must be a positive number of seconds \
             with a representable expiry, got {secs}"
        );
    }
    Ok(secs)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            db: DbConfig::default(),
            pepper: None,
            reset_token_lifetime_secs: AuthConfig::default().reset_token_lifetime_secs,
        }
    }
}
