//! Application configuration
//!
//! Centralized configuration management with environment variable support
//! and sensible defaults.

use std::env;
use std::fmt;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Poll store configuration
    pub store: StoreConfig,
    /// Admin credential configuration
    pub auth: AuthConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind the server to
    pub port: u16,
    /// Host address to bind to
    pub host: String,
    /// Directory holding the static pages
    pub static_dir: String,
}

/// Poll store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Primary database URL
    pub database_url: String,
    /// Database URL tried when the primary one cannot be reached
    pub fallback_database_url: Option<String>,
    /// Maximum number of pooled connections
    pub max_connections: u32,
}

/// Admin credential configuration
#[derive(Clone, Default)]
pub struct AuthConfig {
    /// Pre-shared key required to create polls. `None` disables creation.
    pub admin_key: Option<String>,
}

// Never print the key itself
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field(
                "admin_key",
                &self.admin_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5000),
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
            store: StoreConfig {
                database_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/polls.db".to_string()),
                fallback_database_url: match env::var("FALLBACK_DATABASE_URL") {
                    Ok(url) if url.trim().is_empty() => None,
                    Ok(url) => Some(url),
                    Err(_) => Some("sqlite:polls-local.db".to_string()),
                },
                max_connections: env::var("DB_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|n| n.parse().ok())
                    .filter(|n| *n > 0)
                    .unwrap_or(5),
            },
            auth: AuthConfig {
                admin_key: env::var("ADMIN_KEY")
                    .ok()
                    .filter(|key| !key.is_empty()),
            },
        }
    }

    /// Get the server address as a string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
