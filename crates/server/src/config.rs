//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ROOT_ADMIN_EMAIL` - Email of the protected root administrator
//! - `BAZAAR_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string,
//!   only when `BAZAAR_STORAGE=postgres`
//!
//! ## Optional
//! - `BAZAAR_STORAGE` - `postgres` (default) or `memory`
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_BASE_URL` - Public URL (default: `http://localhost:3000`)
//! - `ROOT_ADMIN_PASSWORD` - Creates the root admin at startup if it is missing
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of requests traced (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use bazaar_core::Email;
use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where documents are kept.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// `PostgreSQL`, also used for sessions.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// Process memory. Everything is lost on restart.
    Memory,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL; `https` turns on secure cookies
    pub base_url: String,
    /// Identity of the administrator that cannot be demoted, edited or deleted
    pub root_admin_email: Email,
    /// Bootstrap password for the root administrator
    pub root_admin_password: Option<SecretString>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_source(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Source(get);

        let storage = match env.or_default("BAZAAR_STORAGE", "postgres").as_str() {
            "postgres" => StorageConfig::Postgres {
                database_url: env.database_url("BAZAAR_DATABASE_URL")?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "BAZAAR_STORAGE".to_string(),
                    format!("expected `postgres` or `memory`, got `{other}`"),
                ));
            }
        };
        let host = env.parsed::<IpAddr>("BAZAAR_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("BAZAAR_PORT", "3000")?;
        let base_url = env.or_default("BAZAAR_BASE_URL", "http://localhost:3000");

        let root_admin_email = Email::parse(&env.required("ROOT_ADMIN_EMAIL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("ROOT_ADMIN_EMAIL".to_string(), e.to_string())
        })?;
        let root_admin_password = env.optional("ROOT_ADMIN_PASSWORD").map(SecretString::from);

        Ok(Self {
            storage,
            host,
            port,
            base_url,
            root_admin_email,
            root_admin_password,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_traces_sample_rate: env.parsed("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration for tests: memory storage on an ephemeral port.
    #[must_use]
    pub fn for_tests(root_admin_email: Email) -> Self {
        Self {
            storage: StorageConfig::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            root_admin_email,
            root_admin_password: None,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

struct Source<F>(F);

impl<F: Fn(&str) -> Option<String>> Source<F> {
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.or_default(key, default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Database URL with fallback to generic `DATABASE_URL` (set by Fly.io postgres attach).
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_source(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_with_memory_storage() {
        let config = load(&[
            ("BAZAAR_STORAGE", "memory"),
            ("ROOT_ADMIN_EMAIL", "Admin@Example.com"),
        ])
        .unwrap();

        assert!(matches!(config.storage, StorageConfig::Memory));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.root_admin_email.as_str(), "admin@example.com");
        assert!(config.root_admin_password.is_none());
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let err = load(&[("ROOT_ADMIN_EMAIL", "admin@example.com")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "BAZAAR_DATABASE_URL"));
    }

    #[test]
    fn test_database_url_falls_back_to_generic_var() {
        let config = load(&[
            ("ROOT_ADMIN_EMAIL", "admin@example.com"),
            ("DATABASE_URL", "postgres://localhost/bazaar"),
        ])
        .unwrap();
        let StorageConfig::Postgres { database_url } = config.storage else {
            panic!("expected postgres storage");
        };
        assert_eq!(database_url.expose_secret(), "postgres://localhost/bazaar");
    }

    #[test]
    fn test_root_admin_email_required_and_validated() {
        let err = load(&[("BAZAAR_STORAGE", "memory")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "ROOT_ADMIN_EMAIL"));

        let err = load(&[("BAZAAR_STORAGE", "memory"), ("ROOT_ADMIN_EMAIL", "nope")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "ROOT_ADMIN_EMAIL"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let base = [("ROOT_ADMIN_EMAIL", "admin@example.com"), ("BAZAAR_STORAGE", "memory")];

        let err = load(&[base[0], base[1], ("BAZAAR_PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "BAZAAR_PORT"));

        let err = load(&[base[0], ("BAZAAR_STORAGE", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "BAZAAR_STORAGE"));
    }

    #[test]
    fn test_https_base_url_enables_secure_cookies() {
        let config = load(&[
            ("BAZAAR_STORAGE", "memory"),
            ("ROOT_ADMIN_EMAIL", "admin@example.com"),
            ("BAZAAR_BASE_URL", "https://shop.example.com"),
            ("ROOT_ADMIN_PASSWORD", "Sup3r$ecret"),
        ])
        .unwrap();
        assert!(config.secure_cookies());
        assert_eq!(
            config.root_admin_password.unwrap().expose_secret(),
            "Sup3r$ecret"
        );
    }
}
