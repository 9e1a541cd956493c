//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PIDEAI_STORE_ID` - Tenant whose carts this process serves
//! - `PIDEAI_CATALOG_PATH` - Path to the JSON catalog
//! - `PIDEAI_DATABASE_URL` - `PostgreSQL` connection string, only when
//!   `PIDEAI_STORAGE=postgres` (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `PIDEAI_HOST` - Bind address (default: 127.0.0.1)
//! - `PIDEAI_PORT` - Listen port (default: 3000)
//! - `PIDEAI_STORAGE` - `memory`, `file` or `postgres` (default: file)
//! - `PIDEAI_CART_DIR` - Directory for the file backend (default: data/carts)
//! - `PIDEAI_CART_IDLE_SECS` - Seconds before an idle cart is evicted (default: 1800)
//! - `PIDEAI_DEFAULT_SELECTION` - `first-available`, `flagged` or `none`
//!   (default: first-available)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use pideai_core::{DefaultSelectionPolicy, StoreId};
use secrecy::SecretString;
use thiserror::Error;

/// Primary variable for the `PostgreSQL` connection string.
pub const DATABASE_URL_VAR: &str = "PIDEAI_DATABASE_URL";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Where carts are persisted.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub enum StorageConfig {
    /// Process memory; carts are lost on restart.
    Memory,
    /// One JSON file per cart under `dir`.
    File { dir: PathBuf },
    /// `cart_snapshot` table in `PostgreSQL`.
    Postgres { database_url: SecretString },
}

impl StorageConfig {
    /// Load only the storage settings from environment variables.
    ///
    /// Used by tools that touch persisted carts without serving them.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown or its settings are
    /// missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load the storage settings from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the backend is unknown or its settings are
    /// missing.
    pub fn from_lookup(env: &impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        match get_env_or_default(env, "PIDEAI_STORAGE", "file").as_str() {
            "memory" => Ok(Self::Memory),
            "file" => Ok(Self::File {
                dir: PathBuf::from(get_env_or_default(env, "PIDEAI_CART_DIR", "data/carts")),
            }),
            "postgres" => Ok(Self::Postgres {
                database_url: get_database_url(env)?,
            }),
            other => Err(ConfigError::InvalidEnvVar(
                "PIDEAI_STORAGE".to_string(),
                format!("unknown backend '{other}' (expected memory, file or postgres)"),
            )),
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
        }
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Tenant id, part of every storage key
    pub store_id: StoreId,
    /// JSON catalog file
    pub catalog_path: PathBuf,
    /// Cart persistence backend
    pub storage: StorageConfig,
    /// How long an untouched cart stays loaded
    pub cart_idle_timeout: Duration,
    /// Initial selection when a customization dialog opens
    pub default_selection: DefaultSelectionPolicy,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(env: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = parse_env(&env, "PIDEAI_HOST", "127.0.0.1")?;
        let port = parse_env(&env, "PIDEAI_PORT", "3000")?;
        let store_id = StoreId::new(get_required_env(&env, "PIDEAI_STORE_ID")?)
            .map_err(|e| ConfigError::InvalidEnvVar("PIDEAI_STORE_ID".to_string(), e.to_string()))?;
        let catalog_path = PathBuf::from(get_required_env(&env, "PIDEAI_CATALOG_PATH")?);

        let storage = StorageConfig::from_lookup(&env)?;

        let idle_secs: u64 = parse_env(&env, "PIDEAI_CART_IDLE_SECS", "1800")?;
        let default_selection = get_env_or_default(&env, "PIDEAI_DEFAULT_SELECTION", "first-available")
            .parse::<DefaultSelectionPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("PIDEAI_DEFAULT_SELECTION".to_string(), e))?;

        Ok(Self {
            host,
            port,
            store_id,
            catalog_path,
            storage,
            cart_idle_timeout: Duration::from_secs(idle_secs),
            default_selection,
            sentry_dsn: get_optional_env(&env, "SENTRY_DSN"),
            sentry_environment: get_optional_env(&env, "SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    env(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
///
/// # Errors
///
/// Returns `ConfigError::MissingEnvVar` if neither variable is set.
pub fn get_database_url(env: &impl Fn(&str) -> Option<String>) -> Result<SecretString, ConfigError> {
    env(DATABASE_URL_VAR)
        .or_else(|| env("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VAR.to_string()))
}

/// Get an optional environment variable, treating empty as unset.
fn get_optional_env(env: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    env(key).filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(env: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to a default.
fn parse_env<T>(
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(env, key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("PIDEAI_STORE_ID", "store-1"),
        ("PIDEAI_CATALOG_PATH", "catalog.json"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.store_id.as_str(), "store-1");
        assert!(matches!(config.storage, StorageConfig::File { ref dir } if dir == &PathBuf::from("data/carts")));
        assert_eq!(config.cart_idle_timeout, Duration::from_secs(1800));
        assert_eq!(config.default_selection, DefaultSelectionPolicy::FirstAvailable);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_store_id() {
        let err = load(&[("PIDEAI_CATALOG_PATH", "catalog.json")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "PIDEAI_STORE_ID"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PIDEAI_PORT", "not-a-port"));
        let err = load(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "PIDEAI_PORT"));
    }

    #[test]
    fn test_postgres_falls_back_to_database_url() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PIDEAI_STORAGE", "postgres"));
        assert!(matches!(load(&vars).unwrap_err(), ConfigError::MissingEnvVar(_)));

        vars.push(("DATABASE_URL", "postgres://localhost/carts"));
        let config = load(&vars).unwrap();
        let StorageConfig::Postgres { database_url } = &config.storage else {
            panic!("expected postgres storage");
        };
        assert_eq!(database_url.expose_secret(), "postgres://localhost/carts");
    }

    #[test]
    fn test_unknown_backend_and_policy() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("PIDEAI_STORAGE", "redis"));
        assert!(load(&vars).is_err());

        let mut vars = REQUIRED.to_vec();
        vars.push(("PIDEAI_DEFAULT_SELECTION", "flagged"));
        assert_eq!(load(&vars).unwrap().default_selection, DefaultSelectionPolicy::Flagged);

        let mut vars = REQUIRED.to_vec();
        vars.push(("PIDEAI_DEFAULT_SELECTION", "random"));
        assert!(load(&vars).is_err());
    }

    #[test]
    fn test_storage_config_alone() {
        let vars: HashMap<&str, &str> = [("PIDEAI_STORAGE", "memory")].into_iter().collect();
        let storage = StorageConfig::from_lookup(&|key: &str| vars.get(key).map(|v| (*v).to_string()))
            .unwrap();
        assert!(matches!(storage, StorageConfig::Memory));

        let storage = StorageConfig::from_lookup(&|_: &str| None).unwrap();
        assert!(matches!(storage, StorageConfig::File { .. }));
    }

    #[test]
    fn test_storage_debug_redacts_database_url() {
        let storage = StorageConfig::Postgres {
            database_url: SecretString::from("postgres://user:hunter2@db/carts"),
        };
        let debug_output = format!("{storage:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }
}
