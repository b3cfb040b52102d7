//! Database Engine Boundary
//!
//! The conformance core never executes test SQL itself. It needs exactly two
//! things from a live backend:
//! - the server version, to pick a capability descriptor
//! - a way to run schema scripts for fixtures
//!
//! Each engine (`PostgreSQL`, `MySQL`, `SQLite`) implements [`BackendEngine`]
//! behind its own cargo feature.
//!
//! # Stateless Design
//! All trait methods are stateless and take `&ConnectionConfig` as input.
//! Connections are opened, used, and closed within each method call.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use crate::capability::DatabaseCapabilities;
use crate::error::{Result, SuiteError};
use crate::negotiation::BackendIdentity;
use crate::provider::{provider_for, CapabilityCache, ServerVersion};

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

/// Supported database engine types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseType {
    /// `PostgreSQL` database
    Postgres,
    /// `MySQL` database
    MySQL,
    /// `SQLite` database
    SQLite,
}

impl DatabaseType {
    /// Get the engine name as a string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySQL => "mysql",
            Self::SQLite => "sqlite",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DatabaseType {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" => Ok(Self::MySQL),
            "sqlite" | "sqlite3" => Ok(Self::SQLite),
            other => Err(SuiteError::unknown_backend(other)),
        }
    }
}

/// Connection configuration for database engines
///
/// Fields are engine-specific (e.g., `file` only applies to `SQLite`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database engine type
    pub engine: DatabaseType,

    /// Hostname (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Port number (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Username (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password (for postgres/mysql)
    /// WARNING: Sensitive data, do not log or include in error messages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Database name (for postgres/mysql)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Database file path, or `:memory:` (for sqlite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Create a new `PostgreSQL` connection config
    #[must_use]
    pub const fn postgres(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::Postgres,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `MySQL` connection config
    #[must_use]
    pub const fn mysql(
        host: String,
        port: u16,
        user: String,
        password: String,
        database: String,
    ) -> Self {
        Self {
            engine: DatabaseType::MySQL,
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            database: Some(database),
            file: None,
        }
    }

    /// Create a new `SQLite` connection config
    #[must_use]
    pub const fn sqlite(file: PathBuf) -> Self {
        Self {
            engine: DatabaseType::SQLite,
            host: None,
            port: None,
            user: None,
            password: None,
            database: None,
            file: Some(file),
        }
    }
}

/// Live backend operations needed by the suite
pub trait BackendEngine {
    /// Connect, read the server version, disconnect
    fn server_version(
        config: &ConnectionConfig,
    ) -> impl std::future::Future<Output = Result<ServerVersion>> + Send;

    /// Connect, run a (multi-statement) schema script, disconnect
    ///
    /// Used to set up fixture tables. The script is executed as-is.
    fn execute_schema(
        config: &ConnectionConfig,
        sql: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Read the server version through the engine matching `config.engine`
pub async fn detect_version(config: &ConnectionConfig) -> Result<ServerVersion> {
    match config.engine {
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => sqlite::SqliteEngine::server_version(config).await,
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => postgres::PostgresEngine::server_version(config).await,
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => mysql::MySqlEngine::server_version(config).await,
        #[allow(unreachable_patterns)]
        other => Err(SuiteError::invalid_input(format!(
            "{other} support was not compiled in (enable the '{other}' feature)"
        ))),
    }
}

/// Run a schema script through the engine matching `config.engine`
pub async fn execute_schema(config: &ConnectionConfig, sql: &str) -> Result<()> {
    match config.engine {
        #[cfg(feature = "sqlite")]
        DatabaseType::SQLite => sqlite::SqliteEngine::execute_schema(config, sql).await,
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => postgres::PostgresEngine::execute_schema(config, sql).await,
        #[cfg(feature = "mysql")]
        DatabaseType::MySQL => mysql::MySqlEngine::execute_schema(config, sql).await,
        #[allow(unreachable_patterns)]
        other => Err(SuiteError::invalid_input(format!(
            "{other} support was not compiled in (enable the '{other}' feature)"
        ))),
    }
}

/// Resolve the backend identity and its capability descriptor
///
/// A pinned version skips the live connection entirely.
pub async fn detect_capabilities(
    config: &ConnectionConfig,
    pinned_version: Option<&str>,
    cache: &mut CapabilityCache,
) -> Result<(BackendIdentity, Arc<DatabaseCapabilities>)> {
    let version = match pinned_version {
        Some(pinned) => ServerVersion::parse(pinned)?,
        None => detect_version(config).await?,
    };

    let provider = provider_for(config.engine);
    let caps = cache.get_or_compute(provider, &version);
    Ok((BackendIdentity::new(provider.backend_name(), version), caps))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityCategory;

    #[test]
    fn test_database_type_serialization() {
        assert_eq!(serde_json::to_string(&DatabaseType::Postgres).unwrap(), r#""postgres""#);
        assert_eq!(serde_json::to_string(&DatabaseType::MySQL).unwrap(), r#""mysql""#);
        assert_eq!(serde_json::to_string(&DatabaseType::SQLite).unwrap(), r#""sqlite""#);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("PostgreSQL".parse::<DatabaseType>().unwrap(), DatabaseType::Postgres);
        assert_eq!("sqlite3".parse::<DatabaseType>().unwrap(), DatabaseType::SQLite);
        assert!(matches!(
            "mariadb".parse::<DatabaseType>().unwrap_err(),
            SuiteError::UnknownBackend(_)
        ));
    }

    #[test]
    fn test_connection_config_constructors() {
        let pg_config = ConnectionConfig::postgres(
            "localhost".to_string(),
            5432,
            "user".to_string(),
            "pass".to_string(),
            "db".to_string(),
        );
        assert_eq!(pg_config.engine, DatabaseType::Postgres);
        assert_eq!(pg_config.port, Some(5432));

        let sqlite_config = ConnectionConfig::sqlite(PathBuf::from("/tmp/test.db"));
        assert_eq!(sqlite_config.engine, DatabaseType::SQLite);
        assert!(sqlite_config.file.is_some());
    }

    #[tokio::test]
    async fn test_detect_capabilities_with_pinned_version() {
        let config = ConnectionConfig::mysql(
            "db.invalid".to_string(),
            3306,
            "user".to_string(),
            "pass".to_string(),
            "db".to_string(),
        );
        let mut cache = CapabilityCache::new();

        let (backend, caps) = detect_capabilities(&config, Some("8.0.35"), &mut cache).await.unwrap();
        assert_eq!(backend.to_string(), "mysql 8.0.35");
        assert!(caps.supports_category(CapabilityCategory::WINDOW_FUNCTIONS));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_detect_capabilities_rejects_bad_pin() {
        let config = ConnectionConfig::sqlite(PathBuf::from(":memory:"));
        let mut cache = CapabilityCache::new();
        let err = detect_capabilities(&config, Some("latest"), &mut cache).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_VERSION");
        assert!(cache.is_empty());
    }
}
