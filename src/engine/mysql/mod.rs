//! MySQL Database Engine Implementation
//!
//! This module implements the `BackendEngine` trait for MySQL databases.
//!
//! # Implementation Notes
//! - Uses `mysql_async` (async driver, requires tokio runtime)
//! - MariaDB servers are detected from the version string and rejected:
//!   their 10.x/11.x numbering does not line up with MySQL feature history
//! - Schema scripts are sent as one text query (multi-statement)

use mysql_async::{prelude::*, Conn, OptsBuilder};

use crate::engine::{BackendEngine, ConnectionConfig, DatabaseType};
use crate::error::{Result, SuiteError};
use crate::provider::ServerVersion;

/// MySQL database engine implementation
pub struct MySqlEngine;

impl BackendEngine for MySqlEngine {
    async fn server_version(config: &ConnectionConfig) -> Result<ServerVersion> {
        let mut conn = connect(config).await?;

        let version_string: Option<String> = conn.query_first("SELECT VERSION()").await.map_err(|e| {
            SuiteError::connection_failed(format!("Failed to query MySQL version: {e}"))
        })?;

        disconnect(conn).await?;

        let version_string = version_string
            .ok_or_else(|| SuiteError::connection_failed("No version returned".to_string()))?;
        parse_mysql_version(&version_string)
    }

    async fn execute_schema(config: &ConnectionConfig, sql: &str) -> Result<()> {
        let mut conn = connect(config).await?;

        conn.query_drop(sql).await.map_err(|e| {
            SuiteError::engine_error("mysql", format!("Failed to execute schema script: {e}"))
        })?;

        disconnect(conn).await
    }
}

async fn connect(config: &ConnectionConfig) -> Result<Conn> {
    if config.engine != DatabaseType::MySQL {
        return Err(SuiteError::invalid_input(format!(
            "Expected MySQL engine, got {}",
            config.engine
        )));
    }

    let opts = build_mysql_opts(config)?;
    Conn::new(opts)
        .await
        .map_err(|e| SuiteError::connection_failed(format!("Failed to connect to MySQL: {e}")))
}

async fn disconnect(conn: Conn) -> Result<()> {
    conn.disconnect()
        .await
        .map_err(|e| SuiteError::connection_failed(format!("Failed to disconnect: {e}")))
}

/// Build MySQL connection options from `ConnectionConfig`
fn build_mysql_opts(config: &ConnectionConfig) -> Result<OptsBuilder> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("MySQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| SuiteError::invalid_input("MySQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("MySQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("MySQL requires 'password' parameter"))?;

    let opts = OptsBuilder::default()
        .ip_or_hostname(host)
        .tcp_port(port)
        .user(Some(user))
        .pass(Some(password))
        .db_name(config.database.as_ref());

    Ok(opts)
}

/// Parse a MySQL version string, rejecting MariaDB
///
/// Example MySQL: "8.0.35" or "8.0.35-0ubuntu0.22.04.1"
/// Example MariaDB: "10.11.2-MariaDB"
fn parse_mysql_version(version_string: &str) -> Result<ServerVersion> {
    if version_string.to_uppercase().contains("MARIADB") {
        return Err(SuiteError::unknown_backend(format!(
            "MariaDB {version_string} is not covered by the mysql capability provider"
        )));
    }
    ServerVersion::parse(version_string)
}
