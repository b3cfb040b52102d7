//! `PostgreSQL` Database Engine Implementation
//!
//! This module implements the `BackendEngine` trait for `PostgreSQL` databases.
//!
//! # Implementation Notes
//! - Uses `tokio-postgres` (async driver, requires tokio runtime)
//! - Version comes from `SHOW server_version` (e.g. `15.4 (Debian 15.4-1)`)
//! - Schema scripts run through the simple query protocol, so they may hold
//!   several statements
//! - TLS is not negotiated

use tokio_postgres::{Client, Config, NoTls};

use crate::engine::{BackendEngine, ConnectionConfig, DatabaseType};
use crate::error::{Result, SuiteError};
use crate::provider::ServerVersion;

/// `PostgreSQL` database engine implementation
pub struct PostgresEngine;

impl BackendEngine for PostgresEngine {
    async fn server_version(config: &ConnectionConfig) -> Result<ServerVersion> {
        let client = connect(config).await?;

        let row = client.query_one("SHOW server_version", &[]).await.map_err(|e| {
            SuiteError::connection_failed(format!("Failed to query PostgreSQL version: {e}"))
        })?;

        let version_string: String = row.get(0);
        ServerVersion::parse(&version_string)
    }

    async fn execute_schema(config: &ConnectionConfig, sql: &str) -> Result<()> {
        let client = connect(config).await?;

        client.batch_execute(sql).await.map_err(|e| {
            SuiteError::engine_error("postgres", format!("Failed to execute schema script: {e}"))
        })
    }
}

/// Connect and spawn the connection driver task
async fn connect(config: &ConnectionConfig) -> Result<Client> {
    if config.engine != DatabaseType::Postgres {
        return Err(SuiteError::invalid_input(format!(
            "Expected PostgreSQL engine, got {}",
            config.engine
        )));
    }

    let pg_config = build_pg_config(config)?;

    let (client, connection) = pg_config.connect(NoTls).await.map_err(|e| {
        SuiteError::connection_failed(format!("Failed to connect to PostgreSQL: {e}"))
    })?;

    // Connection errors are not logged to prevent credential leakage
    tokio::spawn(async move {
        let _ = connection.await;
    });

    Ok(client)
}

/// Build `PostgreSQL` connection config from `ConnectionConfig`
fn build_pg_config(config: &ConnectionConfig) -> Result<Config> {
    let host = config
        .host
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("PostgreSQL requires 'host' parameter"))?;

    let port = config
        .port
        .ok_or_else(|| SuiteError::invalid_input("PostgreSQL requires 'port' parameter"))?;

    let user = config
        .user
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("PostgreSQL requires 'user' parameter"))?;

    let password = config
        .password
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("PostgreSQL requires 'password' parameter"))?;

    // The maintenance database is enough for version detection
    let db_name = config.database.as_deref().unwrap_or("postgres");

    let mut pg_config = Config::new();
    pg_config.host(host).port(port).user(user).password(password).dbname(db_name);

    Ok(pg_config)
}
