//! `SQLite` Database Engine Implementation
//!
//! This module implements the `BackendEngine` trait for `SQLite` databases.
//!
//! # Features
//! - File-based connections (`/path/to/db.sqlite`)
//! - In-memory connections (`:memory:`)
//! - Library version detection via `sqlite_version()`
//! - Schema scripts via `execute_batch`
//!
//! # Implementation Notes
//! - Uses `rusqlite` (synchronous driver, no async needed)
//! - The reported version is the linked library's, which is what decides
//!   the available SQL features
//! - Schema scripts against `:memory:` are discarded when the connection closes

use rusqlite::{Connection, OpenFlags};
use std::path::Path;

use crate::engine::{BackendEngine, ConnectionConfig, DatabaseType};
use crate::error::{Result, SuiteError};
use crate::provider::ServerVersion;

const MEMORY_PATH: &str = ":memory:";

/// `SQLite` database engine implementation
pub struct SqliteEngine;

impl BackendEngine for SqliteEngine {
    async fn server_version(config: &ConnectionConfig) -> Result<ServerVersion> {
        let path = sqlite_path(config)?;
        let conn = open_connection(path, true)?;

        let version: String =
            conn.query_row("SELECT sqlite_version()", [], |row| row.get(0)).map_err(|e| {
                SuiteError::connection_failed(format!("Failed to query SQLite version: {e}"))
            })?;

        ServerVersion::parse(&version)
    }

    async fn execute_schema(config: &ConnectionConfig, sql: &str) -> Result<()> {
        let path = sqlite_path(config)?;
        let conn = open_connection(path, false)?;

        conn.execute_batch(sql).map_err(|e| {
            SuiteError::engine_error("sqlite", format!("Failed to execute schema script: {e}"))
        })
    }
}

/// Validate the config and extract the database path
fn sqlite_path(config: &ConnectionConfig) -> Result<&str> {
    if config.engine != DatabaseType::SQLite {
        return Err(SuiteError::invalid_input(format!(
            "Expected SQLite engine, got {}",
            config.engine
        )));
    }

    let file_path = config
        .file
        .as_ref()
        .ok_or_else(|| SuiteError::invalid_input("SQLite requires 'file' parameter"))?;

    file_path.to_str().ok_or_else(|| {
        SuiteError::invalid_input("SQLite file path contains invalid UTF-8 characters")
    })
}

/// Open a `SQLite` connection
///
/// Read-only opens never create the file. In-memory databases are always
/// opened read-write.
fn open_connection(path: &str, read_only: bool) -> Result<Connection> {
    let flags = if read_only && path != MEMORY_PATH {
        if !Path::new(path).exists() {
            return Err(SuiteError::connection_failed(format!(
                "SQLite database file does not exist: {path}"
            )));
        }
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    };

    Connection::open_with_flags(path, flags)
        .map_err(|e| SuiteError::connection_failed(format!("Failed to open SQLite database: {e}")))
}
