//! Configuration Management
//!
//! This module handles loading and saving named backend configurations, the
//! set of databases a conformance run is parametrized over.
//!
//! # Configuration Locations
//! - Local: `.orm-conformance/backends.json` (team-shareable, per-project)
//! - Global: `~/.config/orm-conformance/backends.json` (per-user)
//!
//! # Resolution Precedence
//! Local entries replace global entries with the same name.
//!
//! # File Format
//! ```json
//! {
//!   "backends": {
//!     "sqlite-memory": { "engine": "sqlite", "file": ":memory:" },
//!     "pg15": {
//!       "engine": "postgres", "host": "localhost", "port": 5432,
//!       "user": "suite", "database": "suite", "password_env": "PG_PASSWORD"
//!     },
//!     "mysql-legacy": { "engine": "mysql", "host": "ci-mysql", "port": 3306,
//!                       "user": "root", "password": "", "version": "5.7.44" }
//!   }
//! }
//! ```
//! `version` pins the server version and skips live detection.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::ConnectionConfig;
use crate::error::{Result, SuiteError};

const CONFIG_DIR_NAME: &str = "orm-conformance";
const LOCAL_DIR_NAME: &str = ".orm-conformance";
const CONFIG_FILE_NAME: &str = "backends.json";

/// Named backend configurations (stored in config files)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendRegistry {
    /// Backends by name, listed in name order
    #[serde(default)]
    pub backends: BTreeMap<String, StoredBackend>,
}

/// Stored backend configuration
///
/// Like `ConnectionConfig` but supports environment variable references for
/// passwords and an optional pinned version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBackend {
    /// Connection configuration
    #[serde(flatten)]
    pub config: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Pinned server version, bypasses version detection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A backend ready to be probed
#[derive(Debug, Clone)]
pub struct ResolvedBackend {
    pub name: String,
    pub config: ConnectionConfig,
    pub pinned_version: Option<String>,
}

impl StoredBackend {
    /// Wrap a connection config without env references or pinning
    #[must_use]
    pub const fn new(config: ConnectionConfig) -> Self {
        Self { config, password_env: None, version: None }
    }

    /// Resolve environment variables
    pub fn resolve(&self, name: &str) -> Result<ResolvedBackend> {
        let mut config = self.config.clone();

        if let Some(env_var) = &self.password_env {
            match std::env::var(env_var) {
                Ok(password) => config.password = Some(password),
                Err(_) => {
                    return Err(SuiteError::config_error(format!(
                        "Environment variable {env_var} not found for password of backend '{name}'"
                    )));
                }
            }
        }

        Ok(ResolvedBackend {
            name: name.to_string(),
            config,
            pinned_version: self.version.clone(),
        })
    }
}

/// Get path to local config file
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        SuiteError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(LOCAL_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Get path to global config file
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| SuiteError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Load a backend registry from a config file
///
/// A missing file is an empty registry.
pub fn load_backends(path: &Path) -> Result<BackendRegistry> {
    if !path.exists() {
        return Ok(BackendRegistry::default());
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| SuiteError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str(&contents)
        .map_err(|e| SuiteError::config_error(format!("Invalid config file format: {e}")))
}

/// Save a backend registry to a config file, creating parent directories
pub fn save_backends(path: &Path, registry: &BackendRegistry) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SuiteError::config_error(format!("Could not create config directory: {e}"))
        })?;
    }

    let contents = serde_json::to_string_pretty(registry)
        .map_err(|e| SuiteError::config_error(format!("Could not serialize config: {e}")))?;

    fs::write(path, contents)
        .map_err(|e| SuiteError::config_error(format!("Could not write config file: {e}")))
}

/// Merge two registries, `local` entries winning on name clashes
#[must_use]
pub fn merge(global: BackendRegistry, local: BackendRegistry) -> BackendRegistry {
    let mut merged = global;
    merged.backends.extend(local.backends);
    merged
}

/// Load both config files with local precedence
pub fn load_with_precedence() -> Result<BackendRegistry> {
    let global = load_backends(&global_config_path()?)?;
    let local = load_backends(&local_config_path()?)?;
    Ok(merge(global, local))
}

/// Resolve a named backend from the merged view
pub fn resolve_backend(name: &str) -> Result<ResolvedBackend> {
    let registry = load_with_precedence()?;
    lookup(&registry, name)
}

/// Resolve a named backend from a given registry
pub fn lookup(registry: &BackendRegistry, name: &str) -> Result<ResolvedBackend> {
    let stored = registry.backends.get(name).ok_or_else(|| {
        let available: Vec<_> = registry.backends.keys().collect();
        SuiteError::config_error(format!(
            "Backend '{name}' not found. Available backends: {available:?}"
        ))
    })?;

    stored.resolve(name)
}

/// List all configured backend names with their engine, in name order
pub fn list_backends() -> Result<Vec<(String, ConnectionConfig)>> {
    let registry = load_with_precedence()?;
    Ok(registry
        .backends
        .into_iter()
        .map(|(name, stored)| (name, stored.config))
        .collect())
}
