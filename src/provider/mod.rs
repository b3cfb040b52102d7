//! Backend Capability Providers
//!
//! A provider turns a backend version into a populated [`DatabaseCapabilities`].
//! Providers are pure functions of the version: the same version always yields
//! the same descriptor. Newer versions usually support more, but nothing here
//! relies on that.
//!
//! # Session Cache
//! [`CapabilityCache`] computes each `(backend, version)` descriptor once and
//! hands out shared read-only copies. Fill it during collection, before any
//! test body runs.

use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::capability::DatabaseCapabilities;
use crate::engine::DatabaseType;
use crate::error::{Result, SuiteError};

pub mod mysql;
pub mod postgres;
pub mod sqlite;

pub use mysql::MySqlProvider;
pub use postgres::PostgresProvider;
pub use sqlite::SqliteProvider;

/// Numeric server version such as `3.35.0`
///
/// Ordering is lexicographic over the components, so `3.35` sorts before
/// `3.35.0`. Use [`ServerVersion::at_least`] for release checks, which pads
/// missing components with zeros.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion(Vec<u32>);

impl ServerVersion {
    /// Build a version from its components (an empty list means `0`)
    #[must_use]
    pub fn new(mut components: Vec<u32>) -> Self {
        if components.is_empty() {
            components.push(0);
        }
        Self(components)
    }

    /// Extract the first dotted number from a server version string
    ///
    /// Accepts `"3.45.1"`, `"8.0.31-0ubuntu0.22.04.1"` and
    /// `"PostgreSQL 15.4 on x86_64-pc-linux-gnu"`.
    pub fn parse(text: &str) -> Result<Self> {
        let start = text
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| SuiteError::invalid_version(format!("no version number in '{text}'")))?;

        let numeric: String =
            text[start..].chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();

        let components = numeric
            .split('.')
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<u32>().map_err(|e| {
                    SuiteError::invalid_version(format!("bad component '{part}' in '{text}': {e}"))
                })
            })
            .collect::<Result<Vec<u32>>>()?;

        Ok(Self::new(components))
    }

    #[must_use]
    pub fn components(&self) -> &[u32] {
        &self.0
    }

    /// True if this version is the same release as `minimum` or newer
    #[must_use]
    pub fn at_least(&self, minimum: &[u32]) -> bool {
        let len = self.0.len().max(minimum.len());
        let own = self.0.iter().copied().chain(std::iter::repeat(0)).take(len);
        let other = minimum.iter().copied().chain(std::iter::repeat(0)).take(len);
        own.cmp(other).is_ge()
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(u32::to_string).collect();
        write!(f, "{}", parts.join("."))
    }
}

impl FromStr for ServerVersion {
    type Err = SuiteError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ServerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Produces a capability descriptor for one backend
pub trait CapabilityProvider: Send + Sync {
    /// Backend name used in skip reasons and cache keys
    fn backend_name(&self) -> &'static str;

    /// Build the descriptor for `version`
    ///
    /// Must be deterministic for a given version.
    fn capabilities_for(&self, version: &ServerVersion) -> DatabaseCapabilities;
}

/// Provider for an engine type
#[must_use]
pub fn provider_for(engine: DatabaseType) -> &'static dyn CapabilityProvider {
    match engine {
        DatabaseType::SQLite => &SqliteProvider,
        DatabaseType::MySQL => &MySqlProvider,
        DatabaseType::Postgres => &PostgresProvider,
    }
}

/// Provider by backend name (`sqlite`, `mysql`, `postgres`)
pub fn provider_by_name(name: &str) -> Result<&'static dyn CapabilityProvider> {
    let engine: DatabaseType = name.parse()?;
    Ok(provider_for(engine))
}

/// Per-session store of computed descriptors
#[derive(Debug, Default)]
pub struct CapabilityCache {
    entries: HashMap<(String, ServerVersion), Arc<DatabaseCapabilities>>,
}

impl CapabilityCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor for `(provider, version)`, computed on first request
    pub fn get_or_compute(
        &mut self,
        provider: &dyn CapabilityProvider,
        version: &ServerVersion,
    ) -> Arc<DatabaseCapabilities> {
        let key = (provider.backend_name().to_string(), version.clone());
        if let Some(existing) = self.entries.get(&key) {
            debug!(backend = provider.backend_name(), version = %version, "capability cache hit");
            return Arc::clone(existing);
        }

        let caps = Arc::new(provider.capabilities_for(version));
        info!(
            backend = provider.backend_name(),
            version = %version,
            categories = caps.categories().bits().count_ones(),
            "populated capability descriptor"
        );
        self.entries.insert(key, Arc::clone(&caps));
        caps
    }

    /// Previously computed descriptor, if any
    #[must_use]
    pub fn get(&self, backend: &str, version: &ServerVersion) -> Option<Arc<DatabaseCapabilities>> {
        self.entries.get(&(backend.to_string(), version.clone())).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
