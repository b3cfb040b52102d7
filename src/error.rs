//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout the conformance core.
//! All errors are structured and map to specific error codes for JSON output.
//!
//! # Error Categories
//! - `InvalidRequirement`: Malformed requirement declarations (authoring error)
//! - `UnknownCapability`: A capability name or bit pattern outside its category
//! - `UnknownBackend`: No capability provider registered under a backend name
//! - `InvalidVersion`: A server version string without a numeric component
//! - `ConnectionFailed`: Database connection errors
//! - `EngineError`: Engine-specific database errors
//! - `InvalidInput`: Malformed input or missing required parameters
//! - `ConfigError`: Configuration file or backend registry errors
//!
//! An unsupported capability is not an error. Negotiation reports it as a
//! skip decision.

use thiserror::Error;

/// Main error type for conformance operations
#[derive(Error, Debug)]
pub enum SuiteError {
    /// Requirement map is malformed (empty list, mismatched category, duplicate test)
    #[error("Invalid requirement: {0}")]
    InvalidRequirement(String),

    /// Capability does not belong to the enumeration of its category
    #[error("Unknown capability '{name}' for category {category}")]
    UnknownCapability { category: String, name: String },

    /// No provider knows this backend
    #[error("Unknown backend: {0}")]
    UnknownBackend(String),

    /// Server version could not be parsed
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Invalid input or missing required parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error (file not found, invalid JSON, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SuiteError {
    /// Convert error to error code string for JSON output
    ///
    /// Error codes are stable and suitable for programmatic handling by test runners.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidRequirement(_) => "INVALID_REQUIREMENT",
            Self::UnknownCapability { .. } => "UNKNOWN_CAPABILITY",
            Self::UnknownBackend(_) => "UNKNOWN_BACKEND",
            Self::InvalidVersion(_) => "INVALID_VERSION",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Get human-readable error message (no credentials)
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create an invalid requirement error
    pub fn invalid_requirement(message: impl Into<String>) -> Self {
        Self::InvalidRequirement(message.into())
    }

    /// Create an unknown capability error
    pub fn unknown_capability(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownCapability { category: category.into(), name: name.into() }
    }

    /// Create an unknown backend error
    pub fn unknown_backend(name: impl Into<String>) -> Self {
        Self::UnknownBackend(name.into())
    }

    /// Create an invalid version error
    pub fn invalid_version(message: impl Into<String>) -> Self {
        Self::InvalidVersion(message.into())
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }
}

/// Result type alias for conformance operations
pub type Result<T> = std::result::Result<T, SuiteError>;
