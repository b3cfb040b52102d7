//! JSON Output Envelope Types
//!
//! This module defines the structured JSON output format of the CLI.
//! Every command prints either a `SuccessEnvelope` or an `ErrorEnvelope`.
//!
//! # Output Contract
//! - Success: `{"ok": true, "backend": "...", "command": "...", "data": {...}, "meta": {...}}`
//! - Error: `{"ok": false, "backend": "...", "command": "...", "error": {"code": "...", "message": "..."}}`

use serde::{Deserialize, Serialize};

use crate::error::SuiteError;

/// Success envelope for command results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessEnvelope<T> {
    /// Always true for success envelopes
    pub ok: bool,

    /// Backend the command ran against (`sqlite 3.45.1`), empty if none
    pub backend: String,

    /// Command that was executed (capabilities, evaluate, probe, backends)
    pub command: String,

    /// Command-specific data
    pub data: T,

    /// Execution metadata
    pub meta: Metadata,
}

impl<T> SuccessEnvelope<T> {
    /// Create a new success envelope
    pub fn new(backend: impl Into<String>, command: impl Into<String>, data: T, meta: Metadata) -> Self {
        Self {
            ok: true,
            backend: backend.into(),
            command: command.into(),
            data,
            meta,
        }
    }
}

/// Error envelope for command failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Always false for error envelopes
    pub ok: bool,

    /// Backend (empty string if not backend-specific)
    pub backend: String,

    /// Command that was attempted
    pub command: String,

    /// Error information
    pub error: ErrorInfo,
}

impl ErrorEnvelope {
    /// Create a new error envelope
    pub fn new(backend: impl Into<String>, command: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            ok: false,
            backend: backend.into(),
            command: command.into(),
            error,
        }
    }

    /// Create error envelope from SuiteError
    pub fn from_error(backend: impl Into<String>, command: impl Into<String>, err: &SuiteError) -> Self {
        Self::new(
            backend,
            command,
            ErrorInfo {
                code: err.error_code().to_string(),
                message: err.message(),
            },
        )
    }
}

/// Error information structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable error code (e.g., "INVALID_REQUIREMENT", "UNKNOWN_CAPABILITY")
    pub code: String,

    /// Human-readable error message (no credentials)
    pub message: String,
}

impl ErrorInfo {
    /// Create a new error info
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Execution metadata included in all success responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    /// Execution time in milliseconds
    pub execution_ms: u64,

    /// Number of tests evaluated (evaluate only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tests: Option<usize>,

    /// Number of tests that would be skipped (evaluate only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<usize>,
}

impl Metadata {
    /// Create new metadata with just execution time
    pub fn new(execution_ms: u64) -> Self {
        Self {
            execution_ms,
            tests: None,
            skipped: None,
        }
    }

    /// Create new metadata with test counts
    pub fn with_counts(execution_ms: u64, tests: usize, skipped: usize) -> Self {
        Self {
            execution_ms,
            tests: Some(tests),
            skipped: Some(skipped),
        }
    }
}
