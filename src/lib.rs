//! ORM Conformance - Backend Capability Negotiation
//!
//! Conformance suites for a database ORM run the same tests against many
//! storage backends (SQLite, MySQL, PostgreSQL, third-party). Not every
//! backend supports every SQL feature, so each test declares what it needs
//! and each backend declares what it has. This crate matches the two and
//! tells the runner which tests to skip, and why.
//!
//! # Core Principles
//! - No backend names in test logic: tests name capabilities, never engines
//! - Typed capability domains: a window-function flag can not be checked
//!   against the CTE set
//! - Deterministic decisions: identical inputs give identical skip reasons
//! - Unsupported is data, not an error; authoring mistakes fail fast
//!
//! # Module Organization
//! - [`capability`] - Capability categories, specific flags, `DatabaseCapabilities`
//! - [`requirement`] - Requirement maps, test registration, manifests
//! - [`negotiation`] - Run/skip decisions with reasons
//! - [`provider`] - Version-driven capability providers and the session cache
//! - [`engine`] - Live backend boundary (version detection, schema scripts)
//! - [`config`] - Named backend configurations
//! - [`output`] - JSON output envelopes for the CLI
//! - [`error`] - Error types and handling

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod negotiation;
pub mod output;
pub mod provider;
pub mod requirement;

// Re-export commonly used types for convenience
pub use capability::{
    AdvancedGroupingCapability, BulkOperationCapability, CTECapability, CapabilityCategory,
    CapabilityReport, ConstraintCapability, DatabaseCapabilities, FullTextSearchCapability,
    JSONCapability, PartitioningCapability, ReturningCapability, SecurityCapability,
    SetOperationCapability, SpatialCapability, SpecificCapability, TransactionCapability,
    WindowFunctionCapability,
};
pub use config::{list_backends, resolve_backend, BackendRegistry, StoredBackend};
pub use engine::{detect_capabilities, BackendEngine, ConnectionConfig, DatabaseType};
pub use error::{Result, SuiteError};
pub use negotiation::{evaluate, evaluate_test, plan, BackendIdentity, Evaluation, TestDecision};
pub use output::{ErrorEnvelope, ErrorInfo, Metadata, SuccessEnvelope};
pub use provider::{
    provider_by_name, provider_for, CapabilityCache, CapabilityProvider, ServerVersion,
};
pub use requirement::{RequirementManifest, RequirementMap, RequirementRegistry, TestRequirements};
