//! Negotiation Engine
//!
//! Decides whether a test may run against one backend and, if not, why.
//!
//! # Algorithm
//! Required entries are checked in declaration order:
//! 1. the entry's category must be in the backend's category set,
//!    otherwise the reason names the category alone
//! 2. each listed capability is checked against the domain its category owns;
//!    the first unsupported one produces a reason naming category and capability
//!
//! The first unmet entry wins. Optional entries are never consulted, so they
//! can not turn a run into a skip.
//!
//! Reasons are plain strings built only from the backend identity and flag
//! names, so identical inputs always yield identical reasons.

use serde::Serialize;
use std::fmt;
use tracing::debug;

use crate::capability::{flag_names, DatabaseCapabilities};
use crate::provider::ServerVersion;
use crate::requirement::{RequirementMap, RequirementRegistry, TestRequirements};

/// Backend name and version, as shown in skip reasons
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BackendIdentity {
    pub name: String,
    pub version: ServerVersion,
}

impl BackendIdentity {
    pub fn new(name: impl Into<String>, version: ServerVersion) -> Self {
        Self { name: name.into(), version }
    }
}

impl fmt::Display for BackendIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Outcome of one negotiation
///
/// `reason` is `Some` exactly when `can_run` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub can_run: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Evaluation {
    /// The test may run
    #[must_use]
    pub const fn run() -> Self {
        Self { can_run: true, reason: None }
    }

    /// The test must be skipped
    pub fn skip(reason: impl Into<String>) -> Self {
        Self { can_run: false, reason: Some(reason.into()) }
    }

    /// `(can_run, reason)` pair for runners that want a tuple
    #[must_use]
    pub fn into_parts(self) -> (bool, Option<String>) {
        (self.can_run, self.reason)
    }
}

/// Compare a requirement map against a backend's capabilities
///
/// `optional` is accepted for symmetry with the declaration but has no
/// influence on the result.
#[must_use]
pub fn evaluate(
    backend: &BackendIdentity,
    capabilities: &DatabaseCapabilities,
    required: &RequirementMap,
    _optional: &RequirementMap,
) -> Evaluation {
    for entry in required.entries() {
        let category = entry.category();

        if !capabilities.supports_category(category) {
            return Evaluation::skip(format!(
                "{backend} does not support capability category {}",
                flag_names(&category)
            ));
        }

        if let Some(missing) = entry.capabilities().iter().find(|cap| !capabilities.supports(cap)) {
            return Evaluation::skip(format!(
                "{backend} does not support {} capability {}",
                flag_names(&category),
                missing.name()
            ));
        }
    }

    Evaluation::run()
}

/// [`evaluate`] over a test's full declaration
#[must_use]
pub fn evaluate_test(
    backend: &BackendIdentity,
    capabilities: &DatabaseCapabilities,
    requirements: &TestRequirements,
) -> Evaluation {
    evaluate(backend, capabilities, &requirements.required, &requirements.optional)
}

/// Decision for one registered test
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDecision {
    pub test_id: String,

    #[serde(flatten)]
    pub evaluation: Evaluation,
}

/// Evaluate every registered test against one backend, ordered by test id
#[must_use]
pub fn plan(
    registry: &RequirementRegistry,
    backend: &BackendIdentity,
    capabilities: &DatabaseCapabilities,
) -> Vec<TestDecision> {
    registry
        .iter()
        .map(|(test_id, requirements)| {
            let evaluation = evaluate_test(backend, capabilities, requirements);
            if let Some(reason) = &evaluation.reason {
                debug!(test_id, backend = %backend, reason = %reason, "skipping test");
            }
            TestDecision { test_id: test_id.to_string(), evaluation }
        })
        .collect()
}
