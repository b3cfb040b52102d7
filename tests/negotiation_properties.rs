//! Negotiation Property Tests
//!
//! End-to-end checks of the public API: descriptors are populated through
//! `add_*`, requirement maps are declared through the builder, and
//! `evaluate`/`plan` decide run or skip. Covers:
//! - Additivity and idempotence of descriptor mutation
//! - Empty requirements, category gates, first-failure determinism
//! - Optional requirements never blocking
//! - Independence of domains whose bit values collide
//! - Read-only sharing of a descriptor between threads

use std::sync::Arc;

use bitflags::Flags;
use insta::assert_snapshot;
use pretty_assertions::assert_eq;

use orm_conformance::{
    evaluate, plan, AdvancedGroupingCapability, BackendIdentity, CTECapability,
    CapabilityCategory, DatabaseCapabilities, JSONCapability, RequirementManifest,
    RequirementMap, RequirementRegistry, ReturningCapability, ServerVersion, SpecificCapability,
    SuiteError, WindowFunctionCapability,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn backend(name: &str, version: &str) -> BackendIdentity {
    BackendIdentity::new(name, ServerVersion::parse(version).unwrap())
}

fn require<C: Into<SpecificCapability>>(
    category: CapabilityCategory,
    capabilities: impl IntoIterator<Item = C>,
) -> RequirementMap {
    RequirementMap::new().require(category, capabilities).unwrap()
}

/// Every specific capability of every domain, one value at a time
fn every_specific_capability() -> Vec<SpecificCapability> {
    fn each<F: Flags + Copy + Into<SpecificCapability>>(out: &mut Vec<SpecificCapability>) {
        out.extend(F::FLAGS.iter().map(|flag| (*flag.value()).into()));
    }

    let mut out = Vec::new();
    each::<orm_conformance::SetOperationCapability>(&mut out);
    each::<WindowFunctionCapability>(&mut out);
    each::<AdvancedGroupingCapability>(&mut out);
    each::<CTECapability>(&mut out);
    each::<JSONCapability>(&mut out);
    each::<ReturningCapability>(&mut out);
    each::<orm_conformance::TransactionCapability>(&mut out);
    each::<orm_conformance::BulkOperationCapability>(&mut out);
    each::<orm_conformance::ConstraintCapability>(&mut out);
    each::<orm_conformance::PartitioningCapability>(&mut out);
    each::<orm_conformance::FullTextSearchCapability>(&mut out);
    each::<orm_conformance::SpatialCapability>(&mut out);
    each::<orm_conformance::SecurityCapability>(&mut out);
    out
}

/// Record a single tagged capability through its domain's `add_*` method
fn add(caps: &mut DatabaseCapabilities, capability: SpecificCapability) {
    match capability {
        SpecificCapability::SetOperation(v) => caps.add_set_operation(v),
        SpecificCapability::WindowFunction(v) => caps.add_window_function(v),
        SpecificCapability::AdvancedGrouping(v) => caps.add_advanced_grouping(v),
        SpecificCapability::Cte(v) => caps.add_cte(v),
        SpecificCapability::Json(v) => caps.add_json(v),
        SpecificCapability::Returning(v) => caps.add_returning(v),
        SpecificCapability::Transaction(v) => caps.add_transaction(v),
        SpecificCapability::BulkOperation(v) => caps.add_bulk_operation(v),
        SpecificCapability::Constraint(v) => caps.add_constraint(v),
        SpecificCapability::Partitioning(v) => caps.add_partitioning(v),
        SpecificCapability::FullTextSearch(v) => caps.add_full_text_search(v),
        SpecificCapability::Spatial(v) => caps.add_spatial(v),
        SpecificCapability::Security(v) => caps.add_security(v),
    };
}

// ============================================================================
// Properties
// ============================================================================

#[test]
fn test_add_then_query_is_true_and_idempotent() {
    for capability in every_specific_capability() {
        let mut caps = DatabaseCapabilities::new();
        add(&mut caps, capability);

        assert!(caps.supports_category(capability.category()), "{capability}");
        assert!(caps.supports(&capability), "{capability}");

        let before = caps.clone();
        add(&mut caps, capability);
        assert_eq!(caps, before, "{capability}");
    }
}

#[test]
fn test_empty_requirement_always_runs() {
    let empty = DatabaseCapabilities::new();
    let mut full = DatabaseCapabilities::new();
    for capability in every_specific_capability() {
        add(&mut full, capability);
    }

    for caps in [&empty, &full] {
        let result = evaluate(&backend("sqlite", "3.0"), caps, &RequirementMap::new(), &RequirementMap::new());
        assert_eq!(result.into_parts(), (true, None));
    }
}

#[test]
fn test_missing_category_names_the_category() {
    let caps = DatabaseCapabilities::new();
    let identity = backend("mysql", "5.7.44");

    for capability in every_specific_capability() {
        let category = capability.category();
        let required = RequirementMap::new().require(category, [capability]).unwrap();

        let (can_run, reason) = evaluate(&identity, &caps, &required, &RequirementMap::new()).into_parts();
        assert!(!can_run);

        let reason = reason.unwrap();
        let category_name = capability.to_string();
        let category_name = category_name.split('/').next().unwrap();
        assert_eq!(
            reason,
            format!("mysql 5.7.44 does not support capability category {category_name}")
        );
    }
}

#[test]
fn test_first_failure_is_stable() {
    let mut caps = DatabaseCapabilities::new();
    caps.add_window_function(WindowFunctionCapability::ROW_NUMBER);

    let required = RequirementMap::new()
        .require(CapabilityCategory::WINDOW_FUNCTIONS, [WindowFunctionCapability::NTILE])
        .unwrap()
        .require(CapabilityCategory::CTE, [CTECapability::RECURSIVE_CTE])
        .unwrap()
        .require(CapabilityCategory::JSON_OPERATIONS, [JSONCapability::JSON_EXTRACT])
        .unwrap();

    let identity = backend("sqlite", "3.24.0");
    let first = evaluate(&identity, &caps, &required, &RequirementMap::new());
    for _ in 0..10 {
        assert_eq!(evaluate(&identity, &caps, &required, &RequirementMap::new()), first);
    }
    assert_snapshot!(
        first.reason.unwrap(),
        @"sqlite 3.24.0 does not support WINDOW_FUNCTIONS capability NTILE"
    );
}

#[test]
fn test_optional_never_changes_the_decision() {
    let mut caps = DatabaseCapabilities::new();
    caps.add_cte(CTECapability::BASIC_CTE);
    let identity = backend("postgres", "9.0");

    let satisfied = require(CapabilityCategory::CTE, [CTECapability::BASIC_CTE]);
    let unsatisfied = require(CapabilityCategory::CTE, [CTECapability::MATERIALIZED_CTE]);

    let optionals = [
        RequirementMap::new(),
        require(CapabilityCategory::CTE, [CTECapability::MATERIALIZED_CTE]),
        require(CapabilityCategory::SPATIAL_OPERATIONS, [orm_conformance::SpatialCapability::GEOMETRY_TYPES]),
    ];

    for optional in &optionals {
        assert!(evaluate(&identity, &caps, &satisfied, optional).can_run);
        assert!(!evaluate(&identity, &caps, &unsatisfied, optional).can_run);
    }
}

#[test]
fn test_colliding_bits_are_checked_per_domain() {
    assert_eq!(WindowFunctionCapability::ROW_NUMBER.bits(), 1);
    assert_eq!(AdvancedGroupingCapability::CUBE.bits(), 1);

    let mut caps = DatabaseCapabilities::new();
    caps.add_window_function(WindowFunctionCapability::ROW_NUMBER)
        .add_category(CapabilityCategory::ADVANCED_GROUPING);

    assert!(caps.supports_window_function(WindowFunctionCapability::ROW_NUMBER));
    assert!(!caps.supports_advanced_grouping(AdvancedGroupingCapability::CUBE));
    assert!(caps.supports_raw(CapabilityCategory::WINDOW_FUNCTIONS, 1).unwrap());
    assert!(!caps.supports_raw(CapabilityCategory::ADVANCED_GROUPING, 1).unwrap());

    let required = require(CapabilityCategory::ADVANCED_GROUPING, [AdvancedGroupingCapability::CUBE]);
    let result = evaluate(&backend("sqlite", "3.45.1"), &caps, &required, &RequirementMap::new());
    assert_snapshot!(
        result.reason.unwrap(),
        @"sqlite 3.45.1 does not support ADVANCED_GROUPING capability CUBE"
    );
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_scenario_basic_cte_only() {
    let mut caps = DatabaseCapabilities::new();
    caps.add_cte(CTECapability::BASIC_CTE);
    let identity = backend("sqlite", "3.8.3");

    let basic = require(CapabilityCategory::CTE, [CTECapability::BASIC_CTE]);
    assert!(evaluate(&identity, &caps, &basic, &RequirementMap::new()).can_run);

    let recursive = require(CapabilityCategory::CTE, [CTECapability::RECURSIVE_CTE]);
    let result = evaluate(&identity, &caps, &recursive, &RequirementMap::new());
    assert!(!result.can_run);
    assert_snapshot!(result.reason.unwrap(), @"sqlite 3.8.3 does not support CTE capability RECURSIVE_CTE");
}

#[test]
fn test_scenario_nothing_declared_reports_category() {
    let caps = DatabaseCapabilities::new();
    let required = require(CapabilityCategory::ADVANCED_GROUPING, [AdvancedGroupingCapability::CUBE]);

    let result = evaluate(&backend("thirdparty", "1.0"), &caps, &required, &RequirementMap::new());
    let reason = result.reason.unwrap();
    assert!(!reason.contains("CUBE"));
    assert_snapshot!(reason, @"thirdparty 1.0 does not support capability category ADVANCED_GROUPING");
}

#[test]
fn test_scenario_optional_window_function_ignored() {
    let mut caps = DatabaseCapabilities::new();
    caps.add_window_function([WindowFunctionCapability::ROW_NUMBER, WindowFunctionCapability::RANK]);

    let required = require(CapabilityCategory::WINDOW_FUNCTIONS, [WindowFunctionCapability::ROW_NUMBER]);
    let optional = require(CapabilityCategory::WINDOW_FUNCTIONS, [WindowFunctionCapability::NTILE]);

    let result = evaluate(&backend("mysql", "8.0.35"), &caps, &required, &optional);
    assert_eq!(result.into_parts(), (true, None));
}

#[test]
fn test_scenario_repeated_evaluation_same_reason() {
    let caps = DatabaseCapabilities::new();
    let required = RequirementMap::new()
        .require(CapabilityCategory::RETURNING_CLAUSE, [ReturningCapability::BASIC_RETURNING])
        .unwrap()
        .require(CapabilityCategory::CTE, [CTECapability::BASIC_CTE])
        .unwrap();
    let identity = backend("mysql", "8.0.35");

    let first = evaluate(&identity, &caps, &required, &RequirementMap::new());
    let second = evaluate(&identity, &caps, &required, &RequirementMap::new());
    assert_eq!(first.reason, second.reason);
    assert_snapshot!(
        second.reason.unwrap(),
        @"mysql 8.0.35 does not support capability category RETURNING_CLAUSE"
    );
}

#[test]
fn test_scenario_concurrent_readers() {
    let mut caps = DatabaseCapabilities::new();
    caps.add_cte([CTECapability::BASIC_CTE, CTECapability::RECURSIVE_CTE])
        .add_json(JSONCapability::JSON_EXTRACT);
    let caps = Arc::new(caps);
    let snapshot = (*caps).clone();

    let identity = backend("sqlite", "3.38.0");
    let required = require(CapabilityCategory::JSON_OPERATIONS, [JSONCapability::JSON_SET]);

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let caps = Arc::clone(&caps);
                let identity = &identity;
                let required = &required;
                scope.spawn(move || {
                    (
                        caps.supports_cte(CTECapability::RECURSIVE_CTE),
                        evaluate(identity, &caps, required, &RequirementMap::new()),
                    )
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    assert!(results[0].0);
    assert!(!results[0].1.can_run);
    assert_eq!(*caps, snapshot);
}

// ============================================================================
// Authoring errors
// ============================================================================

#[test]
fn test_empty_capability_list_is_rejected() {
    let err = RequirementMap::new()
        .require(CapabilityCategory::CTE, Vec::<CTECapability>::new())
        .unwrap_err();
    assert!(matches!(err, SuiteError::InvalidRequirement(_)));
}

#[test]
fn test_empty_capability_value_is_rejected() {
    let err = RequirementMap::new()
        .require(CapabilityCategory::CTE, [CTECapability::empty()])
        .unwrap_err();
    assert!(matches!(err, SuiteError::InvalidRequirement(_)));

    let mut registry = RequirementRegistry::new();
    registry
        .declare(
            "query::cte::basic",
            require(CapabilityCategory::CTE, [CTECapability::BASIC_CTE]),
            RequirementMap::new(),
        )
        .unwrap();
    let json = serde_json::to_string(&registry.to_manifest()).unwrap();
    assert!(!json.contains("NONE"));
    let reloaded = RequirementManifest::from_json(&json).unwrap().into_registry().unwrap();
    assert_eq!(reloaded, registry);
}

#[test]
fn test_capability_under_wrong_category_is_rejected() {
    let err = RequirementMap::new()
        .require(CapabilityCategory::CTE, [WindowFunctionCapability::RANK])
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_REQUIREMENT");
    assert!(err.message().contains("WINDOW_FUNCTIONS/RANK"));
}

#[test]
fn test_unknown_raw_bits_are_an_error() {
    let caps = DatabaseCapabilities::new();
    let err = caps.supports_raw(CapabilityCategory::RETURNING_CLAUSE, 1 << 20).unwrap_err();
    assert!(matches!(err, SuiteError::UnknownCapability { .. }));
}

// ============================================================================
// Registry and manifest
// ============================================================================

#[test]
fn test_plan_from_manifest_against_provider() {
    let manifest = RequirementManifest::from_json(
        r#"{"tests": [
            {"id": "query::window::rank",
             "required": [{"category": "WINDOW_FUNCTIONS", "capabilities": ["RANK"]}]},
            {"id": "query::cte::recursive",
             "required": [{"category": "CTE", "capabilities": ["RECURSIVE_CTE"]}],
             "optional": [{"category": "CTE", "capabilities": ["MATERIALIZED_CTE"]}]},
            {"id": "insert::returning",
             "required": [{"category": "RETURNING_CLAUSE", "capabilities": ["BASIC_RETURNING"]}]}
        ]}"#,
    )
    .unwrap();
    let registry = manifest.into_registry().unwrap();

    let provider = orm_conformance::provider_by_name("sqlite").unwrap();
    let version = ServerVersion::parse("3.30.1").unwrap();
    let caps = provider.capabilities_for(&version);
    let identity = BackendIdentity::new(provider.backend_name(), version);

    let decisions = plan(&registry, &identity, &caps);
    let ids: Vec<_> = decisions.iter().map(|d| d.test_id.as_str()).collect();
    assert_eq!(ids, vec!["insert::returning", "query::cte::recursive", "query::window::rank"]);

    assert_snapshot!(serde_json::to_string_pretty(&decisions).unwrap(), @r###"
    [
      {
        "test_id": "insert::returning",
        "can_run": false,
        "reason": "sqlite 3.30.1 does not support capability category RETURNING_CLAUSE"
      },
      {
        "test_id": "query::cte::recursive",
        "can_run": true
      },
      {
        "test_id": "query::window::rank",
        "can_run": true
      }
    ]
    "###);
}

#[test]
fn test_registry_rejects_duplicate_ids() {
    let mut registry = RequirementRegistry::new();
    let required = require(CapabilityCategory::CTE, [CTECapability::BASIC_CTE]);

    registry.declare("query::cte::basic", required.clone(), RequirementMap::new()).unwrap();
    let err = registry.declare("query::cte::basic", required, RequirementMap::new()).unwrap_err();
    assert!(matches!(err, SuiteError::InvalidRequirement(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_manifest_unknown_capability_name() {
    let manifest = RequirementManifest::from_json(
        r#"{"tests": [{"id": "t", "required": [{"category": "CTE", "capabilities": ["ROW_NUMBER"]}]}]}"#,
    )
    .unwrap();
    let err = manifest.into_registry().unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_CAPABILITY");
}
