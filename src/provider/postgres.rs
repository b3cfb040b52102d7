//! `PostgreSQL` Capability Provider
//!
//! Release history used:
//! - 8.4: window functions, `WITH RECURSIVE`
//! - 9.1: data-modifying statements in `WITH`
//! - 9.3 / 9.4: JSON operators and constructors, `jsonb` containment
//! - 9.5: `GROUPING SETS` / `CUBE` / `ROLLUP`, `jsonb_set`, row level security
//! - 9.6: `jsonb_insert`
//! - 10: declarative RANGE / LIST partitioning
//! - 11: HASH partitioning
//! - 12: `MATERIALIZED` CTE hints
//!
//! Spatial support comes from the PostGIS extension and is not assumed.

use crate::capability::{
    AdvancedGroupingCapability, BulkOperationCapability, CTECapability, ConstraintCapability,
    DatabaseCapabilities, FullTextSearchCapability, JSONCapability, PartitioningCapability,
    ReturningCapability, SecurityCapability, SetOperationCapability, TransactionCapability,
    WindowFunctionCapability,
};
use crate::provider::{CapabilityProvider, ServerVersion};

/// Capabilities of `PostgreSQL` by server version
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresProvider;

impl CapabilityProvider for PostgresProvider {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    fn capabilities_for(&self, version: &ServerVersion) -> DatabaseCapabilities {
        let mut caps = DatabaseCapabilities::new();

        caps.add_set_operation(SetOperationCapability::all())
            .add_returning(ReturningCapability::all())
            .add_transaction(TransactionCapability::all())
            .add_bulk_operation(BulkOperationCapability::all())
            .add_constraint(ConstraintCapability::all())
            .add_full_text_search([FullTextSearchCapability::MATCH, FullTextSearchCapability::RANKING])
            .add_security([SecurityCapability::COLUMN_PRIVILEGES, SecurityCapability::ROLES]);

        if version.at_least(&[8, 4]) {
            caps.add_window_function(WindowFunctionCapability::all())
                .add_cte([CTECapability::BASIC_CTE, CTECapability::RECURSIVE_CTE]);
        }

        if version.at_least(&[9, 1]) {
            caps.add_cte(CTECapability::CTE_IN_DML);
        }

        if version.at_least(&[9, 3]) {
            caps.add_json([JSONCapability::JSON_EXTRACT, JSONCapability::JSON_KEYS]);
        }

        if version.at_least(&[9, 4]) {
            caps.add_json([
                JSONCapability::JSON_CONTAINS,
                JSONCapability::JSON_EXISTS,
                JSONCapability::JSON_ARRAY,
                JSONCapability::JSON_OBJECT,
            ]);
        }

        if version.at_least(&[9, 5]) {
            caps.add_advanced_grouping(AdvancedGroupingCapability::all())
                .add_json([
                    JSONCapability::JSON_SET,
                    JSONCapability::JSON_REPLACE,
                    JSONCapability::JSON_REMOVE,
                ])
                .add_security(SecurityCapability::ROW_LEVEL_SECURITY);
        }

        if version.at_least(&[9, 6]) {
            caps.add_json(JSONCapability::JSON_INSERT);
        }

        if version.at_least(&[10]) {
            caps.add_partitioning([PartitioningCapability::RANGE, PartitioningCapability::LIST]);
        }

        if version.at_least(&[11]) {
            caps.add_partitioning(PartitioningCapability::HASH);
        }

        if version.at_least(&[12]) {
            caps.add_cte(CTECapability::MATERIALIZED_CTE);
        }

        caps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{CapabilityCategory, SpatialCapability};

    fn caps(version: &str) -> DatabaseCapabilities {
        PostgresProvider.capabilities_for(&ServerVersion::parse(version).unwrap())
    }

    #[test]
    fn test_grouping_sets_from_9_5() {
        assert!(!caps("9.4.26").supports_category(CapabilityCategory::ADVANCED_GROUPING));
        assert!(caps("9.5.0").supports_advanced_grouping(AdvancedGroupingCapability::GROUPING_SETS));
    }

    #[test]
    fn test_materialized_cte_from_12() {
        assert!(!caps("11.22").supports_cte(CTECapability::MATERIALIZED_CTE));
        assert!(caps("12.0").supports_cte(CTECapability::MATERIALIZED_CTE));
    }

    #[test]
    fn test_hash_partitioning_from_11() {
        let v10 = caps("10.23");
        assert!(v10.supports_partitioning(PartitioningCapability::RANGE));
        assert!(!v10.supports_partitioning(PartitioningCapability::HASH));
        assert!(caps("16.1").supports_partitioning(PartitioningCapability::all()));
    }

    #[test]
    fn test_no_spatial_without_extension() {
        assert!(!caps("16.1").supports_spatial(SpatialCapability::GEOMETRY_TYPES));
    }
}
