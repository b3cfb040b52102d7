//! `MySQL` Capability Provider
//!
//! Covers `MySQL` 5.x and 8.x. `MariaDB` reports 10.x/11.x versions with a
//! different feature history and is not handled here.
//!
//! Release history used:
//! - 5.6: `START TRANSACTION READ ONLY`, InnoDB full-text search
//! - 5.7: native JSON functions (5.7.8), InnoDB spatial indexes (5.7.5)
//! - 8.0.0: CTEs, window functions, roles
//! - 8.0.16: enforced CHECK constraints
//! - 8.0.31: `INTERSECT` / `EXCEPT`

use crate::capability::{
    AdvancedGroupingCapability, BulkOperationCapability, CTECapability, ConstraintCapability,
    DatabaseCapabilities, FullTextSearchCapability, JSONCapability, PartitioningCapability,
    SecurityCapability, SetOperationCapability, SpatialCapability, TransactionCapability,
    WindowFunctionCapability,
};
use crate::provider::{CapabilityProvider, ServerVersion};

/// Capabilities of `MySQL` by server version
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlProvider;

impl CapabilityProvider for MySqlProvider {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    fn capabilities_for(&self, version: &ServerVersion) -> DatabaseCapabilities {
        let mut caps = DatabaseCapabilities::new();

        caps.add_set_operation([SetOperationCapability::UNION, SetOperationCapability::UNION_ALL])
            .add_advanced_grouping(AdvancedGroupingCapability::ROLLUP)
            .add_transaction([TransactionCapability::SAVEPOINT, TransactionCapability::ISOLATION_LEVELS])
            .add_bulk_operation(BulkOperationCapability::all())
            .add_constraint([
                ConstraintCapability::PRIMARY_KEY,
                ConstraintCapability::FOREIGN_KEY,
                ConstraintCapability::UNIQUE,
            ])
            .add_partitioning(PartitioningCapability::all())
            .add_spatial([SpatialCapability::GEOMETRY_TYPES, SpatialCapability::SPATIAL_FUNCTIONS])
            .add_security(SecurityCapability::COLUMN_PRIVILEGES);

        if version.at_least(&[5, 6]) {
            caps.add_transaction(TransactionCapability::READ_ONLY_TRANSACTIONS)
                .add_full_text_search(FullTextSearchCapability::all());
        }

        if version.at_least(&[5, 7, 5]) {
            caps.add_spatial(SpatialCapability::SPATIAL_INDEX);
        }

        if version.at_least(&[5, 7, 8]) {
            caps.add_json([
                JSONCapability::JSON_EXTRACT,
                JSONCapability::JSON_CONTAINS,
                JSONCapability::JSON_SET,
                JSONCapability::JSON_INSERT,
                JSONCapability::JSON_REPLACE,
                JSONCapability::JSON_REMOVE,
                JSONCapability::JSON_KEYS,
                JSONCapability::JSON_ARRAY,
                JSONCapability::JSON_OBJECT,
            ]);
        }

        if version.at_least(&[8, 0, 0]) {
            caps.add_cte([
                CTECapability::BASIC_CTE,
                CTECapability::RECURSIVE_CTE,
                CTECapability::COMPOUND_RECURSIVE_CTE,
                CTECapability::CTE_IN_DML,
            ])
            .add_window_function(WindowFunctionCapability::all())
            .add_security(SecurityCapability::ROLES);
        }

        if version.at_least(&[8, 0, 16]) {
            caps.add_constraint(ConstraintCapability::CHECK);
        }

        if version.at_least(&[8, 0, 31]) {
            caps.add_set_operation([
                SetOperationCapability::INTERSECT,
                SetOperationCapability::INTERSECT_ALL,
                SetOperationCapability::EXCEPT,
                SetOperationCapability::EXCEPT_ALL,
            ]);
        }

        caps
    }
}
