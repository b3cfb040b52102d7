//! `SQLite` Capability Provider
//!
//! Release history used:
//! - 3.6.19: foreign key enforcement
//! - 3.7.11: multi-row `VALUES`
//! - 3.8.3: `WITH` / `WITH RECURSIVE`
//! - 3.9.0: FTS5
//! - 3.25.0: window functions
//! - 3.34.0: multiple recursive terms in one CTE
//! - 3.35.0: `RETURNING`, `MATERIALIZED` hints
//! - 3.38.0: JSON functions built in by default
//!
//! `SQLite` has no `INTERSECT ALL` / `EXCEPT ALL`, no isolation level syntax,
//! no GROUP BY extensions, partitioning or access control.

use crate::capability::{
    BulkOperationCapability, CTECapability, ConstraintCapability, DatabaseCapabilities,
    FullTextSearchCapability, JSONCapability, ReturningCapability, SetOperationCapability,
    TransactionCapability, WindowFunctionCapability,
};
use crate::provider::{CapabilityProvider, ServerVersion};

/// Capabilities of `SQLite` by library version
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteProvider;

impl CapabilityProvider for SqliteProvider {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn capabilities_for(&self, version: &ServerVersion) -> DatabaseCapabilities {
        let mut caps = DatabaseCapabilities::new();

        caps.add_set_operation([
            SetOperationCapability::UNION,
            SetOperationCapability::UNION_ALL,
            SetOperationCapability::INTERSECT,
            SetOperationCapability::EXCEPT,
        ])
        .add_transaction(TransactionCapability::SAVEPOINT)
        .add_bulk_operation(BulkOperationCapability::BATCH_OPERATIONS)
        .add_constraint([
            ConstraintCapability::PRIMARY_KEY,
            ConstraintCapability::UNIQUE,
            ConstraintCapability::CHECK,
        ]);

        if version.at_least(&[3, 6, 19]) {
            caps.add_constraint([ConstraintCapability::FOREIGN_KEY, ConstraintCapability::DEFERRABLE]);
        }

        if version.at_least(&[3, 7, 11]) {
            caps.add_bulk_operation(BulkOperationCapability::MULTI_ROW_INSERT);
        }

        if version.at_least(&[3, 8, 3]) {
            caps.add_cte([
                CTECapability::BASIC_CTE,
                CTECapability::RECURSIVE_CTE,
                CTECapability::CTE_IN_DML,
            ]);
        }

        if version.at_least(&[3, 9, 0]) {
            caps.add_full_text_search([FullTextSearchCapability::MATCH, FullTextSearchCapability::RANKING]);
        }

        if version.at_least(&[3, 25, 0]) {
            caps.add_window_function(WindowFunctionCapability::all());
        }

        if version.at_least(&[3, 34, 0]) {
            caps.add_cte(CTECapability::COMPOUND_RECURSIVE_CTE);
        }

        if version.at_least(&[3, 35, 0]) {
            caps.add_returning(ReturningCapability::all())
                .add_cte(CTECapability::MATERIALIZED_CTE);
        }

        if version.at_least(&[3, 38, 0]) {
            caps.add_json([
                JSONCapability::JSON_EXTRACT,
                JSONCapability::JSON_SET,
                JSONCapability::JSON_INSERT,
                JSONCapability::JSON_REPLACE,
                JSONCapability::JSON_REMOVE,
                JSONCapability::JSON_ARRAY,
                JSONCapability::JSON_OBJECT,
            ]);
        }

        caps
    }
}
