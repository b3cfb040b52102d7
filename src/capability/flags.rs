//! Capability Bit Sets
//!
//! One top-level category set plus one enumeration per category. Every
//! enumeration numbers its bits from `1 << 0`, so the raw value `1` means
//! `ROW_NUMBER`, `CUBE`, `BASIC_CTE`, ... depending on the type it lives in.
//! The types keep those domains apart; a raw bit pattern is only meaningful
//! next to its category.

use bitflags::bitflags;

bitflags! {
    /// Top-level SQL feature domains.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapabilityCategory: u32 {
        const SET_OPERATIONS       = 1 << 0;
        const WINDOW_FUNCTIONS     = 1 << 1;
        const ADVANCED_GROUPING    = 1 << 2;
        const CTE                  = 1 << 3;
        const JSON_OPERATIONS      = 1 << 4;
        const RETURNING_CLAUSE     = 1 << 5;
        const TRANSACTION_FEATURES = 1 << 6;
        const BULK_OPERATIONS      = 1 << 7;
        const CONSTRAINTS          = 1 << 8;
        const PARTITIONING         = 1 << 9;
        const FULL_TEXT_SEARCH     = 1 << 10;
        const SPATIAL_OPERATIONS   = 1 << 11;
        const SECURITY_FEATURES    = 1 << 12;
    }
}

bitflags! {
    /// UNION / INTERSECT / EXCEPT and their ALL forms.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SetOperationCapability: u32 {
        const UNION         = 1 << 0;
        const UNION_ALL     = 1 << 1;
        const INTERSECT     = 1 << 2;
        const INTERSECT_ALL = 1 << 3;
        const EXCEPT        = 1 << 4;
        const EXCEPT_ALL    = 1 << 5;
    }
}

bitflags! {
    /// Window (OVER clause) functions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowFunctionCapability: u32 {
        const ROW_NUMBER   = 1 << 0;
        const RANK         = 1 << 1;
        const DENSE_RANK   = 1 << 2;
        const LAG          = 1 << 3;
        const LEAD         = 1 << 4;
        const FIRST_VALUE  = 1 << 5;
        const LAST_VALUE   = 1 << 6;
        const NTH_VALUE    = 1 << 7;
        const CUME_DIST    = 1 << 8;
        const PERCENT_RANK = 1 << 9;
        const NTILE        = 1 << 10;
    }
}

bitflags! {
    /// GROUP BY extensions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AdvancedGroupingCapability: u32 {
        const CUBE          = 1 << 0;
        const ROLLUP        = 1 << 1;
        const GROUPING_SETS = 1 << 2;
    }
}

bitflags! {
    /// Common table expressions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CTECapability: u32 {
        const BASIC_CTE              = 1 << 0;
        const RECURSIVE_CTE          = 1 << 1;
        const COMPOUND_RECURSIVE_CTE = 1 << 2;
        const CTE_IN_DML             = 1 << 3;
        const MATERIALIZED_CTE       = 1 << 4;
    }
}

bitflags! {
    /// JSON functions and operators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct JSONCapability: u32 {
        const JSON_EXTRACT  = 1 << 0;
        const JSON_CONTAINS = 1 << 1;
        const JSON_EXISTS   = 1 << 2;
        const JSON_SET      = 1 << 3;
        const JSON_INSERT   = 1 << 4;
        const JSON_REPLACE  = 1 << 5;
        const JSON_REMOVE   = 1 << 6;
        const JSON_KEYS     = 1 << 7;
        const JSON_ARRAY    = 1 << 8;
        const JSON_OBJECT   = 1 << 9;
    }
}

bitflags! {
    /// RETURNING clause on INSERT / UPDATE / DELETE.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReturningCapability: u32 {
        const BASIC_RETURNING       = 1 << 0;
        const RETURNING_EXPRESSIONS = 1 << 1;
        const RETURNING_ALIASES     = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TransactionCapability: u32 {
        const SAVEPOINT              = 1 << 0;
        const ISOLATION_LEVELS       = 1 << 1;
        const READ_ONLY_TRANSACTIONS = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BulkOperationCapability: u32 {
        const MULTI_ROW_INSERT = 1 << 0;
        const BATCH_OPERATIONS = 1 << 1;
    }
}

bitflags! {
    /// Table constraints enforced by the backend.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConstraintCapability: u32 {
        const PRIMARY_KEY = 1 << 0;
        const FOREIGN_KEY = 1 << 1;
        const UNIQUE      = 1 << 2;
        const CHECK       = 1 << 3;
        const DEFERRABLE  = 1 << 4;
    }
}

bitflags! {
    /// Declarative table partitioning.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PartitioningCapability: u32 {
        const RANGE = 1 << 0;
        const LIST  = 1 << 1;
        const HASH  = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FullTextSearchCapability: u32 {
        const MATCH        = 1 << 0;
        const RANKING      = 1 << 1;
        const BOOLEAN_MODE = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpatialCapability: u32 {
        const GEOMETRY_TYPES    = 1 << 0;
        const SPATIAL_INDEX     = 1 << 1;
        const SPATIAL_FUNCTIONS = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SecurityCapability: u32 {
        const ROW_LEVEL_SECURITY = 1 << 0;
        const COLUMN_PRIVILEGES  = 1 << 1;
        const ROLES              = 1 << 2;
    }
}

/// Render a flag value as `NAME` or `A | B`; the empty value renders as `NONE`.
pub(crate) fn flag_names<F: bitflags::Flags>(value: &F) -> String {
    let names: Vec<&'static str> = value.iter_names().map(|(name, _)| name).collect();
    if names.is_empty() {
        "NONE".to_string()
    } else {
        names.join(" | ")
    }
}

/// Parse `NAME` or `A | B` into a flag value of `F`.
///
/// Returns the first unrecognized name on failure.
pub(crate) fn parse_flag_names<F: bitflags::Flags>(text: &str) -> std::result::Result<F, String> {
    let mut value = F::empty();
    for part in text.split('|') {
        let part = part.trim();
        match F::from_name(part) {
            Some(flag) => value.insert(flag),
            None => return Err(part.to_string()),
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerations_share_bit_values() {
        assert_eq!(WindowFunctionCapability::ROW_NUMBER.bits(), 1);
        assert_eq!(AdvancedGroupingCapability::CUBE.bits(), 1);
        assert_eq!(CTECapability::BASIC_CTE.bits(), 1);
        assert_eq!(SetOperationCapability::UNION.bits(), 1);
    }

    #[test]
    fn test_flag_names() {
        assert_eq!(flag_names(&CTECapability::RECURSIVE_CTE), "RECURSIVE_CTE");
        assert_eq!(
            flag_names(&(WindowFunctionCapability::RANK | WindowFunctionCapability::LAG)),
            "RANK | LAG"
        );
        assert_eq!(flag_names(&JSONCapability::empty()), "NONE");
        assert_eq!(flag_names(&CapabilityCategory::ADVANCED_GROUPING), "ADVANCED_GROUPING");
    }

    #[test]
    fn test_parse_flag_names() {
        let parsed: CTECapability = parse_flag_names("BASIC_CTE | RECURSIVE_CTE").unwrap();
        assert_eq!(parsed, CTECapability::BASIC_CTE | CTECapability::RECURSIVE_CTE);

        let err = parse_flag_names::<CTECapability>("BASIC_CTE | ROW_NUMBER").unwrap_err();
        assert_eq!(err, "ROW_NUMBER");
    }
}
