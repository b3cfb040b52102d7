//! Capability Model
//!
//! This module describes what a database backend can do.
//!
//! # Two-Level Lattice
//! - [`CapabilityCategory`] names the feature domains a backend claims
//! - one bit set per category records the specific features inside it
//!
//! Specific values from different enumerations reuse the same bit positions,
//! so a specific value only leaves this module wrapped in a
//! [`SpecificCapability`], which carries its category with it.
//!
//! # Mutation
//! [`DatabaseCapabilities`] is filled by a provider through the `add_*`
//! methods, which keep the category set in step with the per-domain sets.
//! After population it is shared read-only (usually behind an `Arc`).

use serde::Serialize;
use std::fmt;

use crate::error::{Result, SuiteError};

mod flags;

pub use flags::{
    AdvancedGroupingCapability, BulkOperationCapability, CTECapability, CapabilityCategory,
    ConstraintCapability, FullTextSearchCapability, JSONCapability, PartitioningCapability,
    ReturningCapability, SecurityCapability, SetOperationCapability, SpatialCapability,
    TransactionCapability, WindowFunctionCapability,
};

pub(crate) use flags::flag_names;
use flags::parse_flag_names;

/// Serializable snapshot of a [`DatabaseCapabilities`]
///
/// Names appear in declaration order, so two reports of equal descriptors
/// serialize identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityReport {
    /// Supported category names
    pub categories: Vec<&'static str>,

    /// Supported specific capabilities, one entry per non-empty domain
    pub capabilities: Vec<DomainReport>,
}

/// Supported flags of one domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainReport {
    /// Owning category name
    pub category: &'static str,

    /// Supported flag names
    pub supported: Vec<&'static str>,
}

fn names_of<F: bitflags::Flags>(value: &F) -> Vec<&'static str> {
    value.iter_names().map(|(name, _)| name).collect()
}

/// Parse a single category name such as `"WINDOW_FUNCTIONS"`
pub fn parse_category(name: &str) -> Result<CapabilityCategory> {
    CapabilityCategory::from_name(name.trim())
        .ok_or_else(|| SuiteError::unknown_capability("CapabilityCategory", name.trim()))
}

macro_rules! capability_domains {
    ($(
        $variant:ident($ty:ty) => $category:ident, $field:ident, $supports:ident, $add:ident;
    )*) => {
        /// Capability descriptor of one backend configuration
        ///
        /// Holds the category set plus one bit set per category. All fields
        /// start empty and only grow through the `add_*` methods.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct DatabaseCapabilities {
            categories: CapabilityCategory,
            $( $field: $ty, )*
        }

        impl Default for DatabaseCapabilities {
            fn default() -> Self {
                Self {
                    categories: CapabilityCategory::empty(),
                    $( $field: <$ty>::empty(), )*
                }
            }
        }

        impl DatabaseCapabilities {
            $(
                #[doc = concat!(
                    "Check `", stringify!($ty), "` support. ",
                    "True iff every bit of `value` is recorded; the empty value is always supported."
                )]
                #[must_use]
                pub fn $supports(&self, value: $ty) -> bool {
                    self.$field.contains(value)
                }

                #[doc = concat!(
                    "Record one or more `", stringify!($ty), "` values and the `",
                    stringify!($category), "` category. Accepts a single value or a sequence."
                )]
                pub fn $add(&mut self, values: impl IntoIterator<Item = $ty>) -> &mut Self {
                    let added = values.into_iter().fold(<$ty>::empty(), |acc, value| acc | value);
                    if !added.is_empty() {
                        self.$field |= added;
                        self.categories |= CapabilityCategory::$category;
                    }
                    self
                }
            )*

            /// Check a category-tagged capability against its own domain
            #[must_use]
            pub fn supports(&self, capability: &SpecificCapability) -> bool {
                match capability {
                    $( SpecificCapability::$variant(value) => self.$supports(*value), )*
                }
            }

            /// Check an untyped bit pattern in the scope of `category`
            ///
            /// Bits that the category's enumeration does not define are an
            /// `UnknownCapability` error rather than a plain `false`.
            pub fn supports_raw(&self, category: CapabilityCategory, bits: u32) -> Result<bool> {
                $(
                    if category == CapabilityCategory::$category {
                        let value = <$ty>::from_bits(bits).ok_or_else(|| {
                            SuiteError::unknown_capability(flag_names(&category), format!("{bits:#x}"))
                        })?;
                        return Ok(self.$supports(value));
                    }
                )*
                Err(SuiteError::invalid_input(format!(
                    "'{}' is not a single capability category",
                    flag_names(&category)
                )))
            }

            /// Build the serializable snapshot
            #[must_use]
            pub fn report(&self) -> CapabilityReport {
                let mut capabilities = Vec::new();
                $(
                    if !self.$field.is_empty() {
                        capabilities.push(DomainReport {
                            category: stringify!($category),
                            supported: names_of(&self.$field),
                        });
                    }
                )*
                CapabilityReport { categories: names_of(&self.categories), capabilities }
            }
        }

        /// A specific capability paired with the category that owns it
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum SpecificCapability {
            $( $variant($ty), )*
        }

        impl SpecificCapability {
            /// The category whose enumeration this value belongs to
            #[must_use]
            pub const fn category(&self) -> CapabilityCategory {
                match self {
                    $( Self::$variant(_) => CapabilityCategory::$category, )*
                }
            }

            /// True for the empty (`NONE`) value of any domain
            #[must_use]
            pub fn is_empty(&self) -> bool {
                match self {
                    $( Self::$variant(value) => value.is_empty(), )*
                }
            }

            /// Flag name(s) of the value, e.g. `RECURSIVE_CTE` or `RANK | LAG`
            #[must_use]
            pub fn name(&self) -> String {
                match self {
                    $( Self::$variant(value) => flag_names(value), )*
                }
            }

            /// Parse `NAME` or `A | B` in the enumeration owned by `category`
            pub fn from_names(category: CapabilityCategory, text: &str) -> Result<Self> {
                $(
                    if category == CapabilityCategory::$category {
                        return parse_flag_names::<$ty>(text)
                            .map(Self::$variant)
                            .map_err(|name| SuiteError::unknown_capability(flag_names(&category), name));
                    }
                )*
                Err(SuiteError::invalid_requirement(format!(
                    "'{}' is not a single capability category",
                    flag_names(&category)
                )))
            }
        }

        $(
            impl From<$ty> for SpecificCapability {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

capability_domains! {
    SetOperation(SetOperationCapability) => SET_OPERATIONS, set_operations, supports_set_operation, add_set_operation;
    WindowFunction(WindowFunctionCapability) => WINDOW_FUNCTIONS, window_functions, supports_window_function, add_window_function;
    AdvancedGrouping(AdvancedGroupingCapability) => ADVANCED_GROUPING, advanced_grouping, supports_advanced_grouping, add_advanced_grouping;
    Cte(CTECapability) => CTE, cte, supports_cte, add_cte;
    Json(JSONCapability) => JSON_OPERATIONS, json, supports_json, add_json;
    Returning(ReturningCapability) => RETURNING_CLAUSE, returning, supports_returning, add_returning;
    Transaction(TransactionCapability) => TRANSACTION_FEATURES, transactions, supports_transaction, add_transaction;
    BulkOperation(BulkOperationCapability) => BULK_OPERATIONS, bulk_operations, supports_bulk_operation, add_bulk_operation;
    Constraint(ConstraintCapability) => CONSTRAINTS, constraints, supports_constraint, add_constraint;
    Partitioning(PartitioningCapability) => PARTITIONING, partitioning, supports_partitioning, add_partitioning;
    FullTextSearch(FullTextSearchCapability) => FULL_TEXT_SEARCH, full_text_search, supports_full_text_search, add_full_text_search;
    Spatial(SpatialCapability) => SPATIAL_OPERATIONS, spatial, supports_spatial, add_spatial;
    Security(SecurityCapability) => SECURITY_FEATURES, security, supports_security, add_security;
}

impl DatabaseCapabilities {
    /// Create an empty descriptor (supports nothing)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All categories this backend claims
    #[must_use]
    pub const fn categories(&self) -> CapabilityCategory {
        self.categories
    }

    /// True iff every bit of `category` is in the category set
    #[must_use]
    pub fn supports_category(&self, category: CapabilityCategory) -> bool {
        self.categories.contains(category)
    }

    /// Mark a category as supported without recording specific capabilities
    pub fn add_category(&mut self, category: CapabilityCategory) -> &mut Self {
        self.categories |= category;
        self
    }
}

impl fmt::Display for SpecificCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", flag_names(&self.category()), self.name())
    }
}
