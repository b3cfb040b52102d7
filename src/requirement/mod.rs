//! Requirement Declarations
//!
//! Tests declare which capabilities they need as a [`RequirementMap`]:
//! an ordered list of `(category, [specific capability, ...])` entries.
//! Declaration is inert. Nothing is looked up until negotiation.
//!
//! # Validation
//! Maps are validated when they are built, so authoring mistakes surface
//! at collection time:
//! - the key must be exactly one category
//! - the capability list must not be empty and must not hold the empty
//!   (`NONE`) value (category-only requirements are rejected)
//! - every capability must belong to the key's category
//! - a category may appear only once per map
//!
//! # Registration
//! [`RequirementRegistry`] is the lookup table from test id to its
//! declaration, built once during collection. It can be written to and
//! read from a JSON manifest so that declaration and evaluation may run in
//! different processes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::capability::{flag_names, parse_category, CapabilityCategory, DatabaseCapabilities, SpecificCapability};
use crate::error::{Result, SuiteError};

/// One category entry of a requirement map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementEntry {
    category: CapabilityCategory,
    capabilities: Vec<SpecificCapability>,
}

impl RequirementEntry {
    /// The required category
    #[must_use]
    pub const fn category(&self) -> CapabilityCategory {
        self.category
    }

    /// The required specific capabilities, in declaration order
    #[must_use]
    pub fn capabilities(&self) -> &[SpecificCapability] {
        &self.capabilities
    }
}

/// Ordered, validated mapping from category to specific capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(into = "Vec<RawRequirementEntry>")]
pub struct RequirementMap {
    entries: Vec<RequirementEntry>,
}

impl RequirementMap {
    /// Create an empty map (always satisfiable)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, validating it against the entries already present
    pub fn insert(
        &mut self,
        category: CapabilityCategory,
        capabilities: Vec<SpecificCapability>,
    ) -> Result<()> {
        let category_name = flag_names(&category);

        if category.bits().count_ones() != 1 {
            return Err(SuiteError::invalid_requirement(format!(
                "requirement key '{category_name}' must name exactly one category"
            )));
        }

        if capabilities.is_empty() {
            return Err(SuiteError::invalid_requirement(format!(
                "category {category_name} lists no specific capabilities"
            )));
        }

        if capabilities.iter().any(SpecificCapability::is_empty) {
            return Err(SuiteError::invalid_requirement(format!(
                "category {category_name} lists an empty capability value"
            )));
        }

        if let Some(stray) = capabilities.iter().find(|cap| cap.category() != category) {
            return Err(SuiteError::invalid_requirement(format!(
                "{stray} listed under category {category_name}"
            )));
        }

        if self.entries.iter().any(|entry| entry.category == category) {
            return Err(SuiteError::invalid_requirement(format!(
                "category {category_name} declared more than once"
            )));
        }

        self.entries.push(RequirementEntry { category, capabilities });
        Ok(())
    }

    /// Builder form of [`RequirementMap::insert`]
    pub fn require<C: Into<SpecificCapability>>(
        mut self,
        category: CapabilityCategory,
        capabilities: impl IntoIterator<Item = C>,
    ) -> Result<Self> {
        self.insert(category, capabilities.into_iter().map(Into::into).collect())?;
        Ok(self)
    }

    /// Entries in declaration order
    #[must_use]
    pub fn entries(&self) -> &[RequirementEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse the textual form (as found in manifests)
    ///
    /// Unknown category or capability names are `UnknownCapability`;
    /// structural problems are `InvalidRequirement`.
    pub fn from_raw(raw: Vec<RawRequirementEntry>) -> Result<Self> {
        let mut map = Self::new();
        for entry in raw {
            let category = parse_category(&entry.category)?;
            let capabilities = entry
                .capabilities
                .iter()
                .map(|name| SpecificCapability::from_names(category, name))
                .collect::<Result<Vec<_>>>()?;
            map.insert(category, capabilities)?;
        }
        Ok(map)
    }

    /// Textual form of the map
    #[must_use]
    pub fn to_raw(&self) -> Vec<RawRequirementEntry> {
        self.entries
            .iter()
            .map(|entry| RawRequirementEntry {
                category: flag_names(&entry.category),
                capabilities: entry.capabilities.iter().map(SpecificCapability::name).collect(),
            })
            .collect()
    }
}

impl From<RequirementMap> for Vec<RawRequirementEntry> {
    fn from(map: RequirementMap) -> Self {
        map.to_raw()
    }
}

/// Textual requirement entry: `{"category": "CTE", "capabilities": ["BASIC_CTE"]}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRequirementEntry {
    /// Category name
    pub category: String,

    /// Specific capability names (`A | B` allowed)
    pub capabilities: Vec<String>,
}

/// The declaration attached to one test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestRequirements {
    /// Capabilities the test cannot run without
    pub required: RequirementMap,

    /// Capabilities the test can use when present (never causes a skip)
    pub optional: RequirementMap,
}

impl TestRequirements {
    /// Declare required and optional capabilities
    #[must_use]
    pub const fn new(required: RequirementMap, optional: RequirementMap) -> Self {
        Self { required, optional }
    }

    /// Optional capabilities the backend actually has, in declaration order
    ///
    /// Intended for fallback logic inside a test body.
    #[must_use]
    pub fn supported_optional(&self, caps: &DatabaseCapabilities) -> Vec<SpecificCapability> {
        self.optional
            .entries()
            .iter()
            .filter(|entry| caps.supports_category(entry.category()))
            .flat_map(|entry| entry.capabilities().iter().copied())
            .filter(|cap| caps.supports(cap))
            .collect()
    }
}

/// Lookup table from test id to its declaration
///
/// Iteration is ordered by test id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementRegistry {
    tests: BTreeMap<String, TestRequirements>,
}

impl RequirementRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a declaration to a test id
    ///
    /// A test id can only be declared once.
    pub fn declare(
        &mut self,
        test_id: impl Into<String>,
        required: RequirementMap,
        optional: RequirementMap,
    ) -> Result<()> {
        let test_id = test_id.into();
        if test_id.trim().is_empty() {
            return Err(SuiteError::invalid_requirement("test id cannot be empty"));
        }
        if self.tests.contains_key(&test_id) {
            return Err(SuiteError::invalid_requirement(format!(
                "test '{test_id}' declared more than once"
            )));
        }
        self.tests.insert(test_id, TestRequirements::new(required, optional));
        Ok(())
    }

    /// Declaration of one test, if any
    #[must_use]
    pub fn get(&self, test_id: &str) -> Option<&TestRequirements> {
        self.tests.get(test_id)
    }

    /// All declarations, ordered by test id
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestRequirements)> {
        self.tests.iter().map(|(id, reqs)| (id.as_str(), reqs))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tests.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Textual form of the registry
    #[must_use]
    pub fn to_manifest(&self) -> RequirementManifest {
        RequirementManifest {
            tests: self
                .iter()
                .map(|(id, reqs)| ManifestTest {
                    id: id.to_string(),
                    required: reqs.required.to_raw(),
                    optional: reqs.optional.to_raw(),
                })
                .collect(),
        }
    }
}

/// Requirement manifest file
///
/// ```json
/// {"tests": [{"id": "query::cte::recursive",
///             "required": [{"category": "CTE", "capabilities": ["RECURSIVE_CTE"]}],
///             "optional": []}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementManifest {
    pub tests: Vec<ManifestTest>,
}

/// One test in a manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestTest {
    pub id: String,

    #[serde(default)]
    pub required: Vec<RawRequirementEntry>,

    #[serde(default)]
    pub optional: Vec<RawRequirementEntry>,
}

impl RequirementManifest {
    /// Parse a manifest from JSON text
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).map_err(|e| {
            SuiteError::invalid_requirement(format!("Invalid requirement manifest format: {e}"))
        })
    }

    /// Read a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SuiteError::config_error(format!("Could not read requirement manifest: {e}"))
        })?;
        Self::from_json(&contents)
    }

    /// Write the manifest as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| {
            SuiteError::config_error(format!("Could not serialize requirement manifest: {e}"))
        })?;
        fs::write(path, contents).map_err(|e| {
            SuiteError::config_error(format!("Could not write requirement manifest: {e}"))
        })
    }

    /// Validate every entry and build the lookup table
    pub fn into_registry(self) -> Result<RequirementRegistry> {
        let mut registry = RequirementRegistry::new();
        for test in self.tests {
            let required = RequirementMap::from_raw(test.required)?;
            let optional = RequirementMap::from_raw(test.optional)?;
            registry.declare(test.id, required, optional)?;
        }
        Ok(registry)
    }
}
