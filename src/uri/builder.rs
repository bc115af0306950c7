//! Resource Path Builder
//!
//! Turns either the legacy flat addressing (`array_id`, `category`,
//! `resource_type`, `resource_name`) or the hierarchical addressing
//! (`category`, `resource_level`, ... `object_type_id`) into a resource path.
//! The convention is decided once, in [`ResourceArgs::resolve`], and the rest
//! of the builder works on the resolved [`ResourceAddress`].

use crate::config::{DEFAULT_API_VERSION, DEFAULT_VERSION_EXEMPT};
use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Resource level implied by the legacy convention
pub const LEGACY_RESOURCE_LEVEL: &str = "symmetrix";

// =============================================================================
// Caller Arguments
// =============================================================================

/// Addressing arguments as supplied by a caller
///
/// Empty strings count as absent. Legacy identifiers (`array_id`,
/// `resource_name`) and hierarchical identifiers (`resource_level` and
/// everything after it) must not be mixed in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceArgs {
    pub array_id: Option<String>,
    pub category: Option<String>,
    pub resource_type: Option<String>,
    pub resource_name: Option<String>,
    pub resource_level: Option<String>,
    pub resource_level_id: Option<String>,
    pub resource_type_id: Option<String>,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub object_type: Option<String>,
    pub object_type_id: Option<String>,
    pub version: Option<String>,
    pub no_version: bool,
}

impl ResourceArgs {
    /// Legacy form: `/<version>/<category>/symmetrix/<array>/<resource_type>`
    pub fn legacy(
        array_id: impl Into<String>,
        category: impl Into<String>,
        resource_type: impl Into<String>,
    ) -> Self {
        Self {
            array_id: Some(array_id.into()),
            category: Some(category.into()),
            resource_type: Some(resource_type.into()),
            ..Default::default()
        }
    }

    /// Hierarchical form: `/<version>/<category>/<resource_level>/...`
    pub fn hierarchical(category: impl Into<String>, resource_level: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            resource_level: Some(resource_level.into()),
            ..Default::default()
        }
    }

    pub fn resource_name(mut self, name: impl Into<String>) -> Self {
        self.resource_name = Some(name.into());
        self
    }

    pub fn resource_level(mut self, resource_level: impl Into<String>) -> Self {
        self.resource_level = Some(resource_level.into());
        self
    }

    pub fn resource_level_id(mut self, id: impl Into<String>) -> Self {
        self.resource_level_id = Some(id.into());
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    pub fn resource_type_id(mut self, id: impl Into<String>) -> Self {
        self.resource_type_id = Some(id.into());
        self
    }

    pub fn resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn resource_id(mut self, id: impl Into<String>) -> Self {
        self.resource_id = Some(id.into());
        self
    }

    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn object_type_id(mut self, id: impl Into<String>) -> Self {
        self.object_type_id = Some(id.into());
        self
    }

    /// Pin an explicit version; wins over `no_version`
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Omit the version segment unless an explicit version is set
    pub fn no_version(mut self) -> Self {
        self.no_version = true;
        self
    }

    fn has_legacy_identifiers(&self) -> bool {
        present(&self.array_id).is_some() || present(&self.resource_name).is_some()
    }

    fn hierarchical_identifiers(&self) -> Vec<&'static str> {
        [
            ("resource_level", &self.resource_level),
            ("resource_level_id", &self.resource_level_id),
            ("resource_type_id", &self.resource_type_id),
            ("resource", &self.resource),
            ("resource_id", &self.resource_id),
            ("object_type", &self.object_type),
            ("object_type_id", &self.object_type_id),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_some())
        .map(|(name, _)| name)
        .collect()
    }

    /// Every supplied segment value, by argument name
    fn segment_values(&self) -> [(&'static str, &Option<String>); 12] {
        [
            ("array_id", &self.array_id),
            ("category", &self.category),
            ("resource_type", &self.resource_type),
            ("resource_name", &self.resource_name),
            ("resource_level", &self.resource_level),
            ("resource_level_id", &self.resource_level_id),
            ("resource_type_id", &self.resource_type_id),
            ("resource", &self.resource),
            ("resource_id", &self.resource_id),
            ("object_type", &self.object_type),
            ("object_type_id", &self.object_type_id),
            ("version", &self.version),
        ]
    }

    /// Segment values must be single path segments
    fn check_segments(&self) -> Result<()> {
        for (name, value) in self.segment_values() {
            if let Some(value) = present(value) {
                if value.contains('/') {
                    return Err(Error::InvalidInput(format!(
                        "{} {:?} must not contain '/'",
                        name, value
                    )));
                }
            }
        }
        Ok(())
    }

    /// Decide the calling convention and produce a typed address
    pub fn resolve(&self) -> Result<ResourceAddress> {
        self.check_segments()?;
        let hierarchical = self.hierarchical_identifiers();

        match (self.has_legacy_identifiers(), hierarchical.is_empty()) {
            (true, false) => Err(Error::InvalidInput(format!(
                "legacy addressing (array_id/resource_name) cannot be combined with \
                 hierarchical addressing ({})",
                hierarchical.join(", ")
            ))),
            (false, false) => {
                let category = required(&self.category, "category")?;
                let resource_level = required(&self.resource_level, "resource_level")?;
                Ok(ResourceAddress::Hierarchical(HierarchicalAddress {
                    category,
                    resource_level,
                    resource_level_id: owned(&self.resource_level_id),
                    resource_type: owned(&self.resource_type),
                    resource_type_id: owned(&self.resource_type_id),
                    resource: owned(&self.resource),
                    resource_id: owned(&self.resource_id),
                    object_type: owned(&self.object_type),
                    object_type_id: owned(&self.object_type_id),
                }))
            }
            (true, true) => Ok(ResourceAddress::Legacy(LegacyAddress {
                array_id: required(&self.array_id, "array_id")?,
                category: required(&self.category, "category")?,
                resource_type: required(&self.resource_type, "resource_type")?,
                resource_name: owned(&self.resource_name),
            })),
            (false, true) => Err(Error::InvalidInput(
                "no addressing supplied: need category and resource_level, \
                 or array_id, category and resource_type"
                    .into(),
            )),
        }
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn owned(value: &Option<String>) -> Option<String> {
    present(value).map(str::to_string)
}

fn required(value: &Option<String>, name: &str) -> Result<String> {
    owned(value).ok_or_else(|| Error::InvalidInput(format!("{} is required", name)))
}

// =============================================================================
// Resolved Addresses
// =============================================================================

/// Flat legacy address under the `symmetrix` resource level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyAddress {
    pub array_id: String,
    pub category: String,
    pub resource_type: String,
    pub resource_name: Option<String>,
}

/// Multi-level address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchicalAddress {
    pub category: String,
    pub resource_level: String,
    pub resource_level_id: Option<String>,
    pub resource_type: Option<String>,
    pub resource_type_id: Option<String>,
    pub resource: Option<String>,
    pub resource_id: Option<String>,
    pub object_type: Option<String>,
    pub object_type_id: Option<String>,
}

/// An address in exactly one of the two conventions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceAddress {
    Legacy(LegacyAddress),
    Hierarchical(HierarchicalAddress),
}

impl ResourceAddress {
    /// Top-level API category
    pub fn category(&self) -> &str {
        match self {
            ResourceAddress::Legacy(a) => &a.category,
            ResourceAddress::Hierarchical(a) => &a.category,
        }
    }

    /// Path segments after the version, in wire order
    pub fn segments(&self) -> Vec<&str> {
        match self {
            ResourceAddress::Legacy(a) => {
                let mut segments = vec![
                    a.category.as_str(),
                    LEGACY_RESOURCE_LEVEL,
                    a.array_id.as_str(),
                    a.resource_type.as_str(),
                ];
                segments.extend(a.resource_name.as_deref());
                segments
            }
            ResourceAddress::Hierarchical(a) => {
                let mut segments = vec![a.category.as_str(), a.resource_level.as_str()];
                segments.extend(
                    [
                        &a.resource_level_id,
                        &a.resource_type,
                        &a.resource_type_id,
                        &a.resource,
                        &a.resource_id,
                        &a.object_type,
                        &a.object_type_id,
                    ]
                    .into_iter()
                    .filter_map(|s| s.as_deref()),
                );
                segments
            }
        }
    }
}

/// Fully resolved path: optional version plus an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourcePath {
    pub version: Option<String>,
    pub address: ResourceAddress,
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(version) = &self.version {
            write!(f, "/{}", version)?;
        }
        for segment in self.address.segments() {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Builds resource paths with a version-prefix policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriBuilder {
    default_version: String,
    version_exempt: BTreeSet<String>,
}

impl Default for UriBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_API_VERSION)
            .with_version_exempt(DEFAULT_VERSION_EXEMPT.iter().map(|c| c.to_string()))
    }
}

impl UriBuilder {
    /// Create a builder with no version-exempt categories
    pub fn new(default_version: impl Into<String>) -> Self {
        Self {
            default_version: default_version.into(),
            version_exempt: BTreeSet::new(),
        }
    }

    /// Replace the set of categories that never carry a version
    pub fn with_version_exempt(mut self, categories: impl IntoIterator<Item = String>) -> Self {
        self.version_exempt = categories.into_iter().collect();
        self
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    pub fn is_version_exempt(&self, category: &str) -> bool {
        self.version_exempt.contains(category)
    }

    /// Resolve caller arguments into a typed path
    pub fn resolve(&self, args: &ResourceArgs) -> Result<ResourcePath> {
        let address = args.resolve()?;
        let version = match present(&args.version) {
            Some(explicit) => Some(explicit.to_string()),
            None if args.no_version || self.is_version_exempt(address.category()) => None,
            None => Some(self.default_version.clone()),
        };
        Ok(ResourcePath { version, address })
    }

    /// Build the path string for caller arguments
    pub fn build(&self, args: &ResourceArgs) -> Result<String> {
        Ok(self.resolve(args)?.to_string())
    }
}
