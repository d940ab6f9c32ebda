//! Core types for the metadata model
//!
//! This module provides the identity values shared by every other module:
//!
//! - [`ModuleVersionId`] — the `group:name:version` coordinates a component
//!   publishes under
//! - [`ComponentId`] — the identity of an in-workspace component, rendered in
//!   every diagnostic this crate produces
//! - [`MetadataError`] — the crate-wide error type (see [`error`])
//! - The fixed component status scheme ([`DEFAULT_STATUS_SCHEME`])
//!
//! Identity values are small, immutable, and cheap to clone; they are embedded
//! by value in configuration, variant, and artifact metadata rather than shared
//! behind references so that copied components carry no aliasing back to their
//! source.

pub mod error;

pub use error::MetadataError;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default component status when the build declares none.
pub const DEFAULT_STATUS: &str = "integration";

/// The fixed status scheme of local components, ordered least to most stable.
pub const DEFAULT_STATUS_SCHEME: [&str; 3] = ["integration", "milestone", "release"];

/// The `group:name:version` coordinates a component publishes under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleVersionId {
    group: String,
    name: String,
    version: String,
}

impl ModuleVersionId {
    /// Create coordinates from group, name, and version.
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// The group (organisation) part.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The module name part.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version part. Versions are opaque strings to this model; constraint
    /// interpretation happens in the resolver proper.
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// Identity of an in-workspace component.
///
/// The display name (for example `project :core`) is what diagnostics and
/// missing-artifact placeholders render. Two component ids are equal iff their
/// display names are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComponentId {
    display_name: String,
}

impl ComponentId {
    /// Create a component id from its display name.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    /// The human-readable identity of this component.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_version_id_display() {
        let id = ModuleVersionId::new("org.mortar", "core", "1.4.0");
        assert_eq!(id.to_string(), "org.mortar:core:1.4.0");
    }

    #[test]
    fn test_component_id_equality_follows_display_name() {
        let a = ComponentId::new("project :core");
        let b = ComponentId::new("project :core");
        let c = ComponentId::new("project :app");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_status_scheme_order() {
        assert_eq!(DEFAULT_STATUS_SCHEME, ["integration", "milestone", "release"]);
        assert_eq!(DEFAULT_STATUS, DEFAULT_STATUS_SCHEME[0]);
    }
}
