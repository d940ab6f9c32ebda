//! Capability identities provided by variants
//!
//! A capability is a `(group, name, version)` identity a variant provides;
//! the graph resolver uses capability ids to detect conflicts between
//! variants. Two forms exist:
//!
//! - [`Capability`] — a deeply immutable snapshot of the identity.
//! - [`ShadowedCapability`] — a capability derived from another by appending a
//!   suffix to its name (and id) while keeping group and version. Shadowing is
//!   how auxiliary variants (test fixtures and the like) publish an identity
//!   derived from their owner's without colliding with it.
//!
//! Constructing a shadow always normalizes the wrapped value to an immutable
//! snapshot first, so a shadow can never observe its base changing underneath
//! it. Shadowing an existing shadow reuses its (non-shadow) base and
//! concatenates the appendixes: however deep the nesting,
//! [`ShadowedCapability::shadowed_capability`] yields the same stable base.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A live capability declaration, as exposed by the build DSL.
///
/// Declarations may be backed by mutable build-script state; the metadata
/// model never stores one directly, it snapshots them into [`Capability`]
/// values via [`Capability::snapshot_of`].
pub trait CapabilityDescription {
    /// The group of the capability.
    fn group(&self) -> String;
    /// The name of the capability.
    fn name(&self) -> String;
    /// The version of the capability.
    fn version(&self) -> String;
}

/// A deeply immutable capability identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capability {
    group: String,
    name: String,
    version: String,
}

impl Capability {
    /// Create a capability from its parts.
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

    /// Snapshot a live declaration into an immutable value.
    pub fn snapshot_of(description: &dyn CapabilityDescription) -> Self {
        Self {
            group: description.group(),
            name: description.name(),
            version: description.version(),
        }
    }

    /// The group of the capability.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The name of the capability.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version of the capability.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// The conflict-detection identity, `group:name`.
    ///
    /// Always derived by composition, never cached, so it cannot diverge from
    /// the parts.
    pub fn capability_id(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.name, self.version)
    }
}

/// A capability shadowed by appending a suffix to another capability's name.
///
/// Group and version pass through; name and id gain the appendix. The wrapped
/// base is always a plain immutable [`Capability`], so the shadow chain stays
/// flat no matter how often a shadow is re-shadowed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadowedCapability {
    base: Capability,
    appendix: String,
}

impl ShadowedCapability {
    /// The suffix this shadow appends to its base's name and id.
    pub fn appendix(&self) -> &str {
        &self.appendix
    }

    /// The stable, non-shadow base capability.
    pub fn shadowed_capability(&self) -> &Capability {
        &self.base
    }

    /// The group of the capability.
    pub fn group(&self) -> &str {
        self.base.group()
    }

    /// The shadowed name, `base name + appendix`.
    pub fn name(&self) -> String {
        format!("{}{}", self.base.name(), self.appendix)
    }

    /// The version of the capability.
    pub fn version(&self) -> &str {
        self.base.version()
    }

    /// The shadowed conflict-detection identity, `base id + appendix`.
    pub fn capability_id(&self) -> String {
        format!("{}{}", self.base.capability_id(), self.appendix)
    }
}

/// Either form a variant's capability set may carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilitySpec {
    /// A plain immutable capability.
    Plain(Capability),
    /// A shadowed capability.
    Shadowed(ShadowedCapability),
}

impl CapabilitySpec {
    /// Shadow this capability with `appendix`.
    ///
    /// A plain capability becomes the shadow's base as-is; shadowing a shadow
    /// reuses its base and concatenates the appendixes, never re-snapshotting
    /// an already-immutable value.
    pub fn shadow(&self, appendix: impl Into<String>) -> ShadowedCapability {
        let appendix = appendix.into();
        match self {
            CapabilitySpec::Plain(base) => ShadowedCapability {
                base: base.clone(),
                appendix,
            },
            CapabilitySpec::Shadowed(shadow) => ShadowedCapability {
                base: shadow.base.clone(),
                appendix: format!("{}{}", shadow.appendix, appendix),
            },
        }
    }

    /// The group of the capability.
    pub fn group(&self) -> &str {
        match self {
            CapabilitySpec::Plain(c) => c.group(),
            CapabilitySpec::Shadowed(s) => s.group(),
        }
    }

    /// The (possibly shadowed) name of the capability.
    pub fn name(&self) -> String {
        match self {
            CapabilitySpec::Plain(c) => c.name().to_string(),
            CapabilitySpec::Shadowed(s) => s.name(),
        }
    }

    /// The version of the capability.
    pub fn version(&self) -> &str {
        match self {
            CapabilitySpec::Plain(c) => c.version(),
            CapabilitySpec::Shadowed(s) => s.version(),
        }
    }

    /// The (possibly shadowed) conflict-detection identity.
    pub fn capability_id(&self) -> String {
        match self {
            CapabilitySpec::Plain(c) => c.capability_id(),
            CapabilitySpec::Shadowed(s) => s.capability_id(),
        }
    }
}

impl From<Capability> for CapabilitySpec {
    fn from(capability: Capability) -> Self {
        CapabilitySpec::Plain(capability)
    }
}

impl From<ShadowedCapability> for CapabilitySpec {
    fn from(shadow: ShadowedCapability) -> Self {
        CapabilitySpec::Shadowed(shadow)
    }
}

/// Deduplicate capabilities by id, keeping first-seen order.
pub(crate) fn dedup_by_id(capabilities: Vec<CapabilitySpec>) -> Vec<CapabilitySpec> {
    let mut seen = std::collections::HashSet::new();
    let mut result = Vec::with_capacity(capabilities.len());
    for capability in capabilities {
        if seen.insert(capability.capability_id()) {
            result.push(capability);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_id_is_derived() {
        let cap = Capability::new("org.mortar", "core", "1.0");
        assert_eq!(cap.capability_id(), "org.mortar:core");
        assert_eq!(cap.to_string(), "org.mortar:core:1.0");
    }

    #[test]
    fn test_shadow_appends_to_name_and_id_only() {
        let cap = CapabilitySpec::from(Capability::new("org.mortar", "core", "1.0"));
        let shadow = cap.shadow("-test-fixtures");

        assert_eq!(shadow.group(), "org.mortar");
        assert_eq!(shadow.version(), "1.0");
        assert_eq!(shadow.name(), "core-test-fixtures");
        assert_eq!(shadow.capability_id(), "org.mortar:core-test-fixtures");
    }

    #[test]
    fn test_shadowing_a_shadow_concatenates_appendixes() {
        let cap = Capability::new("org.mortar", "core", "1.0");
        let once = CapabilitySpec::from(cap.clone()).shadow("x");
        let twice = CapabilitySpec::from(once).shadow("y");

        assert_eq!(twice.name(), "corexy");
        assert_eq!(twice.capability_id(), "org.mortar:corexy");
        // The base stays the original non-shadow snapshot at any depth.
        assert_eq!(twice.shadowed_capability(), &cap);
    }

    #[test]
    fn test_snapshot_of_live_declaration() {
        struct Live;
        impl CapabilityDescription for Live {
            fn group(&self) -> String {
                "g".to_string()
            }
            fn name(&self) -> String {
                "n".to_string()
            }
            fn version(&self) -> String {
                "2".to_string()
            }
        }

        let snapshot = Capability::snapshot_of(&Live);
        assert_eq!(snapshot, Capability::new("g", "n", "2"));
    }

    #[test]
    fn test_dedup_by_id_keeps_first_occurrence() {
        let first = CapabilitySpec::from(Capability::new("g", "a", "1"));
        let duplicate = CapabilitySpec::from(Capability::new("g", "a", "2"));
        let other = CapabilitySpec::from(Capability::new("g", "b", "1"));

        let deduped = dedup_by_id(vec![first.clone(), duplicate, other.clone()]);
        assert_eq!(deduped, vec![first, other]);
    }
}
