//! Attribute sets attached to configurations and variants
//!
//! Attributes are the typed key/value pairs variant-aware resolution matches
//! on (`category`, `usage`, and so on). This model stores them as an ordered,
//! immutable string map: attribute *schemas* (compatibility and
//! disambiguation rules) belong to the resolution engine, while this crate
//! only needs stable identity, emptiness checks, and a handful of well-known
//! names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Name of the category attribute, used to mark platform configurations.
pub const CATEGORY_ATTRIBUTE: &str = "category";

/// Category value marking an enforced platform.
///
/// Every aggregated dependency of a configuration carrying this category is
/// reported as forced; the defined list is left untouched.
pub const ENFORCED_PLATFORM: &str = "enforced-platform";

/// An immutable, ordered set of configuration or variant attributes.
///
/// Iteration and serialization order follow attribute names, so two equal sets
/// always render identically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImmutableAttributes {
    entries: BTreeMap<String, String>,
}

impl ImmutableAttributes {
    /// The empty attribute set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether this set carries no attributes.
    ///
    /// Consumable configurations with an empty set are invisible to
    /// variant-aware graph traversal.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of attributes in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Value of the named attribute, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns a new set with the named attribute added or replaced.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(name.into(), value.into());
        self
    }

    /// Iterate the attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the category attribute marks this set as an enforced platform.
    pub fn is_enforced_platform(&self) -> bool {
        self.get(CATEGORY_ATTRIBUTE) == Some(ENFORCED_PLATFORM)
    }
}

impl FromIterator<(String, String)> for ImmutableAttributes {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ImmutableAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        write!(f, "}}")
    }
}

/// The attribute schema a component resolves against.
///
/// The schema itself is owned and interpreted by the resolution engine; the
/// metadata model only transports it between a component and its copies. The
/// precedence list orders attribute names for disambiguation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesSchema {
    attribute_precedence: Vec<String>,
}

impl AttributesSchema {
    /// A schema with no declared precedence.
    pub fn new() -> Self {
        Self::default()
    }

    /// A schema with the given attribute-name precedence order.
    pub fn with_precedence<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute_precedence: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Attribute names in disambiguation-precedence order.
    pub fn attribute_precedence(&self) -> &[String] {
        &self.attribute_precedence
    }
}
