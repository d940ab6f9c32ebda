//! Raw configuration declarations, as consumed from the build model
//!
//! Everything in this module is an *input* seam: the build DSL owns the live
//! configuration objects, and this crate reads them exactly once per
//! realization through the [`ConfigurationSource`] trait. Parsing of
//! user-supplied dependency notations into these declaration values happens
//! upstream and is out of scope here.
//!
//! Dependency declarations form a closed partition
//! ([`DependencyDeclaration`]): module-like declarations are converted through
//! the external descriptor factory, file-collection-like declarations are
//! wrapped directly, and any other kind fails the configuration's metadata
//! build fast, naming the declaration. Variant structure is communicated
//! through the three-case [`VariantVisit`] protocol.

use crate::artifact::ArtifactSource;
use crate::attributes::ImmutableAttributes;
use crate::capability::CapabilitySpec;
use crate::core::ComponentId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// A declared dependency on another module.
///
/// The version is the raw requested notation; constraint interpretation
/// happens in the resolver proper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleDependencyDeclaration {
    /// Group of the target module.
    pub group: String,
    /// Name of the target module.
    pub module: String,
    /// Requested version notation, if any.
    pub version: Option<String>,
    /// Whether transitive dependencies of the target are wanted.
    pub transitive: bool,
    /// Explicit target configuration, if the declaration names one.
    pub target_configuration: Option<String>,
}

impl ModuleDependencyDeclaration {
    /// A transitive dependency on `group:module` at `version`.
    pub fn new(
        group: impl Into<String>,
        module: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            module: module.into(),
            version: Some(version.into()),
            transitive: true,
            target_configuration: None,
        }
    }
}

impl fmt::Display for ModuleDependencyDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.module)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// A declared dependency constraint: a version preference that applies only
/// if the target module is pulled into the graph by a real dependency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyConstraintDeclaration {
    /// Group of the constrained module.
    pub group: String,
    /// Name of the constrained module.
    pub module: String,
    /// Constrained version notation, if any.
    pub version: Option<String>,
    /// Human-readable reason the constraint was declared.
    pub reason: Option<String>,
}

impl fmt::Display for DependencyConstraintDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constraint {}:{}", self.group, self.module)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// An opaque file-collection dependency.
///
/// File collections resolve to plain files on the consuming side without any
/// module identity; their *instance* identity is what hierarchy aggregation
/// deduplicates on.
pub trait FileCollectionSource: Send + Sync + fmt::Debug {
    /// Display name for diagnostics.
    fn display_name(&self) -> String;

    /// The component producing the files, when the collection is backed by
    /// one.
    fn target_component_id(&self) -> Option<ComponentId>;

    /// The files in the collection.
    fn files(&self) -> Vec<PathBuf>;
}

/// One raw dependency declaration of a configuration.
///
/// This is a closed partition: the builder converts `Module` through the
/// descriptor factory, wraps `File` directly, and fails fast on `Other`,
/// naming the declaration.
#[derive(Debug, Clone)]
pub enum DependencyDeclaration {
    /// A module dependency.
    Module(ModuleDependencyDeclaration),
    /// A file-collection dependency.
    File(Arc<dyn FileCollectionSource>),
    /// A declaration kind this metadata model cannot represent; the payload
    /// is its display name, used verbatim in the failure.
    Other(String),
}

/// A declared exclude rule, raw form.
///
/// `None` parts are wildcards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExcludeRule {
    /// Excluded group, or any group when `None`.
    pub group: Option<String>,
    /// Excluded module, or any module when `None`.
    pub module: Option<String>,
}

impl fmt::Display for ExcludeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.group.as_deref().unwrap_or("*"),
            self.module.as_deref().unwrap_or("*")
        )
    }
}

/// One step of the variant-visiting protocol.
///
/// Sources report their variant structure as a sequence of these three cases;
/// the builder dispatches by matching, keeping the set closed.
#[derive(Debug, Clone)]
pub enum VariantVisit {
    /// Artifacts published by the configuration itself, outside any named
    /// variant.
    Artifacts(Vec<Arc<dyn ArtifactSource>>),
    /// The configuration itself described as a variant.
    OwnVariant {
        /// Display name for diagnostics.
        display_name: String,
        /// The variant's attributes.
        attributes: ImmutableAttributes,
        /// Capabilities the variant provides.
        capabilities: Vec<CapabilitySpec>,
        /// Artifacts the variant publishes.
        artifacts: Vec<Arc<dyn ArtifactSource>>,
    },
    /// A named variant nested under the configuration.
    ChildVariant {
        /// Child name, unique under the owning configuration.
        name: String,
        /// Display name for diagnostics.
        display_name: String,
        /// The variant's attributes.
        attributes: ImmutableAttributes,
        /// Capabilities the variant provides.
        capabilities: Vec<CapabilitySpec>,
        /// Artifacts the variant publishes.
        artifacts: Vec<Arc<dyn ArtifactSource>>,
    },
}

/// A live configuration as declared in the build model.
///
/// The metadata builder reads a source exactly once, immediately after
/// triggering its deferred dependency actions; declarations added after that
/// point are not visible to the resulting metadata.
pub trait ConfigurationSource: Send + Sync {
    /// The configuration's name, unique within its component.
    fn name(&self) -> String;

    /// Optional human-readable description.
    fn description(&self) -> Option<String>;

    /// The configuration's attributes.
    fn attributes(&self) -> ImmutableAttributes;

    /// Whether the configuration is visible outside its project.
    fn is_visible(&self) -> bool;

    /// Whether consumers see the configuration's transitive dependencies.
    fn is_transitive(&self) -> bool;

    /// Whether the configuration can be consumed by other components.
    fn can_be_consumed(&self) -> bool;

    /// Whether the configuration can itself be resolved.
    fn can_be_resolved(&self) -> bool;

    /// Deprecation message shown when the configuration is consumed, if it is
    /// deprecated for consumption.
    fn consumption_deprecation(&self) -> Option<String>;

    /// The ordered, self-inclusive transitive closure of the configuration's
    /// extends relationships.
    fn hierarchy(&self) -> Vec<String>;

    /// Capabilities declared on the configuration.
    fn capabilities(&self) -> Vec<CapabilitySpec>;

    /// Runs any deferred dependency-adding actions. Called exactly once,
    /// before declarations are read.
    fn run_dependency_actions(&self);

    /// Locks the configuration against further mutation. Called at
    /// registration time.
    fn prevent_further_mutation(&self);

    /// The configuration's own raw dependency declarations.
    fn dependencies(&self) -> Vec<DependencyDeclaration>;

    /// The configuration's own raw dependency-constraint declarations.
    fn dependency_constraints(&self) -> Vec<DependencyConstraintDeclaration>;

    /// The configuration's own raw exclude rules.
    fn exclude_rules(&self) -> Vec<ExcludeRule>;

    /// Reports the configuration's variant structure through the three-case
    /// protocol of [`VariantVisit`].
    fn collect_variants(&self, visitor: &mut dyn FnMut(VariantVisit));
}

/// Supplies current raw configuration declarations by name.
///
/// Used by component reevaluation to rebuild lazy entries from the build
/// model's present state.
pub trait ConfigurationsProvider: Send + Sync {
    /// The current declaration of the named configuration, if it still
    /// exists.
    fn find_by_name(&self, name: &str) -> Option<Arc<dyn ConfigurationSource>>;
}
