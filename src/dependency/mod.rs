//! Dependency, file-dependency, and exclude metadata
//!
//! These are the values configuration metadata aggregates and hands to the
//! graph resolver. Module declarations become [`DependencyMetadata`] through
//! the [`DependencyDescriptorFactory`] seam (the notation-aware factory lives
//! upstream; [`DefaultDependencyDescriptorFactory`] covers the plain case),
//! file-collection declarations are wrapped into [`FileDependencyMetadata`],
//! and exclude rules are converted through [`ExcludeRuleConverter`].

use crate::attributes::ImmutableAttributes;
use crate::core::{ComponentId, MetadataError};
use crate::declarations::{
    DependencyConstraintDeclaration, ExcludeRule, FileCollectionSource, ModuleDependencyDeclaration,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;
use std::sync::Arc;

/// The module coordinates a dependency selects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleSelector {
    /// Group of the target module.
    pub group: String,
    /// Name of the target module.
    pub module: String,
    /// Requested version notation; empty means "no preference".
    pub version: String,
}

impl fmt::Display for ModuleSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.module, self.version)
    }
}

/// A module dependency (or constraint) as declared by one configuration of a
/// local component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DependencyMetadata {
    selector: ModuleSelector,
    from_configuration: String,
    target_configuration: Option<String>,
    constraint: bool,
    transitive: bool,
    force: bool,
}

impl DependencyMetadata {
    /// A dependency declared by `from_configuration` selecting `selector`.
    pub fn new(selector: ModuleSelector, from_configuration: impl Into<String>) -> Self {
        Self {
            selector,
            from_configuration: from_configuration.into(),
            target_configuration: None,
            constraint: false,
            transitive: true,
            force: false,
        }
    }

    /// Returns this dependency marked as a constraint.
    pub fn as_constraint(mut self) -> Self {
        self.constraint = true;
        self
    }

    /// Returns this dependency with an explicit target configuration.
    pub fn with_target_configuration(mut self, target: impl Into<String>) -> Self {
        self.target_configuration = Some(target.into());
        self
    }

    /// Returns this dependency marked intransitive.
    pub fn intransitive(mut self) -> Self {
        self.transitive = false;
        self
    }

    /// Returns a forced variant of this dependency.
    ///
    /// Enforced-platform configurations report every aggregated dependency
    /// forced; defined lists are never rewritten.
    pub fn forced(&self) -> Self {
        Self {
            force: true,
            ..self.clone()
        }
    }

    /// The selected module coordinates.
    pub fn selector(&self) -> &ModuleSelector {
        &self.selector
    }

    /// Name of the configuration that declared this dependency.
    pub fn from_configuration(&self) -> &str {
        &self.from_configuration
    }

    /// Explicit target configuration, if the declaration named one.
    pub fn target_configuration(&self) -> Option<&str> {
        self.target_configuration.as_deref()
    }

    /// Whether this is a constraint rather than a hard dependency.
    pub fn is_constraint(&self) -> bool {
        self.constraint
    }

    /// Whether transitive dependencies of the target are wanted.
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Whether the selected version is forced over conflicting requests.
    pub fn is_forced(&self) -> bool {
        self.force
    }
}

impl fmt::Display for DependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constraint {
            write!(f, "constraint {}", self.selector)
        } else {
            write!(f, "dependency {}", self.selector)
        }
    }
}

/// A file-collection dependency of one configuration.
///
/// Equality and hashing follow the *instance* identity of the underlying
/// collection: aggregating a hierarchy deduplicates the same declared
/// collection reachable through several members, while two distinct
/// collections listing identical files stay distinct.
#[derive(Debug, Clone)]
pub struct FileDependencyMetadata {
    source: Arc<dyn FileCollectionSource>,
}

impl FileDependencyMetadata {
    /// Wrap a declared file collection.
    pub fn new(source: Arc<dyn FileCollectionSource>) -> Self {
        Self { source }
    }

    /// The underlying declared collection.
    pub fn source(&self) -> &Arc<dyn FileCollectionSource> {
        &self.source
    }

    /// The component producing the files, when known.
    pub fn component_id(&self) -> Option<ComponentId> {
        self.source.target_component_id()
    }

    /// The files in the collection.
    pub fn files(&self) -> Vec<PathBuf> {
        self.source.files()
    }

    fn source_ptr(&self) -> *const () {
        Arc::as_ptr(&self.source) as *const ()
    }
}

impl PartialEq for FileDependencyMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.source_ptr() == other.source_ptr()
    }
}

impl Eq for FileDependencyMetadata {}

impl Hash for FileDependencyMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source_ptr().hash(state);
    }
}

impl fmt::Display for FileDependencyMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source.display_name())
    }
}

/// A converted exclude rule.
///
/// `None` parts are wildcards, matching any group or module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExcludeMetadata {
    /// Excluded group, or any group when `None`.
    pub group: Option<String>,
    /// Excluded module, or any module when `None`.
    pub module: Option<String>,
}

impl fmt::Display for ExcludeMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "exclude {}:{}",
            self.group.as_deref().unwrap_or("*"),
            self.module.as_deref().unwrap_or("*")
        )
    }
}

/// Converts raw module declarations into dependency metadata.
///
/// The owning component id, declaring configuration, and that configuration's
/// attributes are supplied so notation-aware factories can derive
/// attribute-based target selection; the default factory carries the
/// coordinates across unchanged.
pub trait DependencyDescriptorFactory: Send + Sync {
    /// Convert a module dependency declaration.
    fn create_dependency(
        &self,
        owner: &ComponentId,
        configuration: &str,
        attributes: &ImmutableAttributes,
        declaration: &ModuleDependencyDeclaration,
    ) -> Result<DependencyMetadata, MetadataError>;

    /// Convert a dependency-constraint declaration.
    fn create_constraint(
        &self,
        owner: &ComponentId,
        configuration: &str,
        attributes: &ImmutableAttributes,
        declaration: &DependencyConstraintDeclaration,
    ) -> Result<DependencyMetadata, MetadataError>;
}

/// Descriptor factory for plain coordinate declarations.
#[derive(Debug, Clone, Default)]
pub struct DefaultDependencyDescriptorFactory;

impl DependencyDescriptorFactory for DefaultDependencyDescriptorFactory {
    fn create_dependency(
        &self,
        _owner: &ComponentId,
        configuration: &str,
        _attributes: &ImmutableAttributes,
        declaration: &ModuleDependencyDeclaration,
    ) -> Result<DependencyMetadata, MetadataError> {
        let selector = ModuleSelector {
            group: declaration.group.clone(),
            module: declaration.module.clone(),
            version: declaration.version.clone().unwrap_or_default(),
        };
        let mut metadata = DependencyMetadata::new(selector, configuration);
        if let Some(target) = &declaration.target_configuration {
            metadata = metadata.with_target_configuration(target.clone());
        }
        if !declaration.transitive {
            metadata = metadata.intransitive();
        }
        Ok(metadata)
    }

    fn create_constraint(
        &self,
        _owner: &ComponentId,
        configuration: &str,
        _attributes: &ImmutableAttributes,
        declaration: &DependencyConstraintDeclaration,
    ) -> Result<DependencyMetadata, MetadataError> {
        let selector = ModuleSelector {
            group: declaration.group.clone(),
            module: declaration.module.clone(),
            version: declaration.version.clone().unwrap_or_default(),
        };
        Ok(DependencyMetadata::new(selector, configuration).as_constraint())
    }
}

/// Converts raw exclude rules into exclude metadata.
pub trait ExcludeRuleConverter: Send + Sync {
    /// Convert one exclude rule.
    fn convert(&self, rule: &ExcludeRule) -> Result<ExcludeMetadata, MetadataError>;
}

/// Exclude converter that carries the rule parts across unchanged.
#[derive(Debug, Clone, Default)]
pub struct DefaultExcludeRuleConverter;

impl ExcludeRuleConverter for DefaultExcludeRuleConverter {
    fn convert(&self, rule: &ExcludeRule) -> Result<ExcludeMetadata, MetadataError> {
        Ok(ExcludeMetadata {
            group: rule.group.clone(),
            module: rule.module.clone(),
        })
    }
}
