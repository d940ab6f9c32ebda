//! Per-configuration metadata

use crate::artifact::{ArtifactName, ComponentArtifact, LocalArtifactMetadata, TransformedArtifacts};
use crate::attributes::ImmutableAttributes;
use crate::capability::CapabilitySpec;
use crate::component::variant::{ConfigurationIdentifier, LocalVariantMetadata};
use crate::core::{ComponentId, MetadataError};
use crate::dependency::{DependencyMetadata, ExcludeMetadata, FileDependencyMetadata};
use crate::model::{CalculatedValue, CalculatedValueFactory};
use std::fmt;
use std::sync::Arc;

/// The realized metadata of one configuration of a local component.
///
/// Everything except the artifact cell is immutable from construction:
/// defined lists hold exactly what the configuration itself declared at
/// build time, aggregated views hold the hierarchy closure (see
/// [`ConfigurationMetadataBuilder`]), and the artifact list resolves lazily
/// on first demand.
///
/// [`ConfigurationMetadataBuilder`]: crate::component::ConfigurationMetadataBuilder
#[derive(Debug)]
pub struct LocalConfigurationMetadata {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) component_id: ComponentId,
    pub(crate) visible: bool,
    pub(crate) transitive: bool,
    pub(crate) can_be_consumed: bool,
    pub(crate) consumption_deprecation: Option<String>,
    pub(crate) can_be_resolved: bool,
    pub(crate) hierarchy: Vec<String>,
    pub(crate) attributes: ImmutableAttributes,
    pub(crate) capabilities: Vec<CapabilitySpec>,
    pub(crate) defined_dependencies: Vec<Arc<DependencyMetadata>>,
    pub(crate) defined_files: Vec<FileDependencyMetadata>,
    pub(crate) defined_excludes: Vec<ExcludeMetadata>,
    pub(crate) all_dependencies: Vec<Arc<DependencyMetadata>>,
    pub(crate) all_files: Vec<FileDependencyMetadata>,
    pub(crate) all_excludes: Vec<ExcludeMetadata>,
    pub(crate) variants: Vec<Arc<LocalVariantMetadata>>,
    pub(crate) artifacts: CalculatedValue<Vec<Arc<LocalArtifactMetadata>>>,
    pub(crate) cells: CalculatedValueFactory,
}

impl LocalConfigurationMetadata {
    /// The configuration's name, unique within its component.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Optional human-readable description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The owning component's identity.
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// This configuration's identity within its component.
    pub fn identifier(&self) -> ConfigurationIdentifier {
        ConfigurationIdentifier::new(self.component_id.clone(), self.name.clone())
    }

    /// Whether the configuration is visible outside its project.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Whether consumers see the configuration's transitive dependencies.
    pub fn is_transitive(&self) -> bool {
        self.transitive
    }

    /// Whether the configuration can be consumed by other components.
    pub fn can_be_consumed(&self) -> bool {
        self.can_be_consumed
    }

    /// Deprecation message shown when the configuration is consumed, if any.
    pub fn consumption_deprecation(&self) -> Option<&str> {
        self.consumption_deprecation.as_deref()
    }

    /// Whether the configuration can itself be resolved.
    pub fn can_be_resolved(&self) -> bool {
        self.can_be_resolved
    }

    /// The self-inclusive set of ancestor configuration names.
    pub fn hierarchy(&self) -> &[String] {
        &self.hierarchy
    }

    /// The configuration's attributes.
    pub fn attributes(&self) -> &ImmutableAttributes {
        &self.attributes
    }

    /// Declared capabilities, deduplicated by capability id.
    pub fn capabilities(&self) -> &[CapabilitySpec] {
        &self.capabilities
    }

    /// Module dependencies this configuration itself declared.
    pub fn defined_dependencies(&self) -> &[Arc<DependencyMetadata>] {
        &self.defined_dependencies
    }

    /// File dependencies this configuration itself declared.
    pub fn defined_files(&self) -> &[FileDependencyMetadata] {
        &self.defined_files
    }

    /// Exclude rules this configuration itself declared.
    pub fn defined_excludes(&self) -> &[ExcludeMetadata] {
        &self.defined_excludes
    }

    /// Module dependencies aggregated over the hierarchy.
    ///
    /// Duplicates declared at different hierarchy levels remain distinct
    /// entries.
    pub fn dependencies(&self) -> &[Arc<DependencyMetadata>] {
        &self.all_dependencies
    }

    /// File dependencies aggregated over the hierarchy, deduplicated by the
    /// underlying collection's instance identity.
    pub fn files(&self) -> &[FileDependencyMetadata] {
        &self.all_files
    }

    /// Exclude rules aggregated over the hierarchy, duplicate-preserving.
    pub fn excludes(&self) -> &[ExcludeMetadata] {
        &self.all_excludes
    }

    /// The configuration's variants, own and nested.
    pub fn variants(&self) -> &[Arc<LocalVariantMetadata>] {
        &self.variants
    }

    /// Finalizes this configuration's artifact cell, then every owned
    /// variant's own cell. Idempotent and safe under concurrent callers.
    pub fn prepare_to_resolve_artifacts(&self) -> &Self {
        self.artifacts.finalize_if_not_already();
        for variant in &self.variants {
            variant.prepare_to_resolve_artifacts();
        }
        self
    }

    /// The resolved artifact list. Callers are expected to prepare first.
    pub fn artifacts(&self) -> Result<&[Arc<LocalArtifactMetadata>], MetadataError> {
        Ok(self.artifacts.get()?.as_slice())
    }

    /// Linear search over the resolved artifacts by artifact name.
    ///
    /// An absent name is not an error: the returned placeholder carries the
    /// owning component's id and the requested name for a later diagnostic.
    pub fn artifact(&self, name: &ArtifactName) -> ComponentArtifact {
        if let Ok(artifacts) = self.artifacts() {
            for candidate in artifacts {
                if candidate.name() == name {
                    return ComponentArtifact::Present(Arc::clone(candidate));
                }
            }
        }
        ComponentArtifact::Missing {
            component_id: self.component_id.clone(),
            requested: name.clone(),
        }
    }

    /// Rebuilds this configuration with `transform` applied to its resolved
    /// artifacts.
    ///
    /// Variants are rebuilt from their already-resolved artifact lists and
    /// the own artifact cell from this configuration's already-resolved (not
    /// re-derived) list; all remaining fields are shared with the source.
    /// Forcing resolution here is what makes the result independent of the
    /// live build model.
    pub fn copy(
        &self,
        transform: &mut TransformedArtifacts<'_>,
    ) -> Result<LocalConfigurationMetadata, MetadataError> {
        let mut variants = Vec::with_capacity(self.variants.len());
        for variant in &self.variants {
            variant.prepare_to_resolve_artifacts();
            let transformed = variant
                .artifacts()?
                .iter()
                .map(|artifact| transform.apply(artifact))
                .collect();
            variants.push(Arc::new(LocalVariantMetadata::from_resolved(
                variant.name().to_string(),
                variant.identifier().clone(),
                variant.display_name().to_string(),
                variant.attributes().clone(),
                variant.capabilities().to_vec(),
                transformed,
                &self.cells,
            )));
        }

        self.prepare_to_resolve_artifacts();
        let own = self
            .artifacts()?
            .iter()
            .map(|artifact| transform.apply(artifact))
            .collect();

        Ok(LocalConfigurationMetadata {
            name: self.name.clone(),
            description: self.description.clone(),
            component_id: self.component_id.clone(),
            visible: self.visible,
            transitive: self.transitive,
            can_be_consumed: self.can_be_consumed,
            consumption_deprecation: self.consumption_deprecation.clone(),
            can_be_resolved: self.can_be_resolved,
            hierarchy: self.hierarchy.clone(),
            attributes: self.attributes.clone(),
            capabilities: self.capabilities.clone(),
            defined_dependencies: self.defined_dependencies.clone(),
            defined_files: self.defined_files.clone(),
            defined_excludes: self.defined_excludes.clone(),
            all_dependencies: self.all_dependencies.clone(),
            all_files: self.all_files.clone(),
            all_excludes: self.all_excludes.clone(),
            variants,
            artifacts: self
                .cells
                .create_finalized(format!("artifacts of {}", self.identifier()), own),
            cells: self.cells.clone(),
        })
    }
}

impl fmt::Display for LocalConfigurationMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration '{}' of {}", self.name, self.component_id)
    }
}
