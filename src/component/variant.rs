//! Variant metadata owned by a configuration

use crate::artifact::{self, ArtifactSource, LocalArtifactMetadata};
use crate::attributes::ImmutableAttributes;
use crate::capability::CapabilitySpec;
use crate::core::{ComponentId, MetadataError};
use crate::model::{CalculatedValue, CalculatedValueFactory, ModelContainer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity of one configuration of one component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigurationIdentifier {
    component: ComponentId,
    configuration: String,
}

impl ConfigurationIdentifier {
    /// Create the identity of `configuration` within `component`.
    pub fn new(component: ComponentId, configuration: impl Into<String>) -> Self {
        Self {
            component,
            configuration: configuration.into(),
        }
    }

    /// The owning component's identity.
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    /// The configuration's name.
    pub fn configuration(&self) -> &str {
        &self.configuration
    }
}

impl fmt::Display for ConfigurationIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "configuration '{}' of {}", self.configuration, self.component)
    }
}

/// Identity of a variant: either the configuration itself, or a named child
/// nested under it.
///
/// Composite (nested) identifiers are value-equal iff both the parent
/// identifier and the child name match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantIdentifier {
    /// The configuration described as a variant of itself.
    Configuration(ConfigurationIdentifier),
    /// A named variant nested under a configuration.
    Nested {
        /// Identifier of the owning configuration.
        parent: ConfigurationIdentifier,
        /// The child variant's name.
        child: String,
    },
}

impl fmt::Display for VariantIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariantIdentifier::Configuration(id) => id.fmt(f),
            VariantIdentifier::Nested { parent, child } => {
                write!(f, "variant '{child}' of {parent}")
            }
        }
    }
}

/// A named, attributed, capability-bearing artifact group of a configuration.
///
/// Each variant owns an artifact cell independent of its configuration's:
/// preparing the configuration cascades into the variants, but a variant can
/// also be prepared and read on its own.
#[derive(Debug)]
pub struct LocalVariantMetadata {
    name: String,
    identifier: VariantIdentifier,
    display_name: String,
    attributes: ImmutableAttributes,
    capabilities: Vec<CapabilitySpec>,
    artifacts: CalculatedValue<Vec<Arc<LocalArtifactMetadata>>>,
}

impl LocalVariantMetadata {
    /// A variant whose artifacts resolve lazily from declared sources.
    pub(crate) fn deferred(
        name: String,
        identifier: VariantIdentifier,
        component_id: ComponentId,
        display_name: String,
        attributes: ImmutableAttributes,
        capabilities: Vec<CapabilitySpec>,
        sources: Vec<Arc<dyn ArtifactSource>>,
        model: Arc<dyn ModelContainer>,
        cells: &CalculatedValueFactory,
    ) -> Self {
        let description = format!("artifacts of {identifier}");
        let artifacts = cells.create(description.clone(), move || {
            if sources.is_empty() {
                return Ok(Vec::new());
            }
            // Locating a source may evaluate producing actions.
            model.from_exclusive(&description, || {
                artifact::resolve_sources(&component_id, &sources)
            })?
        });
        Self {
            name,
            identifier,
            display_name,
            attributes,
            capabilities,
            artifacts,
        }
    }

    /// A variant rebuilt around an already-resolved artifact list.
    ///
    /// Used by the copy path, where artifacts have been transformed and no
    /// deferred work remains.
    pub(crate) fn from_resolved(
        name: String,
        identifier: VariantIdentifier,
        display_name: String,
        attributes: ImmutableAttributes,
        capabilities: Vec<CapabilitySpec>,
        artifacts: Vec<Arc<LocalArtifactMetadata>>,
        cells: &CalculatedValueFactory,
    ) -> Self {
        let description = format!("artifacts of {identifier}");
        Self {
            name,
            identifier,
            display_name,
            attributes,
            capabilities,
            artifacts: cells.create_finalized(description, artifacts),
        }
    }

    /// The variant's name. Child variants are named
    /// `<configuration>-<child>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The variant's identity.
    pub fn identifier(&self) -> &VariantIdentifier {
        &self.identifier
    }

    /// Display name used in diagnostics.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// The variant's attributes.
    pub fn attributes(&self) -> &ImmutableAttributes {
        &self.attributes
    }

    /// Capabilities the variant provides.
    pub fn capabilities(&self) -> &[CapabilitySpec] {
        &self.capabilities
    }

    /// Finalizes the variant's artifact cell. Idempotent; failures are
    /// captured for [`LocalVariantMetadata::artifacts`] to replay.
    pub fn prepare_to_resolve_artifacts(&self) -> &Self {
        self.artifacts.finalize_if_not_already();
        self
    }

    /// The resolved artifact list. Callers are expected to prepare first.
    pub fn artifacts(&self) -> Result<&[Arc<LocalArtifactMetadata>], MetadataError> {
        Ok(self.artifacts.get()?.as_slice())
    }
}

impl fmt::Display for LocalVariantMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}
