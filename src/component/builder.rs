//! Realizes configuration metadata from raw declarations

use crate::artifact::{self, ArtifactSource};
use crate::capability;
use crate::component::LocalComponentMetadata;
use crate::component::configuration::LocalConfigurationMetadata;
use crate::component::variant::{ConfigurationIdentifier, LocalVariantMetadata, VariantIdentifier};
use crate::core::MetadataError;
use crate::declarations::{ConfigurationSource, DependencyDeclaration, VariantVisit};
use crate::dependency::{
    DependencyDescriptorFactory, ExcludeMetadata, ExcludeRuleConverter, FileDependencyMetadata,
};
use std::sync::Arc;

/// Turns one raw configuration declaration plus its parent component into a
/// [`LocalConfigurationMetadata`] value.
///
/// Reading is a closed-world snapshot: deferred dependency actions run
/// exactly once, up front, and anything added to the configuration afterwards
/// is invisible to the resulting metadata. Aggregated views read ancestor
/// configurations' *defined* collections from the parent component, in the
/// component's registration-order iteration filtered to hierarchy membership,
/// with this configuration's own just-built lists substituted for its (not
/// necessarily registered yet) self entry.
#[derive(Clone)]
pub struct ConfigurationMetadataBuilder {
    dependency_factory: Arc<dyn DependencyDescriptorFactory>,
    exclude_converter: Arc<dyn ExcludeRuleConverter>,
}

impl ConfigurationMetadataBuilder {
    /// A builder converting declarations through the given collaborators.
    pub fn new(
        dependency_factory: Arc<dyn DependencyDescriptorFactory>,
        exclude_converter: Arc<dyn ExcludeRuleConverter>,
    ) -> Self {
        Self {
            dependency_factory,
            exclude_converter,
        }
    }

    /// Build the metadata of `source` within `component`.
    pub fn create(
        &self,
        source: &Arc<dyn ConfigurationSource>,
        component: &Arc<LocalComponentMetadata>,
    ) -> Result<LocalConfigurationMetadata, MetadataError> {
        // Run any actions that add or modify dependencies before reading
        // anything off the configuration.
        source.run_dependency_actions();

        let name = source.name();
        let component_id = component.id().clone();
        let attributes = source.attributes();
        tracing::debug!(configuration = %name, component = %component_id, "building configuration metadata");

        let mut defined_dependencies = Vec::new();
        let mut defined_files = Vec::new();
        for declaration in source.dependencies() {
            match declaration {
                DependencyDeclaration::Module(module) => {
                    defined_dependencies.push(Arc::new(self.dependency_factory.create_dependency(
                        &component_id,
                        &name,
                        &attributes,
                        &module,
                    )?));
                }
                DependencyDeclaration::File(collection) => {
                    defined_files.push(FileDependencyMetadata::new(collection));
                }
                DependencyDeclaration::Other(declaration) => {
                    return Err(MetadataError::UnsupportedDeclaration {
                        declaration,
                        configuration: name,
                    });
                }
            }
        }
        for constraint in source.dependency_constraints() {
            defined_dependencies.push(Arc::new(self.dependency_factory.create_constraint(
                &component_id,
                &name,
                &attributes,
                &constraint,
            )?));
        }

        let mut defined_excludes = Vec::new();
        for rule in source.exclude_rules() {
            defined_excludes.push(self.exclude_converter.convert(&rule)?);
        }

        let identifier = ConfigurationIdentifier::new(component_id.clone(), name.clone());
        let mut source_artifacts: Vec<Arc<dyn ArtifactSource>> = Vec::new();
        let mut variants = Vec::new();
        source.collect_variants(&mut |visit| match visit {
            VariantVisit::Artifacts(artifacts) => {
                source_artifacts.extend(artifacts);
            }
            VariantVisit::OwnVariant {
                display_name,
                attributes,
                capabilities,
                artifacts,
            } => {
                variants.push(Arc::new(LocalVariantMetadata::deferred(
                    name.clone(),
                    VariantIdentifier::Configuration(identifier.clone()),
                    component_id.clone(),
                    display_name,
                    attributes,
                    capabilities,
                    artifacts,
                    Arc::clone(component.model()),
                    component.cells(),
                )));
            }
            VariantVisit::ChildVariant {
                name: child,
                display_name,
                attributes,
                capabilities,
                artifacts,
            } => {
                variants.push(Arc::new(LocalVariantMetadata::deferred(
                    format!("{name}-{child}"),
                    VariantIdentifier::Nested {
                        parent: identifier.clone(),
                        child,
                    },
                    component_id.clone(),
                    display_name,
                    attributes,
                    capabilities,
                    artifacts,
                    Arc::clone(component.model()),
                    component.cells(),
                )));
            }
        });

        let capabilities = capability::dedup_by_id(source.capabilities());

        // The hierarchy is self-inclusive by contract; enforce it for sources
        // that only report their ancestors.
        let mut hierarchy = source.hierarchy();
        if !hierarchy.iter().any(|member| *member == name) {
            hierarchy.insert(0, name.clone());
        }

        // Aggregated views: own defined lists first, then every other
        // hierarchy member's defined lists in registration order. Module
        // dependencies and excludes keep duplicates; file dependencies
        // deduplicate by collection identity.
        let mut all_dependencies = defined_dependencies.clone();
        let mut all_files: Vec<FileDependencyMetadata> = Vec::new();
        for file in &defined_files {
            if !all_files.contains(file) {
                all_files.push(file.clone());
            }
        }
        let mut all_excludes: Vec<ExcludeMetadata> = defined_excludes.clone();
        for member in component.configuration_names() {
            if member == name || !hierarchy.contains(&member) {
                continue;
            }
            let Some(ancestor) = component.get_configuration(&member)? else {
                continue;
            };
            all_dependencies.extend(ancestor.defined_dependencies().iter().cloned());
            for file in ancestor.defined_files() {
                if !all_files.contains(file) {
                    all_files.push(file.clone());
                }
            }
            all_excludes.extend(ancestor.defined_excludes().iter().cloned());
        }

        if attributes.is_enforced_platform() {
            // Consumers of an enforced platform get every aggregated
            // dependency forced; defined lists stay as declared.
            all_dependencies = all_dependencies
                .iter()
                .map(|dependency| Arc::new(dependency.forced()))
                .collect();
        }

        let artifact_description = format!("artifacts of {identifier}");
        let cell_description = artifact_description.clone();
        let cell_component = Arc::downgrade(component);
        let cell_model = Arc::clone(component.model());
        let cell_component_id = component_id.clone();
        let cell_name = name.clone();
        let cell_hierarchy = hierarchy.clone();
        let cell_sources = source_artifacts.clone();
        let artifacts = component.cells().create(artifact_description, move || {
            if cell_sources.is_empty() && cell_hierarchy.iter().all(|member| *member == cell_name) {
                return Ok(Vec::new());
            }
            // Resolving a source's location may evaluate producing actions,
            // so wrapping runs under the model's exclusive lock. Ancestor
            // cells are forced outside it; each takes the lock for its own
            // sources, keeping cell-blocking and model-locking disjoint.
            let mut result = cell_model.from_exclusive(&cell_description, || {
                artifact::resolve_sources(&cell_component_id, &cell_sources)
            })??;
            let component = cell_component.upgrade().ok_or_else(|| {
                MetadataError::ComponentReleased {
                    configuration: cell_name.clone(),
                }
            })?;
            for member in &cell_hierarchy {
                if *member == cell_name {
                    continue;
                }
                let Some(ancestor) = component.get_configuration(member)? else {
                    continue;
                };
                for artifact in ancestor.prepare_to_resolve_artifacts().artifacts()? {
                    if !result.contains(artifact) {
                        result.push(Arc::clone(artifact));
                    }
                }
            }
            Ok(result)
        });

        Ok(LocalConfigurationMetadata {
            name,
            description: source.description(),
            component_id,
            visible: source.is_visible(),
            transitive: source.is_transitive(),
            can_be_consumed: source.can_be_consumed(),
            consumption_deprecation: source.consumption_deprecation(),
            can_be_resolved: source.can_be_resolved(),
            hierarchy,
            attributes,
            capabilities,
            defined_dependencies,
            defined_files,
            defined_excludes,
            all_dependencies,
            all_files,
            all_excludes,
            variants,
            artifacts,
            cells: component.cells().clone(),
        })
    }
}

impl std::fmt::Debug for ConfigurationMetadataBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigurationMetadataBuilder").finish_non_exhaustive()
    }
}
