//! Shared stub collaborators for unit and integration tests
//!
//! The metadata model consumes its build-model inputs through traits; these
//! stubs script them. [`TestConfiguration`] builds a raw configuration
//! declaration, [`TestArtifactSource`] counts how often its file location is
//! resolved, [`CountingModel`] counts exclusive-lock acquisitions, and
//! [`StaticProvider`] backs `reevaluate` with a fixed name → declaration map.

use crate::artifact::{ArtifactName, ArtifactSource};
use crate::attributes::ImmutableAttributes;
use crate::capability::CapabilitySpec;
use crate::component::{ConfigurationMetadataBuilder, LocalComponentMetadata};
use crate::core::{ComponentId, MetadataError, ModuleVersionId};
use crate::declarations::{
    ConfigurationSource, ConfigurationsProvider, DependencyConstraintDeclaration,
    DependencyDeclaration, ExcludeRule, FileCollectionSource, ModuleDependencyDeclaration,
    VariantVisit,
};
use crate::dependency::{DefaultDependencyDescriptorFactory, DefaultExcludeRuleConverter};
use crate::model::{CalculatedValueFactory, LockedModel, ModelContainer};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An artifact source with a fixed name and file, counting resolutions.
#[derive(Debug)]
pub struct TestArtifactSource {
    name: ArtifactName,
    file: PathBuf,
    fail_with: Option<String>,
    resolutions: AtomicUsize,
}

impl TestArtifactSource {
    /// A `jar` artifact located under `/build/libs`.
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: ArtifactName::new(name, "jar"),
            file: PathBuf::from(format!("/build/libs/{name}.jar")),
            fail_with: None,
            resolutions: AtomicUsize::new(0),
        })
    }

    /// An artifact whose location resolution always fails with `reason`.
    pub fn failing(name: &str, reason: &str) -> Arc<Self> {
        Arc::new(Self {
            name: ArtifactName::new(name, "jar"),
            file: PathBuf::new(),
            fail_with: Some(reason.to_string()),
            resolutions: AtomicUsize::new(0),
        })
    }

    /// How often [`ArtifactSource::file`] ran.
    pub fn resolutions(&self) -> usize {
        self.resolutions.load(Ordering::SeqCst)
    }
}

impl ArtifactSource for TestArtifactSource {
    fn name(&self) -> ArtifactName {
        self.name.clone()
    }

    fn file(&self) -> Result<PathBuf, MetadataError> {
        self.resolutions.fetch_add(1, Ordering::SeqCst);
        match &self.fail_with {
            Some(reason) => Err(MetadataError::ArtifactResolution {
                artifact: self.name.to_string(),
                reason: reason.clone(),
            }),
            None => Ok(self.file.clone()),
        }
    }
}

/// A file collection with a fixed file list.
#[derive(Debug)]
pub struct TestFileCollection {
    display_name: String,
    files: Vec<PathBuf>,
}

impl TestFileCollection {
    /// A collection named `display_name` holding `files`.
    pub fn new(display_name: &str, files: &[&str]) -> Arc<dyn FileCollectionSource> {
        Arc::new(Self {
            display_name: display_name.to_string(),
            files: files.iter().map(PathBuf::from).collect(),
        })
    }
}

impl FileCollectionSource for TestFileCollection {
    fn display_name(&self) -> String {
        self.display_name.clone()
    }

    fn target_component_id(&self) -> Option<ComponentId> {
        None
    }

    fn files(&self) -> Vec<PathBuf> {
        self.files.clone()
    }
}

/// A model boundary counting exclusive executions.
#[derive(Debug, Default)]
pub struct CountingModel {
    lock: parking_lot::ReentrantMutex<()>,
    runs: AtomicUsize,
}

impl CountingModel {
    /// A fresh boundary with a zeroed counter.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// How often `run_exclusive` ran.
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

impl ModelContainer for CountingModel {
    fn run_exclusive<'a>(&self, action: Box<dyn FnOnce() + 'a>) {
        let _guard = self.lock.lock();
        self.runs.fetch_add(1, Ordering::SeqCst);
        action();
    }
}

/// A scripted raw configuration declaration.
///
/// Builder methods declare dependencies, excludes, variants, and flags; the
/// finished value is handed to
/// [`LocalComponentMetadata::register_configuration`] via
/// [`TestConfiguration::into_source`].
#[derive(Debug)]
pub struct TestConfiguration {
    name: String,
    description: Option<String>,
    attributes: ImmutableAttributes,
    visible: bool,
    transitive: bool,
    consumable: bool,
    resolvable: bool,
    consumption_deprecation: Option<String>,
    hierarchy: Vec<String>,
    capabilities: Vec<CapabilitySpec>,
    dependencies: Vec<DependencyDeclaration>,
    constraints: Vec<DependencyConstraintDeclaration>,
    excludes: Vec<ExcludeRule>,
    variants: Vec<VariantVisit>,
    deferred_dependencies: Mutex<Vec<DependencyDeclaration>>,
    action_runs: AtomicUsize,
    mutation_prevented: AtomicBool,
}

impl TestConfiguration {
    /// A visible, transitive, consumable, resolvable configuration with an
    /// empty attribute set and a self-only hierarchy.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            attributes: ImmutableAttributes::empty(),
            visible: true,
            transitive: true,
            consumable: true,
            resolvable: true,
            consumption_deprecation: None,
            hierarchy: vec![name.to_string()],
            capabilities: Vec::new(),
            dependencies: Vec::new(),
            constraints: Vec::new(),
            excludes: Vec::new(),
            variants: Vec::new(),
            deferred_dependencies: Mutex::new(Vec::new()),
            action_runs: AtomicUsize::new(0),
            mutation_prevented: AtomicBool::new(false),
        }
    }

    /// Adds `ancestor` to the hierarchy.
    pub fn extends(mut self, ancestor: &str) -> Self {
        self.hierarchy.push(ancestor.to_string());
        self
    }

    /// Sets the description.
    pub fn described(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Sets the consumable flag.
    pub fn consumable(mut self, consumable: bool) -> Self {
        self.consumable = consumable;
        self
    }

    /// Sets the resolvable flag.
    pub fn resolvable(mut self, resolvable: bool) -> Self {
        self.resolvable = resolvable;
        self
    }

    /// Marks the configuration deprecated for consumption.
    pub fn deprecated_for_consumption(mut self, message: &str) -> Self {
        self.consumption_deprecation = Some(message.to_string());
        self
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes = self.attributes.with(name, value);
        self
    }

    /// Adds a declared capability.
    pub fn with_capability(mut self, capability: impl Into<CapabilitySpec>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Declares a module dependency on `group:module:version`.
    pub fn with_dependency(mut self, group: &str, module: &str, version: &str) -> Self {
        self.dependencies.push(DependencyDeclaration::Module(
            ModuleDependencyDeclaration::new(group, module, version),
        ));
        self
    }

    /// Declares a file-collection dependency.
    pub fn with_file_dependency(mut self, collection: Arc<dyn FileCollectionSource>) -> Self {
        self.dependencies.push(DependencyDeclaration::File(collection));
        self
    }

    /// Declares a dependency of a kind the metadata model cannot represent.
    pub fn with_unsupported_dependency(mut self, display_name: &str) -> Self {
        self.dependencies
            .push(DependencyDeclaration::Other(display_name.to_string()));
        self
    }

    /// Declares a module dependency that only becomes visible once deferred
    /// dependency actions run.
    pub fn with_deferred_dependency(self, group: &str, module: &str, version: &str) -> Self {
        self.deferred_dependencies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DependencyDeclaration::Module(
                ModuleDependencyDeclaration::new(group, module, version),
            ));
        self
    }

    /// Declares a dependency constraint.
    pub fn with_constraint(mut self, group: &str, module: &str, version: &str) -> Self {
        self.constraints.push(DependencyConstraintDeclaration {
            group: group.to_string(),
            module: module.to_string(),
            version: Some(version.to_string()),
            reason: None,
        });
        self
    }

    /// Declares an exclude rule.
    pub fn with_exclude(mut self, group: Option<&str>, module: Option<&str>) -> Self {
        self.excludes.push(ExcludeRule {
            group: group.map(str::to_string),
            module: module.map(str::to_string),
        });
        self
    }

    /// Publishes artifacts on the configuration itself.
    pub fn with_artifacts(mut self, artifacts: Vec<Arc<dyn ArtifactSource>>) -> Self {
        self.variants.push(VariantVisit::Artifacts(artifacts));
        self
    }

    /// Describes the configuration itself as a variant.
    pub fn with_own_variant(
        mut self,
        attributes: ImmutableAttributes,
        capabilities: Vec<CapabilitySpec>,
        artifacts: Vec<Arc<dyn ArtifactSource>>,
    ) -> Self {
        let display_name = format!("variant '{}'", self.name);
        self.variants.push(VariantVisit::OwnVariant {
            display_name,
            attributes,
            capabilities,
            artifacts,
        });
        self
    }

    /// Adds a named child variant.
    pub fn with_child_variant(
        mut self,
        name: &str,
        attributes: ImmutableAttributes,
        capabilities: Vec<CapabilitySpec>,
        artifacts: Vec<Arc<dyn ArtifactSource>>,
    ) -> Self {
        self.variants.push(VariantVisit::ChildVariant {
            name: name.to_string(),
            display_name: format!("variant '{}-{name}'", self.name),
            attributes,
            capabilities,
            artifacts,
        });
        self
    }

    /// How often deferred dependency actions ran.
    pub fn action_runs(&self) -> usize {
        self.action_runs.load(Ordering::SeqCst)
    }

    /// Whether registration locked this configuration.
    pub fn is_mutation_prevented(&self) -> bool {
        self.mutation_prevented.load(Ordering::SeqCst)
    }

    /// This configuration as a trait object.
    pub fn into_source(self) -> Arc<dyn ConfigurationSource> {
        Arc::new(self)
    }
}

impl ConfigurationSource for TestConfiguration {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn description(&self) -> Option<String> {
        self.description.clone()
    }

    fn attributes(&self) -> ImmutableAttributes {
        self.attributes.clone()
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn is_transitive(&self) -> bool {
        self.transitive
    }

    fn can_be_consumed(&self) -> bool {
        self.consumable
    }

    fn can_be_resolved(&self) -> bool {
        self.resolvable
    }

    fn consumption_deprecation(&self) -> Option<String> {
        self.consumption_deprecation.clone()
    }

    fn hierarchy(&self) -> Vec<String> {
        self.hierarchy.clone()
    }

    fn capabilities(&self) -> Vec<CapabilitySpec> {
        self.capabilities.clone()
    }

    fn run_dependency_actions(&self) {
        self.action_runs.fetch_add(1, Ordering::SeqCst);
    }

    fn prevent_further_mutation(&self) {
        self.mutation_prevented.store(true, Ordering::SeqCst);
    }

    fn dependencies(&self) -> Vec<DependencyDeclaration> {
        let mut dependencies = self.dependencies.clone();
        if self.action_runs() > 0 {
            dependencies.extend(
                self.deferred_dependencies
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .iter()
                    .cloned(),
            );
        }
        dependencies
    }

    fn dependency_constraints(&self) -> Vec<DependencyConstraintDeclaration> {
        self.constraints.clone()
    }

    fn exclude_rules(&self) -> Vec<ExcludeRule> {
        self.excludes.clone()
    }

    fn collect_variants(&self, visitor: &mut dyn FnMut(VariantVisit)) {
        for visit in &self.variants {
            visitor(visit.clone());
        }
    }
}

/// A fixed name → declaration map backing `reevaluate`.
#[derive(Default)]
pub struct StaticProvider {
    sources: HashMap<String, Arc<dyn ConfigurationSource>>,
}

impl StaticProvider {
    /// An empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a declaration under its own name.
    pub fn with(mut self, source: Arc<dyn ConfigurationSource>) -> Self {
        self.sources.insert(source.name(), source);
        self
    }
}

impl ConfigurationsProvider for StaticProvider {
    fn find_by_name(&self, name: &str) -> Option<Arc<dyn ConfigurationSource>> {
        self.sources.get(name).map(Arc::clone)
    }
}

/// A component named `project :core` wired to the default factory and
/// converter over the given model boundary.
pub fn test_component(model: Arc<dyn ModelContainer>) -> Arc<LocalComponentMetadata> {
    LocalComponentMetadata::new(
        ModuleVersionId::new("org.mortar", "core", "1.0"),
        ComponentId::new("project :core"),
        crate::core::DEFAULT_STATUS,
        Default::default(),
        model,
        CalculatedValueFactory::new(),
        ConfigurationMetadataBuilder::new(
            Arc::new(DefaultDependencyDescriptorFactory),
            Arc::new(DefaultExcludeRuleConverter),
        ),
    )
}

/// A component over a plain locked model.
pub fn locked_test_component() -> Arc<LocalComponentMetadata> {
    test_component(Arc::new(LockedModel::new()))
}
