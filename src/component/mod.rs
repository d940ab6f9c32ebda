//! Local component metadata
//!
//! A [`LocalComponentMetadata`] is created once when its owning project is
//! evaluated and then serves every resolution request against that project.
//! It owns the registration-ordered registry of configuration names, each
//! mapped to a lazily realized [`LocalConfigurationMetadata`]; realization
//! happens at most once per name, on first read, through the
//! [`ConfigurationMetadataBuilder`].
//!
//! # Concurrency
//!
//! Registration (`register_configuration`, `add_configuration`,
//! `reevaluate`) is expected to finish single-threaded before concurrent
//! resolution begins — that is a documented precondition, not an enforced
//! one. Once registered, `get_configuration`, aggregated-view reads, and
//! `prepare_to_resolve_artifacts` are safe under unlimited concurrent
//! readers: the only blocking primitive is the lazy cell, and the only
//! mutable-model access runs through [`ModelContainer::run_exclusive`].
//!
//! # Copying
//!
//! [`LocalComponentMetadata::copy`] produces an entirely new component with a
//! fully realized, independent configuration set sharing no mutable state
//! with the source — the contract out-of-process persistence relies on. The
//! copy is destructive to laziness: every configuration of the source is
//! realized up front.
//!
//! [`ModelContainer::run_exclusive`]: crate::model::ModelContainer::run_exclusive

mod builder;
pub mod configuration;
pub mod variant;


pub use builder::ConfigurationMetadataBuilder;
pub use configuration::LocalConfigurationMetadata;
pub use variant::{ConfigurationIdentifier, LocalVariantMetadata, VariantIdentifier};

use crate::artifact::{ArtifactTransform, TransformedArtifacts};
use crate::attributes::{AttributesSchema, ImmutableAttributes};
use crate::core::{ComponentId, DEFAULT_STATUS_SCHEME, MetadataError, ModuleVersionId};
use crate::declarations::{ConfigurationSource, ConfigurationsProvider};
use crate::model::{CalculatedValue, CalculatedValueFactory, ModelContainer};
use dashmap::DashMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

type ConfigurationCell = Arc<CalculatedValue<Arc<LocalConfigurationMetadata>>>;

#[derive(Debug, Default)]
struct Registry {
    order: Vec<String>,
    entries: HashMap<String, ConfigurationCell>,
}

impl Registry {
    /// Insert or replace an entry. A replaced name keeps its original
    /// registration slot, so reevaluation never reorders aggregation.
    fn insert(&mut self, name: String, cell: ConfigurationCell) {
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, cell);
    }
}

/// Metadata of an in-workspace component, as consumed by graph resolution.
pub struct LocalComponentMetadata {
    // Weak handle to this component's own Arc; lazy entries capture it so a
    // registered configuration never keeps its component alive on its own.
    self_handle: Weak<LocalComponentMetadata>,
    module_version_id: ModuleVersionId,
    component_id: ComponentId,
    status: String,
    attributes_schema: AttributesSchema,
    model: Arc<dyn ModelContainer>,
    cells: CalculatedValueFactory,
    builder: ConfigurationMetadataBuilder,
    consumable: DashMap<String, bool>,
    registry: RwLock<Registry>,
    variants_for_traversal: OnceLock<Result<Vec<Arc<LocalConfigurationMetadata>>, Arc<MetadataError>>>,
}

impl LocalComponentMetadata {
    /// Create an empty component.
    ///
    /// Returns an `Arc` because lazily registered configurations hold a weak
    /// reference back to their component.
    pub fn new(
        module_version_id: ModuleVersionId,
        component_id: ComponentId,
        status: impl Into<String>,
        attributes_schema: AttributesSchema,
        model: Arc<dyn ModelContainer>,
        cells: CalculatedValueFactory,
        builder: ConfigurationMetadataBuilder,
    ) -> Arc<Self> {
        let status = status.into();
        Arc::new_cyclic(|self_handle| Self {
            self_handle: self_handle.clone(),
            module_version_id,
            component_id,
            status,
            attributes_schema,
            model,
            cells,
            builder,
            consumable: DashMap::new(),
            registry: RwLock::new(Registry::default()),
            variants_for_traversal: OnceLock::new(),
        })
    }

    /// The component's identity.
    pub fn id(&self) -> &ComponentId {
        &self.component_id
    }

    /// The coordinates the component publishes under.
    pub fn module_version_id(&self) -> &ModuleVersionId {
        &self.module_version_id
    }

    /// The component's status within the status scheme.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The fixed status scheme of local components.
    pub fn status_scheme(&self) -> &'static [&'static str] {
        &DEFAULT_STATUS_SCHEME
    }

    /// The attribute schema the component resolves against.
    pub fn attributes_schema(&self) -> &AttributesSchema {
        &self.attributes_schema
    }

    /// Component-level attributes. A local component carries none; its
    /// variants do.
    pub fn attributes(&self) -> ImmutableAttributes {
        ImmutableAttributes::empty()
    }

    /// The mutable-model boundary artifact resolution runs under.
    pub fn model(&self) -> &Arc<dyn ModelContainer> {
        &self.model
    }

    /// The deferred-value factory this component builds cells with.
    pub fn cells(&self) -> &CalculatedValueFactory {
        &self.cells
    }

    /// Registered configuration names in registration order.
    pub fn configuration_names(&self) -> Vec<String> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .clone()
    }

    /// Registers a configuration for lazy realization.
    ///
    /// Locks the raw configuration against further mutation, stores its
    /// consumable flag eagerly (traversal eligibility must be decidable
    /// without realizing), and installs a lazy entry that invokes the builder
    /// on first read. Replaces any prior entry of the same name.
    pub fn register_configuration(&self, source: Arc<dyn ConfigurationSource>) {
        source.prevent_further_mutation();

        let name = source.name();
        tracing::debug!(configuration = %name, component = %self.component_id, "registering configuration");
        self.consumable.insert(name.clone(), source.can_be_consumed());

        let component = self.self_handle.clone();
        let builder = self.builder.clone();
        let cell_name = name.clone();
        let cell = Arc::new(self.cells.create(
            format!("metadata of configuration '{name}' of {}", self.component_id),
            move || {
                let component = component.upgrade().ok_or_else(|| {
                    MetadataError::ComponentReleased {
                        configuration: cell_name.clone(),
                    }
                })?;
                builder.create(&source, &component).map(Arc::new)
            },
        ));

        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, cell);
    }

    /// Eagerly adds an already realized configuration.
    ///
    /// Used when metadata is restored from persistence or produced by a
    /// copy; still replaces any prior entry of the same name.
    pub fn add_configuration(
        &self,
        configuration: Arc<LocalConfigurationMetadata>,
    ) -> Arc<LocalConfigurationMetadata> {
        let name = configuration.name().to_string();
        self.consumable
            .insert(name.clone(), configuration.can_be_consumed());

        let cell = Arc::new(self.cells.create_finalized(
            format!("metadata of {configuration}"),
            Arc::clone(&configuration),
        ));
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, cell);
        configuration
    }

    /// The realized metadata of the named configuration.
    ///
    /// An unknown name is absence, not an error; realization runs at most
    /// once per name, and a failed realization is replayed to every caller.
    pub fn get_configuration(
        &self,
        name: &str,
    ) -> Result<Option<Arc<LocalConfigurationMetadata>>, MetadataError> {
        let cell = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            registry.entries.get(name).map(Arc::clone)
        };
        match cell {
            None => Ok(None),
            Some(cell) => cell.get().map(|configuration| Some(Arc::clone(configuration))),
        }
    }

    /// Whether the named configuration's lazy entry has settled.
    pub fn is_configuration_realized(&self, name: &str) -> bool {
        let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
        registry
            .entries
            .get(name)
            .is_some_and(|cell| cell.is_finalized())
    }

    /// The consumable configurations with a non-empty attribute set, in
    /// registration order — the variants graph traversal selects between.
    ///
    /// Computed once and cached forever: configurations registered after the
    /// first call are not reflected in later results. This staleness is
    /// inherited, observable behavior; callers relying on re-registration
    /// must query before first traversal.
    pub fn variants_for_graph_traversal(
        &self,
    ) -> Result<Vec<Arc<LocalConfigurationMetadata>>, MetadataError> {
        let cached = self.variants_for_traversal.get_or_init(|| {
            tracing::debug!(component = %self.component_id, "computing variants for graph traversal");
            let mut variants = Vec::new();
            for name in self.configuration_names() {
                let consumable = self.consumable.get(&name).map(|flag| *flag).unwrap_or(false);
                if !consumable {
                    continue;
                }
                match self.get_configuration(&name) {
                    Ok(Some(configuration)) => {
                        if !configuration.attributes().is_empty() {
                            variants.push(configuration);
                        }
                    }
                    Ok(None) => {}
                    Err(error) => return Err(Arc::new(error)),
                }
            }
            Ok(variants)
        });
        match cached {
            Ok(variants) => Ok(variants.clone()),
            Err(error) => Err(MetadataError::Shared(Arc::clone(error))),
        }
    }

    /// Creates a copy of this component under a new identity, transforming
    /// every artifact.
    ///
    /// A single identity-keyed memo spans the whole traversal, so an artifact
    /// instance referenced by several variants and configurations is
    /// transformed exactly once and shared by every referrer in the copy.
    /// Forces full realization of the source; any failure aborts the entire
    /// copy.
    pub fn copy(
        &self,
        component_id: ComponentId,
        transform: &ArtifactTransform,
    ) -> Result<Arc<LocalComponentMetadata>, MetadataError> {
        tracing::debug!(source = %self.component_id, target = %component_id, "copying component metadata");
        let copy = LocalComponentMetadata::new(
            self.module_version_id.clone(),
            component_id,
            self.status.clone(),
            self.attributes_schema.clone(),
            Arc::clone(&self.model),
            self.cells.clone(),
            self.builder.clone(),
        );

        // One memo for the entire copy: an artifact shared between variants
        // and configurations must map to a single transformed instance.
        let mut memoized = TransformedArtifacts::new(transform);
        for name in self.configuration_names() {
            let Some(configuration) = self.get_configuration(&name)? else {
                continue;
            };
            let copied = Arc::new(configuration.copy(&mut memoized)?);
            copy.add_configuration(copied);
        }

        Ok(copy)
    }

    /// Re-registers every currently known configuration from `provider`,
    /// discarding prior lazy entries.
    ///
    /// Used after the build model mutates the underlying declarations; names
    /// the provider no longer knows are left unregistered.
    pub fn reevaluate(&self, provider: &dyn ConfigurationsProvider) {
        for name in self.configuration_names() {
            match provider.find_by_name(&name) {
                Some(source) => self.register_configuration(source),
                None => {
                    tracing::warn!(configuration = %name, component = %self.component_id, "configuration disappeared during reevaluation");
                }
            }
        }
    }
}

impl fmt::Display for LocalComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.component_id.fmt(f)
    }
}

impl fmt::Debug for LocalComponentMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalComponentMetadata")
            .field("component_id", &self.component_id)
            .field("module_version_id", &self.module_version_id)
            .field("status", &self.status)
            .field("configurations", &self.configuration_names())
            .finish_non_exhaustive()
    }
}
