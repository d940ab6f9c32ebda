//! Mortar — local component metadata model
//!
//! This crate is the metadata core of Mortar's dependency-resolution engine.
//! For each in-workspace ("local") component it synthesizes, per declared
//! configuration, the dependency, exclude, and file sets, artifact sets,
//! variants, and capability identities that the downstream graph-resolution
//! algorithm consumes when building a dependency graph.
//!
//! # Architecture Overview
//!
//! Configurations form an inheritance hierarchy, realization is expensive and
//! must run at most once, and the whole structure must survive an
//! identity-preserving copy for out-of-process persistence. The model is
//! built accordingly:
//!
//! - A [`component::LocalComponentMetadata`] registers configurations lazily
//!   (name → deferred metadata). On first access a
//!   [`component::ConfigurationMetadataBuilder`] realizes the configuration
//!   from its raw declarations, consulting already-realized ancestors for the
//!   hierarchy-aggregated views.
//! - Artifacts resolve even later, on demand, through a second deferred cell
//!   nested inside each configuration and variant; resolving a location may
//!   evaluate producing build actions, so it always runs under the
//!   [`model::ModelContainer`] exclusive boundary.
//! - [`component::LocalComponentMetadata::copy`] cascades depth-first with a
//!   single identity-keyed transform memo, so an artifact referenced from
//!   several variants maps to one transformed instance everywhere.
//!
//! # Core Modules
//!
//! - [`core`] - Identity values, status scheme, and the crate error type
//! - [`model`] - Compute-once deferred values and the mutable-model boundary
//! - [`attributes`] - Immutable attribute sets and well-known attribute names
//! - [`capability`] - Capability identities and shadow composition
//! - [`declarations`] - Raw configuration sources and declaration values
//! - [`dependency`] - Dependency, file-dependency, and exclude metadata
//! - [`artifact`] - Component-scoped artifacts and the copy transform memo
//! - [`component`] - Component, configuration, variant metadata and builder
//!
//! # Concurrency
//!
//! Registration is single-threaded by contract and finishes before resolution
//! starts; afterwards any number of threads may read concurrently. The only
//! blocking primitive is the deferred cell: a thread forcing a cell already
//! being computed blocks until the computation settles, and the settled
//! outcome — value or error — is replayed to every caller forever.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mortar_metadata::attributes::AttributesSchema;
//! use mortar_metadata::component::{ConfigurationMetadataBuilder, LocalComponentMetadata};
//! use mortar_metadata::core::{ComponentId, ModuleVersionId, DEFAULT_STATUS};
//! use mortar_metadata::dependency::{
//!     DefaultDependencyDescriptorFactory, DefaultExcludeRuleConverter,
//! };
//! use mortar_metadata::model::{CalculatedValueFactory, LockedModel};
//!
//! let component = LocalComponentMetadata::new(
//!     ModuleVersionId::new("org.example", "app", "1.0"),
//!     ComponentId::new("project :app"),
//!     DEFAULT_STATUS,
//!     AttributesSchema::new(),
//!     Arc::new(LockedModel::new()),
//!     CalculatedValueFactory::new(),
//!     ConfigurationMetadataBuilder::new(
//!         Arc::new(DefaultDependencyDescriptorFactory),
//!         Arc::new(DefaultExcludeRuleConverter),
//!     ),
//! );
//!
//! // Raw configurations are registered during project evaluation and
//! // realized lazily on first read.
//! assert!(component.get_configuration("runtime").unwrap().is_none());
//! ```

pub mod artifact;
pub mod attributes;
pub mod capability;
pub mod component;
pub mod core;
pub mod declarations;
pub mod dependency;
pub mod model;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
