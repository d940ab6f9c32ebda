//! Error handling for the metadata core
//!
//! The metadata model distinguishes three failure surfaces:
//!
//! 1. **Construction-time errors** — raised while a configuration's metadata is
//!    being built from its raw declarations (for example an unsupported
//!    dependency declaration kind). These surface immediately to whoever forced
//!    realization and are fatal to that configuration's metadata.
//! 2. **Resolution-time errors** — raised while an artifact cell computes its
//!    value. These are captured by the owning [`CalculatedValue`] and replayed
//!    verbatim to every past and future consumer of that cell.
//! 3. **Non-errors by contract** — an unknown configuration name and a missing
//!    named artifact are absence, not failure; they are reported through
//!    `Option` and [`ComponentArtifact::Missing`] respectively.
//!
//! [`CalculatedValue`]: crate::model::CalculatedValue
//! [`ComponentArtifact::Missing`]: crate::artifact::ComponentArtifact

use std::sync::Arc;
use thiserror::Error;

/// The error type for all fallible metadata operations.
///
/// Variants carry enough context to name the offending declaration or artifact
/// without holding onto live build-model objects, so an error captured inside a
/// lazy cell stays valid for the lifetime of the component.
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A raw dependency declaration was neither module-like nor
    /// file-collection-like.
    ///
    /// Fatal to the configuration being built; the build is not retried.
    #[error("cannot convert dependency {declaration} of configuration '{configuration}' to component dependency metadata")]
    UnsupportedDeclaration {
        /// Display name of the declaration that could not be converted
        declaration: String,
        /// Name of the configuration that declared it
        configuration: String,
    },

    /// The dependency descriptor factory rejected a module dependency
    /// declaration.
    #[error("failed to convert dependency {declaration} of configuration '{configuration}': {reason}")]
    DependencyConversion {
        /// Display name of the rejected declaration
        declaration: String,
        /// Name of the configuration that declared it
        configuration: String,
        /// Factory-supplied reason
        reason: String,
    },

    /// The exclude rule converter rejected an exclude rule.
    #[error("failed to convert exclude rule {rule}: {reason}")]
    ExcludeConversion {
        /// Display name of the rejected rule
        rule: String,
        /// Converter-supplied reason
        reason: String,
    },

    /// Resolving an artifact's location failed.
    ///
    /// Raised from inside an artifact cell computation, so it is replayed to
    /// every consumer of that cell.
    #[error("failed to resolve artifact {artifact}: {reason}")]
    ArtifactResolution {
        /// Display name of the artifact whose location could not be resolved
        artifact: String,
        /// Underlying reason
        reason: String,
    },

    /// A lazily registered configuration outlived its owning component.
    ///
    /// Lazy entries hold a weak reference back to the component; forcing one
    /// after the component was dropped cannot produce metadata.
    #[error("configuration '{configuration}' was realized after its owning component was released")]
    ComponentReleased {
        /// Name of the configuration whose realization was forced
        configuration: String,
    },

    /// The mutable-model boundary returned without running the supplied action.
    ///
    /// Indicates a broken `ModelContainer` implementation; the metadata model
    /// never observes a partially-run action.
    #[error("model boundary did not execute the exclusive action for {description}")]
    ModelBoundary {
        /// Description of the computation that requested the model lock
        description: String,
    },

    /// A deferred computation's closure was consumed without settling its cell.
    #[error("calculation '{description}' has no pending computation")]
    MissingComputation {
        /// Description of the affected cell
        description: String,
    },

    /// A previously captured failure, replayed to a later consumer.
    ///
    /// Lazy cells settle exactly once; every waiter after a failed computation
    /// receives the same shared error instance.
    #[error(transparent)]
    Shared(#[from] Arc<MetadataError>),
}

impl MetadataError {
    /// Walks through [`MetadataError::Shared`] wrappers to the originally
    /// captured failure.
    pub fn root(&self) -> &MetadataError {
        match self {
            MetadataError::Shared(inner) => inner.root(),
            other => other,
        }
    }
}
