//! Component-scoped artifact metadata
//!
//! Configurations and variants declare artifacts as [`ArtifactSource`]s —
//! live objects whose file location may only be known after producing build
//! actions run. Resolution wraps each source into a [`LocalArtifactMetadata`]
//! snapshot scoped to the owning component; the wrap happens under the
//! mutable-model lock because asking a source for its file may evaluate those
//! actions.
//!
//! Artifact *identity* is the pair (owning component, source instance). Two
//! metadata values wrapping the same source for the same component compare
//! equal even if resolved separately, which is what lets hierarchy unions
//! deduplicate an artifact reachable through several configurations. Copy
//! transforms, by contrast, are memoized per *instance* (pointer identity, see
//! [`TransformedArtifacts`]): distinct instances may be value-equal yet must
//! be transformed independently.

use crate::core::{ComponentId, MetadataError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The name parts of an artifact: base name, kind, and optional extension and
/// classifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactName {
    /// Base name of the artifact.
    pub name: String,
    /// Kind of artifact (for example `jar`, `zip`, `directory`).
    pub kind: String,
    /// File extension, if any.
    pub extension: Option<String>,
    /// Classifier distinguishing auxiliary artifacts (`sources`, `javadoc`).
    pub classifier: Option<String>,
}

impl ArtifactName {
    /// An artifact name whose kind doubles as the extension.
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: name.into(),
            extension: Some(kind.clone()),
            kind,
            classifier: None,
        }
    }

    /// Returns this name with the given classifier.
    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }
}

impl fmt::Display for ArtifactName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(classifier) = &self.classifier {
            write!(f, "-{classifier}")?;
        }
        if let Some(extension) = &self.extension {
            write!(f, ".{extension}")?;
        }
        Ok(())
    }
}

/// A declared, publishable artifact as exposed by the build DSL.
///
/// Sources are live: [`ArtifactSource::file`] may need to evaluate the
/// producing action to learn the location, so it must only be called while
/// the mutable-model lock is held.
pub trait ArtifactSource: Send + Sync + fmt::Debug {
    /// The artifact's name parts.
    fn name(&self) -> ArtifactName;

    /// The artifact's file location.
    ///
    /// Only call under [`ModelContainer::run_exclusive`].
    ///
    /// [`ModelContainer::run_exclusive`]: crate::model::ModelContainer::run_exclusive
    fn file(&self) -> Result<PathBuf, MetadataError>;
}

/// An artifact resolved into the scope of its owning component.
///
/// Equality and hashing follow (component id, source instance), not the
/// resolved values, so unioning ancestor artifact lists deduplicates an
/// artifact however many configurations reach it.
#[derive(Debug, Clone)]
pub struct LocalArtifactMetadata {
    component_id: ComponentId,
    name: ArtifactName,
    file: PathBuf,
    source: Arc<dyn ArtifactSource>,
}

impl LocalArtifactMetadata {
    /// Resolve `source` into component scope.
    ///
    /// Asks the source for its file location; the caller must hold the
    /// mutable-model lock.
    pub fn resolve(
        component_id: &ComponentId,
        source: &Arc<dyn ArtifactSource>,
    ) -> Result<Self, MetadataError> {
        let name = source.name();
        let file = source.file()?;
        Ok(Self {
            component_id: component_id.clone(),
            name,
            file,
            source: Arc::clone(source),
        })
    }

    /// The owning component's identity.
    pub fn component_id(&self) -> &ComponentId {
        &self.component_id
    }

    /// The artifact's name parts.
    pub fn name(&self) -> &ArtifactName {
        &self.name
    }

    /// The resolved file location.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Returns a metadata value identical to this one but located at `file`.
    ///
    /// This is the building block of copy transforms that relocate artifacts
    /// for out-of-process persistence.
    pub fn relocated(&self, file: impl Into<PathBuf>) -> Self {
        Self {
            component_id: self.component_id.clone(),
            name: self.name.clone(),
            file: file.into(),
            source: Arc::clone(&self.source),
        }
    }

    fn source_ptr(&self) -> *const () {
        Arc::as_ptr(&self.source) as *const ()
    }
}

impl PartialEq for LocalArtifactMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.component_id == other.component_id && self.source_ptr() == other.source_ptr()
    }
}

impl Eq for LocalArtifactMetadata {}

impl Hash for LocalArtifactMetadata {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.component_id.hash(state);
        self.source_ptr().hash(state);
    }
}

impl fmt::Display for LocalArtifactMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.component_id)
    }
}

/// Result of looking up an artifact by name on a configuration.
///
/// A failed lookup is not an error: the missing case carries the owning
/// component's id and the requested name so a later consumer can raise a
/// richer diagnostic, while resolution itself may continue.
#[derive(Debug, Clone)]
pub enum ComponentArtifact {
    /// The named artifact, as resolved.
    Present(Arc<LocalArtifactMetadata>),
    /// No artifact by that name exists on the configuration.
    Missing {
        /// The component the lookup ran against.
        component_id: ComponentId,
        /// The name that was requested.
        requested: ArtifactName,
    },
}

impl ComponentArtifact {
    /// Whether the lookup found an artifact.
    pub fn is_present(&self) -> bool {
        matches!(self, ComponentArtifact::Present(_))
    }

    /// Whether the lookup came back empty.
    pub fn is_missing(&self) -> bool {
        !self.is_present()
    }

    /// The artifact name: the resolved name when present, the requested name
    /// otherwise.
    pub fn name(&self) -> &ArtifactName {
        match self {
            ComponentArtifact::Present(artifact) => artifact.name(),
            ComponentArtifact::Missing { requested, .. } => requested,
        }
    }

    /// The resolved artifact, if present.
    pub fn into_present(self) -> Option<Arc<LocalArtifactMetadata>> {
        match self {
            ComponentArtifact::Present(artifact) => Some(artifact),
            ComponentArtifact::Missing { .. } => None,
        }
    }
}

impl fmt::Display for ComponentArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentArtifact::Present(artifact) => artifact.fmt(f),
            ComponentArtifact::Missing {
                component_id,
                requested,
            } => write!(f, "{requested} (missing from {component_id})"),
        }
    }
}

/// An artifact transform memoized by instance identity.
///
/// A given artifact instance may be referenced by several variants and
/// configurations of the same component; during a copy it must be transformed
/// exactly once, with the single transformed instance reused everywhere the
/// original appeared. The memo is keyed by pointer identity — value equality
/// would wrongly unify distinct instances that happen to compare equal.
pub struct TransformedArtifacts<'a> {
    transform: &'a ArtifactTransform,
    memo: HashMap<*const LocalArtifactMetadata, Arc<LocalArtifactMetadata>>,
}

/// Transform applied to each artifact during a component copy.
pub type ArtifactTransform = dyn Fn(&Arc<LocalArtifactMetadata>) -> Arc<LocalArtifactMetadata>;

impl<'a> TransformedArtifacts<'a> {
    /// Wrap `transform` with a fresh, empty memo.
    pub fn new(transform: &'a ArtifactTransform) -> Self {
        Self {
            transform,
            memo: HashMap::new(),
        }
    }

    /// Transform `artifact`, reusing the memoized result if this exact
    /// instance was transformed before.
    pub fn apply(&mut self, artifact: &Arc<LocalArtifactMetadata>) -> Arc<LocalArtifactMetadata> {
        let key = Arc::as_ptr(artifact);
        if let Some(transformed) = self.memo.get(&key) {
            return Arc::clone(transformed);
        }
        let transformed = (self.transform)(artifact);
        self.memo.insert(key, Arc::clone(&transformed));
        transformed
    }
}

/// Wrap every source into component scope, deduplicating by identity and
/// keeping declaration order. Caller must hold the mutable-model lock.
pub(crate) fn resolve_sources(
    component_id: &ComponentId,
    sources: &[Arc<dyn ArtifactSource>],
) -> Result<Vec<Arc<LocalArtifactMetadata>>, MetadataError> {
    let mut resolved: Vec<Arc<LocalArtifactMetadata>> = Vec::with_capacity(sources.len());
    for source in sources {
        let artifact = Arc::new(LocalArtifactMetadata::resolve(component_id, source)?);
        if !resolved.contains(&artifact) {
            resolved.push(artifact);
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedSource {
        name: ArtifactName,
        file: PathBuf,
    }

    impl ArtifactSource for FixedSource {
        fn name(&self) -> ArtifactName {
            self.name.clone()
        }

        fn file(&self) -> Result<PathBuf, MetadataError> {
            Ok(self.file.clone())
        }
    }

    fn source(name: &str) -> Arc<dyn ArtifactSource> {
        Arc::new(FixedSource {
            name: ArtifactName::new(name, "jar"),
            file: PathBuf::from(format!("/build/libs/{name}.jar")),
        })
    }

    #[test]
    fn test_artifact_name_display() {
        let name = ArtifactName::new("core", "jar").with_classifier("sources");
        assert_eq!(name.to_string(), "core-sources.jar");
    }

    #[test]
    fn test_identity_follows_component_and_source() {
        let component = ComponentId::new("project :core");
        let other_component = ComponentId::new("project :app");
        let shared = source("core");

        let a = Arc::new(LocalArtifactMetadata::resolve(&component, &shared).unwrap());
        let b = Arc::new(LocalArtifactMetadata::resolve(&component, &shared).unwrap());
        let c = Arc::new(LocalArtifactMetadata::resolve(&other_component, &shared).unwrap());
        let d = Arc::new(LocalArtifactMetadata::resolve(&component, &source("core")).unwrap());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn test_resolve_sources_deduplicates_repeated_source() {
        let component = ComponentId::new("project :core");
        let shared = source("core");
        let other = source("extra");

        let resolved =
            resolve_sources(&component, &[shared.clone(), other, shared]).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].name().name, "core");
        assert_eq!(resolved[1].name().name, "extra");
    }

    #[test]
    fn test_transform_memo_is_keyed_by_instance_identity() {
        let component = ComponentId::new("project :core");
        let shared = source("core");

        // Two value-equal but distinct instances.
        let first = Arc::new(LocalArtifactMetadata::resolve(&component, &shared).unwrap());
        let second = Arc::new(LocalArtifactMetadata::resolve(&component, &shared).unwrap());
        assert_eq!(first, second);

        let transform: Box<ArtifactTransform> =
            Box::new(|artifact| Arc::new(artifact.relocated("/cache/relocated.jar")));
        let mut memoized = TransformedArtifacts::new(&transform);

        let first_out = memoized.apply(&first);
        let first_again = memoized.apply(&first);
        let second_out = memoized.apply(&second);

        // Same instance in, same transformed instance out.
        assert!(Arc::ptr_eq(&first_out, &first_again));
        // Value-equal but distinct input instances transform independently.
        assert!(!Arc::ptr_eq(&first_out, &second_out));
    }

    #[test]
    fn test_missing_artifact_carries_lookup_context() {
        let missing = ComponentArtifact::Missing {
            component_id: ComponentId::new("project :core"),
            requested: ArtifactName::new("docs", "zip"),
        };
        assert!(missing.is_missing());
        assert_eq!(missing.to_string(), "docs.zip (missing from project :core)");
        assert!(missing.into_present().is_none());
    }
}
