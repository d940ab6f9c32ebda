//! Deferred values and the mutable-model execution boundary
//!
//! Realizing configuration metadata and resolving artifact locations are
//! expensive, may run on any of several resolution threads, and must happen at
//! most once. This module provides the two primitives the rest of the crate
//! builds on:
//!
//! - [`CalculatedValue`] — a single-slot, compute-once, thread-safe deferred
//!   value. `get` triggers the computation on first use, blocks concurrent
//!   callers while it runs, and replays the settled outcome (value or error)
//!   to every caller forever after.
//! - [`ModelContainer`] — the one legal way to touch the surrounding mutable
//!   build model. Resolving an artifact's location may evaluate producing
//!   actions, and that model is a process-wide resource; all such access goes
//!   through [`ModelContainer::run_exclusive`], never through ambient state.
//!
//! [`CalculatedValueFactory`] is the seam through which embedders control cell
//! construction (for example to attach scheduling or diagnostics); the default
//! factory builds plain in-process cells.

use crate::core::MetadataError;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

type Compute<T> = Box<dyn FnOnce() -> Result<T, MetadataError> + Send>;

/// A single-slot, compute-once, thread-safe deferred value.
///
/// The cell moves through `Unstarted → Computing → Complete | Failed` and
/// settles exactly once. A caller forcing a cell that another thread is
/// already computing blocks until that computation settles; every caller,
/// including ones arriving after settlement, observes the same value or the
/// same error. Failures are captured and replayed verbatim — never silently
/// retried — so no partial state can leak.
pub struct CalculatedValue<T> {
    description: String,
    compute: Mutex<Option<Compute<T>>>,
    cell: OnceLock<Result<T, Arc<MetadataError>>>,
}

impl<T> CalculatedValue<T> {
    fn new(description: String, compute: Compute<T>) -> Self {
        Self {
            description,
            compute: Mutex::new(Some(compute)),
            cell: OnceLock::new(),
        }
    }

    fn finalized(description: String, value: T) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Ok(value));
        Self {
            description,
            compute: Mutex::new(None),
            cell,
        }
    }

    /// Human-readable description of what this cell computes, used in
    /// diagnostics.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the value, computing it first if this cell is unstarted.
    ///
    /// Blocks while another thread is computing. After a failed computation
    /// every call returns the same captured error.
    pub fn get(&self) -> Result<&T, MetadataError> {
        match self.force() {
            Ok(value) => Ok(value),
            Err(shared) => Err(MetadataError::Shared(Arc::clone(shared))),
        }
    }

    /// Triggers the computation without consuming the outcome.
    ///
    /// Supports speculative warm-up: a failure is captured for later `get`
    /// calls rather than surfaced here. Idempotent.
    pub fn finalize_if_not_already(&self) {
        let _ = self.force();
    }

    /// Whether this cell has settled (successfully or not).
    pub fn is_finalized(&self) -> bool {
        self.cell.get().is_some()
    }

    fn force(&self) -> &Result<T, Arc<MetadataError>> {
        self.cell.get_or_init(|| {
            tracing::debug!(cell = %self.description, "computing deferred value");
            let compute = self
                .compute
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let outcome = match compute {
                Some(compute) => compute().map_err(Arc::new),
                None => Err(Arc::new(MetadataError::MissingComputation {
                    description: self.description.clone(),
                })),
            };
            if let Err(error) = &outcome {
                tracing::debug!(cell = %self.description, %error, "deferred value failed");
            }
            outcome
        })
    }
}

impl<T> fmt::Debug for CalculatedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.cell.get() {
            Some(Ok(_)) => "complete",
            Some(Err(_)) => "failed",
            None => "unstarted",
        };
        f.debug_struct("CalculatedValue")
            .field("description", &self.description)
            .field("state", &state)
            .finish()
    }
}

/// Constructs [`CalculatedValue`] cells.
///
/// Passed explicitly to the component so embedders hold one construction seam
/// for every deferred value the metadata model creates.
#[derive(Debug, Clone, Default)]
pub struct CalculatedValueFactory;

impl CalculatedValueFactory {
    /// A factory producing plain in-process cells.
    pub fn new() -> Self {
        Self
    }

    /// Create an unstarted cell that runs `compute` on first use.
    pub fn create<T>(
        &self,
        description: impl Into<String>,
        compute: impl FnOnce() -> Result<T, MetadataError> + Send + 'static,
    ) -> CalculatedValue<T> {
        CalculatedValue::new(description.into(), Box::new(compute))
    }

    /// Create a cell already settled with `value`.
    ///
    /// Used when realized metadata is restored from persistence or produced by
    /// a copy, where no computation remains to defer.
    pub fn create_finalized<T>(
        &self,
        description: impl Into<String>,
        value: T,
    ) -> CalculatedValue<T> {
        CalculatedValue::finalized(description.into(), value)
    }
}

/// The exclusive-execution boundary of the surrounding mutable build model.
///
/// Artifact resolution may evaluate producing actions, and the build model is
/// shared by the entire process; implementations serialize all such access.
/// Acquisition must be reentrant for the owning thread: resolving a
/// configuration's artifacts resolves its ancestors' artifacts while the lock
/// is already held.
pub trait ModelContainer: Send + Sync {
    /// Runs `action` while holding the model's exclusive lock.
    ///
    /// Implementations must invoke `action` exactly once before returning.
    fn run_exclusive<'a>(&self, action: Box<dyn FnOnce() + 'a>);
}

impl dyn ModelContainer {
    /// Runs `action` under the model lock and returns its result.
    ///
    /// Fails with [`MetadataError::ModelBoundary`] if the implementation
    /// violates the run-exactly-once contract.
    pub fn from_exclusive<R>(
        &self,
        description: &str,
        action: impl FnOnce() -> R,
    ) -> Result<R, MetadataError> {
        let mut result = None;
        self.run_exclusive(Box::new(|| result = Some(action())));
        result.ok_or_else(|| MetadataError::ModelBoundary {
            description: description.to_string(),
        })
    }
}

/// In-process [`ModelContainer`] backed by a reentrant lock.
///
/// Suitable for tests and embedders without a richer build-model lock.
#[derive(Debug, Default)]
pub struct LockedModel {
    lock: parking_lot::ReentrantMutex<()>,
}

impl LockedModel {
    /// Create an unlocked model boundary.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelContainer for LockedModel {
    fn run_exclusive<'a>(&self, action: Box<dyn FnOnce() + 'a>) {
        let _guard = self.lock.lock();
        action();
    }
}
