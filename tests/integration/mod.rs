//! Integration test suite for mortar-metadata
//!
//! End-to-end tests exercising the component metadata model through its
//! public surface, with stub collaborators from the crate's `test-utils`
//! feature standing in for the build model.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! Tests are organized by functionality area:
//! - **lifecycle**: Registration, lazy realization, and reevaluation flows
//! - **concurrency**: Parallel realization and artifact preparation
//! - **copy_semantics**: Identity-preserving copy with memoized transforms

mod concurrency;
mod copy_semantics;
mod lifecycle;

use std::sync::Once;

static TRACING: Once = Once::new();

/// Install a fmt subscriber honoring `RUST_LOG` so failing tests can be
/// re-run with realization diagnostics.
pub(crate) fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
