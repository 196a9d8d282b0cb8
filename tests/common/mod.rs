//! Common test utilities for integration tests
//!
//! Shared fixtures used across the integration test files.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;

use scanstore::{InMemoryKeyValueStore, ScanSessionStore};

/// Create a temporary directory for test isolation
///
/// Returns a TempDir that will be cleaned up when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A store over a fresh in-memory backend
pub fn memory_store() -> ScanSessionStore {
    ScanSessionStore::new(Arc::new(InMemoryKeyValueStore::new()))
}
