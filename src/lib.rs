//! scanstore - scan session store for imaging prediction jobs
//!
//! Records each imaging prediction job (a "scan session") for a patient and
//! tracks it through `queued -> processing -> done | failed`. The whole
//! collection lives under one key of an injected key-value store, so the same
//! store runs over memory, JSON files or `SQLite`.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): session model, lifecycle rules, ports
//! - **Adapters** (`adapters`): key-value backends and the backend HTTP client
//! - **Service Layer** (`services`): the session store, simulated pipeline and backend sync
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging, project setup
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use scanstore::{InMemoryKeyValueStore, NewScanSession, ScanSessionPatch, ScanSessionStore, ScanType};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), scanstore::DomainError> {
//! let store = ScanSessionStore::new(Arc::new(InMemoryKeyValueStore::new()));
//! let session = store.create(NewScanSession::new("patient-7", ScanType::Brain)).await?;
//!
//! store
//!     .update(&session.id, ScanSessionPatch::done(serde_json::json!({"risk": "low"})))
//!     .await?;
//!
//! let latest = store.latest_done("patient-7", ScanType::Brain).await;
//! assert_eq!(latest.map(|s| s.id), Some(session.id));
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::{FileKeyValueStore, HttpScanApiClient, InMemoryKeyValueStore, SqliteKeyValueStore};
pub use domain::models::{
    ApiScan, Config, Modality, NewScanSession, ScanSession, ScanSessionPatch, ScanStatus, ScanType,
};
pub use domain::ports::{ApiError, KeyValueStore, ScanApi, StorageError};
pub use domain::{DomainError, DomainResult};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{ImportOutcome, ScanPipeline, ScanSessionStore, ScanSyncService, SyncReport};
