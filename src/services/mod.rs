//! Application services built on the domain ports.

pub mod scan_pipeline;
pub mod scan_session_store;
pub mod scan_sync;

pub use scan_pipeline::{placeholder_results, PipelineStep, ScanPipeline, PIPELINE_STEPS};
pub use scan_session_store::{ImportOutcome, ScanSessionStore};
pub use scan_sync::{ScanSyncService, SyncReport};
