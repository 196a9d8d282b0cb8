pub mod api_scan;
pub mod config;
pub mod scan_session;

pub use api_scan::{ApiId, ApiScan, ApiScanUpdate, ScanSummary};
pub use config::{
    BackendConfig, Config, LoggingConfig, PipelineConfig, StorageBackend, StorageConfig,
};
pub use scan_session::{
    Modality, NewScanSession, ScanSession, ScanSessionPatch, ScanStatus, ScanType,
};
