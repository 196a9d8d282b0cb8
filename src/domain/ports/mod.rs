//! Port trait definitions (Hexagonal Architecture)
//!
//! - `KeyValueStore`: the storage slot the scan session store persists into
//! - `ScanApi`: the imaging backend's scan endpoints

pub mod key_value_store;
pub mod scan_api;

pub use key_value_store::{KeyValueStore, StorageError};
pub use scan_api::{ApiError, ScanApi, ScanListParams};
