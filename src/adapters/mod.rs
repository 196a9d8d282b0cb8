//! Infrastructure adapters for storage and the imaging backend.

pub mod file;
pub mod http;
pub mod memory;
pub mod sqlite;

pub use file::FileKeyValueStore;
pub use http::HttpScanApiClient;
pub use memory::InMemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;
