use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for scanstore
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Where scan sessions are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Imaging backend connection
    #[serde(default)]
    pub backend: BackendConfig,

    /// Simulated prediction pipeline timing
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local, lost on exit
    Memory,
    /// One JSON file per key under `path`
    File,
    /// `SQLite` database at `path`
    Sqlite,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
            Self::Sqlite => "sqlite",
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    #[serde(default = "default_backend")]
    pub backend: StorageBackend,

    /// Directory (file backend) or database file (sqlite backend)
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,

    /// Key the session collection is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,

    /// Optional byte quota for the memory backend
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

const fn default_backend() -> StorageBackend {
    StorageBackend::File
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(".scanstore/data")
}

fn default_storage_key() -> String {
    "insightx_scan_sessions".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: default_storage_path(),
            key: default_storage_key(),
            quota_bytes: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

/// Imaging backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackendConfig {
    /// Base URL of the scan API, e.g. `http://localhost:8000`
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Simulated pipeline timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PipelineConfig {
    /// Delay before the first step, in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Delay between processing steps, in milliseconds
    #[serde(default = "default_step_delay_ms")]
    pub step_delay_ms: u64,

    /// Delay before the terminal update, in milliseconds
    #[serde(default = "default_finalize_delay_ms")]
    pub finalize_delay_ms: u64,
}

const fn default_initial_delay_ms() -> u64 {
    400
}

const fn default_step_delay_ms() -> u64 {
    600
}

const fn default_finalize_delay_ms() -> u64 {
    300
}

impl PipelineConfig {
    /// Zero delays, for tests.
    pub const fn immediate() -> Self {
        Self {
            initial_delay_ms: 0,
            step_delay_ms: 0,
            finalize_delay_ms: 0,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            step_delay_ms: default_step_delay_ms(),
            finalize_delay_ms: default_finalize_delay_ms(),
        }
    }
}
