//! Project initialization and storage wiring
//!
//! Handles:
//! - Configuration directory creation
//! - Default config file creation
//! - Opening the configured key-value backend

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::adapters::sqlite::{initialize_database_at, SqliteKeyValueStore};
use crate::adapters::{FileKeyValueStore, InMemoryKeyValueStore};
use crate::domain::models::{StorageBackend, StorageConfig};
use crate::domain::ports::KeyValueStore;
use crate::infrastructure::config::CONFIG_DIR;
use crate::services::ScanSessionStore;

/// Default configuration template content
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# scanstore configuration
# Override settings by editing this file, adding .scanstore/local.yaml,
# or setting environment variables with the SCANSTORE_ prefix
#
# Example environment variables:
#   export SCANSTORE_STORAGE__BACKEND=sqlite
#   export SCANSTORE_STORAGE__PATH=.scanstore/sessions.db
#   export SCANSTORE_LOGGING__LEVEL=debug
#   export SCANSTORE_BACKEND__BASE_URL=http://localhost:8000

# Session storage
storage:
  # Backend: memory, file, sqlite
  backend: "file"

  # Directory (file) or database file (sqlite)
  path: ".scanstore/data"

  # Key the session collection is stored under
  key: "insightx_scan_sessions"

# Logging configuration
logging:
  # Log level: trace, debug, info, warn, error
  level: "warn"

  # Log format: json, pretty
  format: "pretty"

# Imaging backend used by `scanstore sync`
backend:
  base_url: "http://localhost:8000"
  timeout_secs: 30

# Simulated prediction pipeline timing (milliseconds)
pipeline:
  initial_delay_ms: 400
  step_delay_ms: 600
  finalize_delay_ms: 300
"#;

/// Setup paths and directories
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
}

impl SetupPaths {
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let config_dir = root.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            data_dir: config_dir.join("data"),
            config_dir,
            root,
        }
    }

    /// Get setup paths for the current directory
    pub fn current() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::for_root(current_dir))
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Create the configuration and data directories, returning those newly created
pub fn create_config_dir(paths: &SetupPaths) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for dir in [&paths.config_dir, &paths.data_dir] {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            created.push(dir.strip_prefix(&paths.root).unwrap_or(dir).to_path_buf());
        }
    }
    Ok(created)
}

/// Write the default configuration file. Returns false if one exists and `force` is unset.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;

    Ok(true)
}

/// Open the key-value backend named by `config`
pub async fn open_key_value_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    debug!(backend = config.backend.as_str(), path = %config.path.display(), "opening storage");

    let storage: Arc<dyn KeyValueStore> = match config.backend {
        StorageBackend::Memory => match config.quota_bytes {
            Some(quota) => Arc::new(InMemoryKeyValueStore::with_quota(quota)),
            None => Arc::new(InMemoryKeyValueStore::new()),
        },
        StorageBackend::File => Arc::new(FileKeyValueStore::new(&config.path)),
        StorageBackend::Sqlite => {
            let pool = initialize_database_at(&config.path)
                .await
                .with_context(|| format!("Failed to open database at {}", config.path.display()))?;
            Arc::new(SqliteKeyValueStore::new(pool))
        }
    };

    Ok(storage)
}

/// Build a session store over the configured backend
pub async fn open_session_store(config: &StorageConfig) -> Result<ScanSessionStore> {
    let storage = open_key_value_store(config).await?;
    Ok(ScanSessionStore::with_key(storage, config.key.clone()))
}

/// Resolve `path` against the current directory when relative
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir().context("Failed to get current directory")?.join(path))
    }
}
