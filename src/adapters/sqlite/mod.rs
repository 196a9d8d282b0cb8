//! SQLite storage adapter for the scan session store.

pub mod connection;
pub mod key_value_store;
pub mod migrations;

pub use connection::{open_file_pool, open_memory_pool, verify_connection, ConnectionError};
pub use key_value_store::SqliteKeyValueStore;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};

use sqlx::SqlitePool;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open (creating if needed) the database file at `path` with migrations applied.
pub async fn initialize_database_at(path: &Path) -> Result<SqlitePool, DatabaseError> {
    let pool = open_file_pool(path).await?;
    verify_connection(&pool).await?;
    migrate(pool).await
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    migrate(open_memory_pool().await?).await
}

async fn migrate(pool: SqlitePool) -> Result<SqlitePool, DatabaseError> {
    Migrator::new(pool.clone())
        .run_embedded_migrations(all_embedded_migrations())
        .await?;
    Ok(pool)
}
