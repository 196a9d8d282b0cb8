//! Integration tests for the key-value storage backends
//!
//! Each backend must behave identically behind the `KeyValueStore` port.

use std::sync::Arc;

use scanstore::adapters::sqlite::initialize_database_at;
use scanstore::domain::models::{StorageBackend, StorageConfig};
use scanstore::infrastructure::setup::open_session_store;
use scanstore::{FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, NewScanSession, ScanType, SqliteKeyValueStore};

mod common;

async fn exercise_contract(store: &dyn KeyValueStore) {
    assert_eq!(store.get("sessions").await.unwrap(), None);

    store.set("sessions", "[1]").await.unwrap();
    store.set("sessions", "[1,2]").await.unwrap();
    assert_eq!(store.get("sessions").await.unwrap().as_deref(), Some("[1,2]"));

    store.set("other", "{}").await.unwrap();
    store.remove("sessions").await.unwrap();
    assert_eq!(store.get("sessions").await.unwrap(), None);
    assert_eq!(store.get("other").await.unwrap().as_deref(), Some("{}"));

    // Removing a missing key is not an error
    store.remove("sessions").await.unwrap();
}

#[tokio::test]
async fn test_memory_backend_contract() {
    exercise_contract(&InMemoryKeyValueStore::new()).await;
}

#[tokio::test]
async fn test_file_backend_contract() {
    let dir = common::temp_dir();
    exercise_contract(&FileKeyValueStore::new(dir.path().join("kv"))).await;
}

#[tokio::test]
async fn test_sqlite_backend_contract() {
    let dir = common::temp_dir();
    let pool = initialize_database_at(&dir.path().join("kv.db")).await.unwrap();
    exercise_contract(&SqliteKeyValueStore::new(pool)).await;
}

#[tokio::test]
async fn test_sqlite_backend_survives_reopen() {
    let dir = common::temp_dir();
    let config = StorageConfig {
        backend: StorageBackend::Sqlite,
        path: dir.path().join("nested").join("sessions.db"),
        ..Default::default()
    };

    let created = {
        let store = open_session_store(&config).await.unwrap();
        store.create(NewScanSession::new("p-1", ScanType::Brain)).await.unwrap()
    };

    let reopened = open_session_store(&config).await.unwrap();
    assert_eq!(reopened.list("p-1", None).await, vec![created]);
}

#[tokio::test]
async fn test_custom_key_shares_backend_without_collision() {
    let dir = common::temp_dir();
    let mut config = StorageConfig {
        backend: StorageBackend::File,
        path: dir.path().to_path_buf(),
        ..Default::default()
    };

    let default_store = open_session_store(&config).await.unwrap();
    config.key = "archived_sessions".to_string();
    let archive_store = open_session_store(&config).await.unwrap();

    archive_store.create(NewScanSession::new("p-1", ScanType::Heart)).await.unwrap();

    assert!(default_store.all().await.is_empty());
    assert_eq!(archive_store.all().await.len(), 1);
    assert!(dir.path().join("archived_sessions.json").exists());
}

#[tokio::test]
async fn test_quota_backend_keeps_last_good_state() {
    let storage = Arc::new(InMemoryKeyValueStore::with_quota(400));
    let store = scanstore::ScanSessionStore::new(storage);

    let mut created = 0;
    for _ in 0..10 {
        store.create(NewScanSession::new("p-1", ScanType::Brain)).await.unwrap();
        created += 1;
    }

    let persisted = store.all().await.len();
    assert!(persisted < created, "quota should have dropped later writes");
    assert!(persisted >= 1);
}
