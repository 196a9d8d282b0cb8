//! Integration tests for the scan session store
//!
//! Drives the public store API over real backends and checks the
//! externally visible guarantees: ordering, persistence across reopen,
//! the stored JSON shape and the job lifecycle.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

use scanstore::domain::models::Modality;
use scanstore::{
    DomainError, FileKeyValueStore, ImportOutcome, InMemoryKeyValueStore, KeyValueStore, NewScanSession,
    ScanSession, ScanSessionPatch, ScanSessionStore, ScanStatus, ScanType,
};

mod common;

#[tokio::test]
async fn test_full_job_lifecycle() {
    common::setup_test_logging();
    let store = common::memory_store();

    let session = store
        .create(
            NewScanSession::new("patient-1", ScanType::Brain)
                .with_file_name("head.dcm")
                .with_modality(Modality::Mri),
        )
        .await
        .unwrap();
    assert_eq!(session.status, ScanStatus::Queued);
    assert_eq!(session.progress, 0);

    for progress in [25, 60, 90] {
        let updated = store
            .update(&session.id, ScanSessionPatch::progress(ScanStatus::Processing, progress))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.progress, progress);
    }
    assert!(store.latest_done("patient-1", ScanType::Brain).await.is_none());

    let done = store
        .update(&session.id, ScanSessionPatch::done(json!({"finding": "none"})))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.status, ScanStatus::Done);
    assert_eq!(done.progress, 100);
    assert_eq!(done.file_name.as_deref(), Some("head.dcm"));

    let reviewed = store
        .update(&session.id, ScanSessionPatch::new().with_review_status("reviewed"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reviewed.data, Some(json!({"finding": "none"})));
    assert_eq!(reviewed.review_status.as_deref(), Some("reviewed"));

    let err = store
        .update(&session.id, ScanSessionPatch::failed("late failure"))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::TerminalSession { .. }));

    assert_eq!(store.latest_done("patient-1", ScanType::Brain).await, Some(reviewed));
}

#[tokio::test]
async fn test_file_backend_survives_reopen() {
    let dir = common::temp_dir();
    let path = dir.path().join("data");

    let created = {
        let store = ScanSessionStore::new(Arc::new(FileKeyValueStore::new(&path)));
        store.create(NewScanSession::new("p-9", ScanType::Heart)).await.unwrap()
    };

    let reopened = ScanSessionStore::new(Arc::new(FileKeyValueStore::new(&path)));
    assert_eq!(reopened.get(&created.id).await, Some(created));
}

#[tokio::test]
async fn test_stored_json_shape() {
    let dir = common::temp_dir();
    let storage = Arc::new(FileKeyValueStore::new(dir.path()));
    let store = ScanSessionStore::new(storage.clone());

    let session = store
        .create(NewScanSession::new("p-1", ScanType::Heart).with_notes("follow-up"))
        .await
        .unwrap();

    let raw = storage.get(ScanSessionStore::DEFAULT_KEY).await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let record = &value.as_array().unwrap()[0];

    assert_eq!(record["id"], session.id.as_str());
    assert_eq!(record["patientId"], "p-1");
    assert_eq!(record["type"], "heart");
    assert_eq!(record["status"], "queued");
    assert_eq!(record["notes"], "follow-up");
    assert!(record["createdAt"].is_string());
    assert!(record.get("data").is_none(), "unset optionals are omitted");
}

#[tokio::test]
async fn test_reads_records_written_by_other_clients() {
    let dir = common::temp_dir();
    let storage = Arc::new(FileKeyValueStore::new(dir.path()));
    let raw = json!([
        {
            "id": "legacy-1",
            "patientId": "p-3",
            "type": "brain",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "fileName": "scan.png",
            "modality": "MRI",
            "status": "done",
            "progress": 100,
            "data": {"scanId": "B-UP-1"}
        }
    ]);
    storage
        .set(ScanSessionStore::DEFAULT_KEY, &raw.to_string())
        .await
        .unwrap();

    let store = ScanSessionStore::new(storage);
    let latest = store.latest_done("p-3", ScanType::Brain).await.unwrap();
    assert_eq!(latest.id, "legacy-1");
    assert_eq!(latest.modality, Some(Modality::Mri));
    assert_eq!(latest.created_at, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());
}

#[tokio::test]
async fn test_round_trip_preserves_every_field() {
    let store = common::memory_store();
    let original = store
        .create(
            NewScanSession::new("p-2", ScanType::Heart)
                .with_file_name("echo.mp4")
                .with_modality(Modality::Other)
                .with_notes("n")
                .with_status(ScanStatus::Failed)
                .with_progress(100)
                .with_error("timeout"),
        )
        .await
        .unwrap();

    let fetched = store.get(&original.id).await.unwrap();
    assert_eq!(fetched, original);
    assert_eq!(store.list("p-2", None).await, vec![original]);
}

#[tokio::test]
async fn test_null_results_payload_round_trips() {
    let dir = common::temp_dir();
    let store = ScanSessionStore::new(Arc::new(FileKeyValueStore::new(dir.path())));

    let queued = store.create(NewScanSession::new("p-4", ScanType::Brain)).await.unwrap();
    let done = store
        .update(&queued.id, ScanSessionPatch::done(serde_json::Value::Null))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(done.data, Some(serde_json::Value::Null));
    assert_eq!(store.get(&done.id).await, Some(done.clone()));

    let created = store
        .create(
            NewScanSession::new("p-4", ScanType::Heart)
                .with_status(ScanStatus::Done)
                .with_progress(100)
                .with_data(json!(null)),
        )
        .await
        .unwrap();
    assert_eq!(store.get(&created.id).await, Some(created.clone()));

    assert_eq!(store.import(done).await, ImportOutcome::Unchanged);
    assert_eq!(store.import(created).await, ImportOutcome::Unchanged);
}

#[tokio::test]
async fn test_stale_writer_gets_concurrency_conflict() {
    let storage = Arc::new(InMemoryKeyValueStore::new());
    let first_tab = ScanSessionStore::new(storage.clone());
    let second_tab = ScanSessionStore::new(storage);

    let session = first_tab
        .create(NewScanSession::new("p-5", ScanType::Heart))
        .await
        .unwrap();
    let seen_by_second = second_tab.get(&session.id).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    first_tab
        .update(&session.id, ScanSessionPatch::progress(ScanStatus::Processing, 40))
        .await
        .unwrap()
        .unwrap();

    let err = second_tab
        .update(
            &session.id,
            ScanSessionPatch::progress(ScanStatus::Processing, 10).expecting(seen_by_second.last_modified()),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ConcurrencyConflict { ref id, .. } if *id == session.id));
    assert_eq!(second_tab.get(&session.id).await.unwrap().progress, 40);

    let fresh = second_tab.get(&session.id).await.unwrap();
    let updated = second_tab
        .update(
            &session.id,
            ScanSessionPatch::progress(ScanStatus::Processing, 70).expecting(fresh.last_modified()),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.progress, 70);
    assert_eq!(first_tab.get(&session.id).await.unwrap().progress, 70);
}

fn session_at(index: usize, offset_secs: i64) -> ScanSession {
    let base = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    ScanSession::with_id(
        format!("s{index}"),
        base + Duration::seconds(offset_secs),
        NewScanSession::new("p-1", ScanType::Brain),
    )
}

fn insertion_index(session: &ScanSession) -> usize {
    session.id[1..].parse().unwrap()
}

proptest! {
    /// Listing is newest-first; equal timestamps list the later insertion first.
    #[test]
    fn proptest_list_order(offsets in prop::collection::vec(0i64..5, 0..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let listed = runtime.block_on(async {
            let store = common::memory_store();
            for (index, offset) in offsets.iter().enumerate() {
                store.import(session_at(index, *offset)).await;
            }
            store.list("p-1", None).await
        });

        prop_assert_eq!(listed.len(), offsets.len());
        for pair in listed.windows(2) {
            prop_assert!(pair[0].created_at >= pair[1].created_at);
            if pair[0].created_at == pair[1].created_at {
                prop_assert!(insertion_index(&pair[0]) > insertion_index(&pair[1]));
            }
        }
    }

    /// Progress never goes down, whatever sequence of updates is attempted.
    #[test]
    fn proptest_progress_is_monotonic(requests in prop::collection::vec(0u8..=120, 1..15)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let observed = runtime.block_on(async {
            let store = common::memory_store();
            let session = store.create(NewScanSession::new("p-1", ScanType::Heart)).await.unwrap();
            let mut observed = Vec::new();
            for progress in requests {
                let _ = store
                    .update(&session.id, ScanSessionPatch::progress(ScanStatus::Processing, progress))
                    .await;
                observed.push(store.get(&session.id).await.unwrap().progress);
            }
            observed
        });

        for pair in observed.windows(2) {
            prop_assert!(pair[0] <= pair[1]);
        }
        prop_assert!(observed.iter().all(|p| *p <= 100));
    }
}
