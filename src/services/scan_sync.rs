//! Pulls backend scan records into the local session store.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::ports::{ApiError, ScanApi, ScanListParams};
use crate::services::{ImportOutcome, ScanSessionStore};

/// Counts from one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub patient_id: String,
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Mirrors the backend's scans for a patient into the local store.
///
/// The backend is the record of truth: mapped records replace local ones
/// with the same id. Local-only sessions are left alone.
pub struct ScanSyncService {
    store: Arc<ScanSessionStore>,
    api: Arc<dyn ScanApi>,
}

impl ScanSyncService {
    pub fn new(store: Arc<ScanSessionStore>, api: Arc<dyn ScanApi>) -> Self {
        Self { store, api }
    }

    #[instrument(skip(self), err)]
    pub async fn sync_patient(&self, patient_id: &str) -> Result<SyncReport, ApiError> {
        let scans = self.api.list_scans(&ScanListParams::for_patient(patient_id)).await?;

        let mut report = SyncReport {
            patient_id: patient_id.to_string(),
            fetched: scans.len(),
            ..Default::default()
        };

        let now = Utc::now();
        for scan in &scans {
            let mut session = scan.to_session(now);
            if session.patient_id.is_empty() {
                session.patient_id = patient_id.to_string();
            }
            match self.store.import(session).await {
                ImportOutcome::Inserted => report.inserted += 1,
                ImportOutcome::Updated => report.updated += 1,
                ImportOutcome::Unchanged => report.unchanged += 1,
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            updated = report.updated,
            "synced backend scans"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKeyValueStore;
    use crate::domain::models::{ApiScan, ApiScanUpdate, ScanStatus, ScanType};
    use async_trait::async_trait;
    use serde_json::json;

    struct FixedScanApi {
        scans: Vec<ApiScan>,
    }

    #[async_trait]
    impl ScanApi for FixedScanApi {
        async fn list_scans(&self, params: &ScanListParams) -> Result<Vec<ApiScan>, ApiError> {
            Ok(self
                .scans
                .iter()
                .filter(|s| {
                    params.patient_id.is_none()
                        || s.patient_id.as_ref().map(ToString::to_string) == params.patient_id
                        || s.patient_id.is_none()
                })
                .cloned()
                .collect())
        }

        async fn get_scan(&self, scan_id: &str) -> Result<ApiScan, ApiError> {
            self.scans
                .iter()
                .find(|s| s.id.to_string() == scan_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(scan_id.to_string()))
        }

        async fn update_scan(&self, scan_id: &str, _update: &ApiScanUpdate) -> Result<ApiScan, ApiError> {
            self.get_scan(scan_id).await
        }

        async fn delete_scan(&self, _scan_id: &str) -> Result<bool, ApiError> {
            Ok(true)
        }
    }

    fn scan(value: serde_json::Value) -> ApiScan {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_sync_inserts_then_reports_unchanged() {
        let store = Arc::new(ScanSessionStore::new(Arc::new(InMemoryKeyValueStore::new())));
        let api = Arc::new(FixedScanApi {
            scans: vec![
                scan(json!({"id": 1, "patient_id": 5, "modality": "mri", "status": "completed",
                            "created_at": "2025-01-01T00:00:00Z"})),
                scan(json!({"id": 2, "patient_id": 5, "modality": "xray", "status": "processing",
                            "created_at": "2025-01-02T00:00:00Z"})),
                scan(json!({"id": 3, "patient_id": 6, "modality": "mri", "status": "completed",
                            "created_at": "2025-01-03T00:00:00Z"})),
            ],
        });
        let service = ScanSyncService::new(store.clone(), api);

        let first = service.sync_patient("5").await.unwrap();
        assert_eq!(first.fetched, 2);
        assert_eq!(first.inserted, 2);

        let sessions = store.list("5", None).await;
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "2");
        assert_eq!(sessions[0].status, ScanStatus::Processing);
        assert_eq!(
            store.latest_done("5", ScanType::Brain).await.map(|s| s.id),
            Some("1".to_string())
        );

        let second = service.sync_patient("5").await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.unchanged, 2);
    }

    #[tokio::test]
    async fn test_sync_fills_missing_patient_id() {
        let store = Arc::new(ScanSessionStore::new(Arc::new(InMemoryKeyValueStore::new())));
        let api = Arc::new(FixedScanApi {
            scans: vec![scan(json!({"id": "x", "status": "failed",
                                    "created_at": "2025-01-01T00:00:00Z"}))],
        });
        let service = ScanSyncService::new(store.clone(), api);

        service.sync_patient("9").await.unwrap();

        let sessions = store.list("9", None).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].error.as_deref(), Some("Prediction failed"));
    }
}
