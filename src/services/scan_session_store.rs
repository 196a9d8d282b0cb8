//! Scan session store coordinating session operations with a key-value slot.
//!
//! The whole collection lives as one JSON array under a single storage key.
//! Persistence is best-effort: storage errors and corrupted state are logged
//! and never reach callers.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{NewScanSession, ScanSession, ScanSessionPatch, ScanStatus, ScanType};
use crate::domain::ports::KeyValueStore;

/// Result of importing a fully formed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Inserted,
    Updated,
    Unchanged,
}

/// Registry of scan sessions persisted through an injected `KeyValueStore`.
///
/// Read-modify-write cycles are serialized inside one store instance. Two
/// instances sharing the same storage slot (for example two processes on the
/// same file) are last-writer-wins; callers that care pass
/// `ScanSessionPatch::expecting` to detect intervening writes.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use scanstore::adapters::InMemoryKeyValueStore;
/// use scanstore::domain::models::{NewScanSession, ScanType};
/// use scanstore::services::ScanSessionStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = ScanSessionStore::new(Arc::new(InMemoryKeyValueStore::new()));
/// let session = store.create(NewScanSession::new("patient-1", ScanType::Brain)).await?;
/// assert_eq!(store.list("patient-1", None).await.len(), 1);
/// # let _ = session;
/// # Ok(())
/// # }
/// ```
pub struct ScanSessionStore {
    storage: Arc<dyn KeyValueStore>,
    key: String,
    write_lock: Mutex<()>,
}

impl ScanSessionStore {
    /// Storage key used when none is configured
    pub const DEFAULT_KEY: &'static str = "insightx_scan_sessions";

    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self::with_key(storage, Self::DEFAULT_KEY)
    }

    pub fn with_key(storage: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Create a session with a fresh id and creation time.
    ///
    /// Status defaults to `queued` and progress to 0 unless the input
    /// overrides them. Only the patient id is validated.
    #[instrument(skip(self, input), fields(patient_id = %input.patient_id, scan_type = %input.scan_type), err)]
    pub async fn create(&self, input: NewScanSession) -> DomainResult<ScanSession> {
        if input.patient_id.trim().is_empty() {
            return Err(DomainError::ValidationFailed(
                "patient id cannot be empty".to_string(),
            ));
        }

        let session = ScanSession::new(input);

        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read().await;
        sessions.push(session.clone());
        self.write(&sessions).await;

        debug!(session_id = %session.id, "created scan session");
        Ok(session)
    }

    /// Sessions for a patient, optionally narrowed to one scan type, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self, patient_id: &str, scan_type: Option<ScanType>) -> Vec<ScanSession> {
        let matching = self
            .read()
            .await
            .into_iter()
            .filter(|s| s.patient_id == patient_id && scan_type.is_none_or(|t| s.scan_type == t))
            .collect();
        newest_first(matching)
    }

    /// Every stored session, newest first.
    pub async fn all(&self) -> Vec<ScanSession> {
        newest_first(self.read().await)
    }

    /// Look up one session by id.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Option<ScanSession> {
        self.read().await.into_iter().find(|s| s.id == id)
    }

    /// Merge `patch` into the session with `id`.
    ///
    /// # Returns
    /// - `Ok(Some(session))` with the updated record
    /// - `Ok(None)` if no session has this id (nothing is written)
    ///
    /// # Errors
    /// Returns a `DomainError` if the patch would break the lifecycle
    /// invariants or its `expected_updated_at` guard does not match. The
    /// stored record is left untouched in that case.
    #[instrument(skip(self, patch), fields(status = ?patch.status, progress = ?patch.progress), err)]
    pub async fn update(&self, id: &str, patch: ScanSessionPatch) -> DomainResult<Option<ScanSession>> {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read().await;

        let Some(session) = sessions.iter_mut().find(|s| s.id == id) else {
            debug!("update for unknown scan session ignored");
            return Ok(None);
        };

        session.apply_patch(patch, Utc::now())?;
        let updated = session.clone();
        self.write(&sessions).await;

        Ok(Some(updated))
    }

    /// Most recent `done` session for a patient and scan type.
    #[instrument(skip(self))]
    pub async fn latest_done(&self, patient_id: &str, scan_type: ScanType) -> Option<ScanSession> {
        self.list(patient_id, Some(scan_type))
            .await
            .into_iter()
            .find(|s| s.status == ScanStatus::Done)
    }

    /// Remove a session. Returns whether a session with this id existed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> bool {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read().await;

        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return false;
        }

        self.write(&sessions).await;
        true
    }

    /// Insert or replace a fully formed session, keyed by its id.
    ///
    /// Used when an authoritative source (the imaging backend) already owns
    /// the record, so lifecycle checks do not apply.
    #[instrument(skip(self, session), fields(session_id = %session.id))]
    pub async fn import(&self, session: ScanSession) -> ImportOutcome {
        let _guard = self.write_lock.lock().await;
        let mut sessions = self.read().await;

        let outcome = match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) if *existing == session => return ImportOutcome::Unchanged,
            Some(existing) => {
                *existing = session;
                ImportOutcome::Updated
            }
            None => {
                sessions.push(session);
                ImportOutcome::Inserted
            }
        };

        self.write(&sessions).await;
        outcome
    }

    /// Load the collection, treating missing, unreadable or corrupted state as empty.
    async fn read(&self) -> Vec<ScanSession> {
        let raw = match self.storage.get(&self.key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to read scan sessions; treating as empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&raw) {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(key = %self.key, error = %e, "corrupted scan session state; treating as empty");
                Vec::new()
            }
        }
    }

    /// Persist the collection. Failures are logged and the write is dropped.
    async fn write(&self, sessions: &[ScanSession]) -> bool {
        let raw = match serde_json::to_string(sessions) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to serialize scan sessions; write dropped");
                return false;
            }
        };

        match self.storage.set(&self.key, &raw).await {
            Ok(()) => true,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to persist scan sessions; write dropped");
                false
            }
        }
    }
}

/// Sort by creation time, newest first. Equal timestamps keep the most
/// recently inserted session first.
fn newest_first(mut sessions: Vec<ScanSession>) -> Vec<ScanSession> {
    sessions.reverse();
    sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    sessions
}
