//! Simulated prediction pipeline.
//!
//! Drives an existing scan session through the job lifecycle with fixed
//! progress checkpoints, persisting each step through the store so any
//! reader polling the store sees the job advance.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{PipelineConfig, ScanSession, ScanSessionPatch, ScanStatus, ScanType};
use crate::services::ScanSessionStore;

/// One progress checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStep {
    pub status: ScanStatus,
    pub progress: u8,
}

/// Checkpoints reported before the terminal update.
pub const PIPELINE_STEPS: [PipelineStep; 4] = [
    PipelineStep { status: ScanStatus::Queued, progress: 0 },
    PipelineStep { status: ScanStatus::Processing, progress: 25 },
    PipelineStep { status: ScanStatus::Processing, progress: 60 },
    PipelineStep { status: ScanStatus::Processing, progress: 90 },
];

pub struct ScanPipeline {
    store: Arc<ScanSessionStore>,
    config: PipelineConfig,
}

impl ScanPipeline {
    pub fn new(store: Arc<ScanSessionStore>, config: PipelineConfig) -> Self {
        Self { store, config }
    }

    /// Run the pipeline for `session_id`.
    ///
    /// `analyze` produces the results payload (or an error message) once all
    /// checkpoints have passed. `observer` sees the session after every
    /// persisted step, including the terminal one.
    ///
    /// # Errors
    /// - `SessionNotFound` if the session disappears mid-run
    /// - lifecycle errors if the session was already past a checkpoint
    #[instrument(skip(self, analyze, observer), err)]
    pub async fn run<F, O>(&self, session_id: &str, analyze: F, mut observer: O) -> DomainResult<ScanSession>
    where
        F: FnOnce(&ScanSession) -> Result<Value, String>,
        O: FnMut(&ScanSession),
    {
        let mut current = self
            .store
            .get(session_id)
            .await
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))?;

        for (index, step) in PIPELINE_STEPS.iter().enumerate() {
            let delay = if index == 0 {
                self.config.initial_delay_ms
            } else {
                self.config.step_delay_ms
            };
            sleep_ms(delay).await;

            current = self.apply(session_id, ScanSessionPatch::progress(step.status, step.progress)).await?;
            observer(&current);
        }

        sleep_ms(self.config.finalize_delay_ms).await;

        let patch = match analyze(&current) {
            Ok(data) => ScanSessionPatch::done(data),
            Err(message) => ScanSessionPatch::failed(message),
        };
        current = self.apply(session_id, patch).await?;
        observer(&current);

        info!(status = %current.status, "scan pipeline finished");
        Ok(current)
    }

    async fn apply(&self, session_id: &str, patch: ScanSessionPatch) -> DomainResult<ScanSession> {
        self.store
            .update(session_id, patch)
            .await?
            .ok_or_else(|| DomainError::SessionNotFound(session_id.to_string()))
    }
}

async fn sleep_ms(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// Dashboard-shaped placeholder results for an uploaded scan awaiting review.
pub fn placeholder_results(session: &ScanSession) -> Value {
    let now = chrono::Utc::now();
    match session.scan_type {
        ScanType::Brain => json!({
            "patientId": session.patient_id,
            "scanId": format!("B-UP-{}", now.timestamp_millis()),
            "lastScanDate": now.to_rfc3339(),
            "injury": {
                "location": "Frontal Lobe",
                "type": "Uploaded scan",
                "imaging": ["MRI T1", "T2"],
            },
            "risks": ["Auto-generated risk review pending"],
            "relatedCases": ["Pending review"],
        }),
        ScanType::Heart => json!({
            "patientId": session.patient_id,
            "scanId": format!("H-UP-{}", now.timestamp_millis()),
            "lastScanDate": now.to_rfc3339(),
            "condition": "Uploaded heart scan",
            "injury": {
                "region": "Left Ventricle",
                "type": "Functional review pending",
                "imaging": ["Echo", "Cardiac MRI"],
            },
            "risks": ["Auto-generated risk review pending"],
            "relatedCases": ["Pending review"],
        }),
    }
}
