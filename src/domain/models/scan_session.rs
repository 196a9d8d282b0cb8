//! Scan session domain model.
//!
//! A scan session tracks one imaging-analysis job for a patient through the
//! `queued -> processing -> done | failed` lifecycle. Sessions are persisted as
//! a camelCase JSON array so the stored form matches what the dashboards read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};

/// Organ the scan targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanType {
    Brain,
    Heart,
}

impl Default for ScanType {
    fn default() -> Self {
        Self::Brain
    }
}

impl ScanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brain => "brain",
            Self::Heart => "heart",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "brain" => Some(Self::Brain),
            "heart" => Some(Self::Heart),
            _ => None,
        }
    }
}

impl fmt::Display for ScanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a scan session.
///
/// The lifecycle is linear: `Queued -> Processing -> {Done | Failed}`.
/// Steps may be skipped forward but never reversed, and both `Done` and
/// `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Queued,
    Processing,
    Done,
    Failed,
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "queued" => Some(Self::Queued),
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Position in the lifecycle; terminal states share the last rank.
    const fn rank(self) -> u8 {
        match self {
            Self::Queued => 0,
            Self::Processing => 1,
            Self::Done | Self::Failed => 2,
        }
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Check if this status can move to `next`.
    ///
    /// Staying put is allowed for non-terminal states so progress can advance
    /// within a step. Terminal states accept no status change at all.
    pub fn can_transition_to(&self, next: Self) -> bool {
        if self.is_terminal() {
            return *self == next;
        }
        next.rank() >= self.rank()
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Imaging modality tag attached at upload time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Modality {
    #[serde(rename = "Xray")]
    Xray,
    #[serde(rename = "MRI")]
    Mri,
    #[serde(rename = "CT")]
    Ct,
    #[serde(rename = "Other")]
    Other,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xray => "Xray",
            Self::Mri => "MRI",
            Self::Ct => "CT",
            Self::Other => "Other",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "xray" | "x-ray" => Some(Self::Xray),
            "mri" => Some(Self::Mri),
            "ct" => Some(Self::Ct),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One imaging-analysis job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSession {
    /// Opaque identifier
    pub id: String,

    /// Owning patient (many sessions per patient)
    pub patient_id: String,

    /// Scan target
    #[serde(rename = "type")]
    pub scan_type: ScanType,

    /// Creation timestamp, used for newest-first ordering
    pub created_at: DateTime<Utc>,

    /// Original upload filename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modality: Option<Modality>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub status: ScanStatus,

    /// Completion percentage, 0-100
    pub progress: u8,

    /// Dashboard-shaped results, present once the job is done
    #[serde(default, deserialize_with = "present_value", skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// Failure reason, present once the job has failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_note: Option<String>,

    /// Stamped on every successful update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A `data` key that is present keeps its value, `null` included. Only an
/// absent key reads as `None`.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl ScanSession {
    /// Build a session from creation fields, allocating a fresh id.
    pub fn new(fields: NewScanSession) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), Utc::now(), fields)
    }

    /// Build a session with a caller-provided id and creation time.
    pub fn with_id(id: String, created_at: DateTime<Utc>, fields: NewScanSession) -> Self {
        Self {
            id,
            patient_id: fields.patient_id,
            scan_type: fields.scan_type,
            created_at,
            file_name: fields.file_name,
            modality: fields.modality,
            notes: fields.notes,
            status: fields.status.unwrap_or_default(),
            progress: fields.progress.unwrap_or(0),
            data: fields.data,
            error: fields.error,
            risk_level: fields.risk_level,
            review_status: fields.review_status,
            clinician_note: fields.clinician_note,
            updated_at: None,
        }
    }

    /// Timestamp of the last write to this record.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge a patch into this session, enforcing the lifecycle invariants.
    ///
    /// Either the whole patch applies or nothing changes. Fields absent from
    /// the patch keep their current values.
    pub fn apply_patch(&mut self, patch: ScanSessionPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(expected) = patch.expected_updated_at {
            let found = self.last_modified();
            if expected != found {
                return Err(DomainError::ConcurrencyConflict {
                    id: self.id.clone(),
                    expected,
                    found,
                });
            }
        }

        let next_status = patch.status.unwrap_or(self.status);
        let next_progress = self.next_progress(&patch, next_status)?;

        if self.status.is_terminal() && (patch.data.is_some() || patch.error.is_some()) {
            return Err(DomainError::TerminalSession {
                id: self.id.clone(),
                status: self.status,
            });
        }
        if patch.data.is_some() && next_status != ScanStatus::Done {
            return Err(DomainError::ValidationFailed(format!(
                "results payload requires status done, got {next_status}"
            )));
        }
        if patch.error.is_some() && next_status != ScanStatus::Failed {
            return Err(DomainError::ValidationFailed(format!(
                "error message requires status failed, got {next_status}"
            )));
        }

        self.status = next_status;
        self.progress = next_progress;
        if patch.file_name.is_some() {
            self.file_name = patch.file_name;
        }
        if patch.modality.is_some() {
            self.modality = patch.modality;
        }
        if patch.notes.is_some() {
            self.notes = patch.notes;
        }
        if patch.data.is_some() {
            self.data = patch.data;
        }
        if patch.error.is_some() {
            self.error = patch.error;
        }
        if patch.risk_level.is_some() {
            self.risk_level = patch.risk_level;
        }
        if patch.review_status.is_some() {
            self.review_status = patch.review_status;
        }
        if patch.clinician_note.is_some() {
            self.clinician_note = patch.clinician_note;
        }
        self.updated_at = Some(now);

        Ok(())
    }

    fn next_progress(&self, patch: &ScanSessionPatch, next_status: ScanStatus) -> DomainResult<u8> {
        if let Some(requested) = patch.progress {
            if requested > 100 {
                return Err(DomainError::ProgressOutOfRange(requested));
            }
        }

        if self.status.is_terminal() {
            if !self.status.can_transition_to(next_status) {
                return Err(DomainError::TerminalSession {
                    id: self.id.clone(),
                    status: self.status,
                });
            }
            return match patch.progress {
                Some(requested) if requested != self.progress => Err(DomainError::TerminalSession {
                    id: self.id.clone(),
                    status: self.status,
                }),
                _ => Ok(self.progress),
            };
        }

        if !self.status.can_transition_to(next_status) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: next_status,
            });
        }

        // Entering a terminal state pins progress, defaulting to 100.
        let requested = match (patch.progress, next_status.is_terminal()) {
            (Some(p), _) => p,
            (None, true) => 100,
            (None, false) => self.progress,
        };
        if requested < self.progress {
            return Err(DomainError::ProgressRegression {
                current: self.progress,
                requested,
            });
        }
        Ok(requested)
    }
}

/// Fields accepted when creating a session.
///
/// Status defaults to `queued` and progress to 0 unless overridden.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewScanSession {
    pub patient_id: String,
    pub scan_type: ScanType,
    pub file_name: Option<String>,
    pub modality: Option<Modality>,
    pub notes: Option<String>,
    pub status: Option<ScanStatus>,
    pub progress: Option<u8>,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub risk_level: Option<String>,
    pub review_status: Option<String>,
    pub clinician_note: Option<String>,
}

impl NewScanSession {
    pub fn new(patient_id: impl Into<String>, scan_type: ScanType) -> Self {
        Self {
            patient_id: patient_id.into(),
            scan_type,
            ..Default::default()
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_status(mut self, status: ScanStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Partial update for a session. `None` means "leave unchanged".
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanSessionPatch {
    pub status: Option<ScanStatus>,
    pub progress: Option<u8>,
    pub file_name: Option<String>,
    pub modality: Option<Modality>,
    pub notes: Option<String>,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub risk_level: Option<String>,
    pub review_status: Option<String>,
    pub clinician_note: Option<String>,

    /// Compare-and-swap guard: the patch only applies if the record was last
    /// modified at exactly this instant.
    pub expected_updated_at: Option<DateTime<Utc>>,
}

impl ScanSessionPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A patch that advances a running job.
    pub fn progress(status: ScanStatus, progress: u8) -> Self {
        Self {
            status: Some(status),
            progress: Some(progress),
            ..Default::default()
        }
    }

    /// A patch that completes a job with its results payload.
    pub fn done(data: Value) -> Self {
        Self {
            status: Some(ScanStatus::Done),
            progress: Some(100),
            data: Some(data),
            ..Default::default()
        }
    }

    /// A patch that fails a job with an error message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(ScanStatus::Failed),
            progress: Some(100),
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_risk_level(mut self, risk_level: impl Into<String>) -> Self {
        self.risk_level = Some(risk_level.into());
        self
    }

    pub fn with_review_status(mut self, review_status: impl Into<String>) -> Self {
        self.review_status = Some(review_status.into());
        self
    }

    pub fn with_clinician_note(mut self, note: impl Into<String>) -> Self {
        self.clinician_note = Some(note.into());
        self
    }

    pub fn expecting(mut self, last_modified: DateTime<Utc>) -> Self {
        self.expected_updated_at = Some(last_modified);
        self
    }

    /// Returns true if the patch would change nothing but the update stamp.
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.progress.is_none()
            && self.file_name.is_none()
            && self.modality.is_none()
            && self.notes.is_none()
            && self.data.is_none()
            && self.error.is_none()
            && self.risk_level.is_none()
            && self.review_status.is_none()
            && self.clinician_note.is_none()
    }
}
