//! Backend scan records and their mapping to local scan sessions.
//!
//! The imaging backend returns snake_case scan records whose identifiers may
//! be numeric or textual. Local sessions project into this shape for export,
//! and backend records map back into sessions during sync.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::scan_session::{Modality, NewScanSession, ScanSession, ScanStatus, ScanType};

/// Identifier as sent by the backend: integer primary key or opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ApiId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// Summary block attached to a predicted scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_findings: Option<serde_json::Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Scan record as exchanged with the imaging backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiScan {
    pub id: ApiId,
    #[serde(default)]
    pub patient_id: Option<ApiId>,
    #[serde(default)]
    pub doctor_id: Option<ApiId>,
    #[serde(default)]
    pub modality: Option<String>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub review_status: Option<String>,
    #[serde(default)]
    pub clinician_note: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub summary: Option<ScanSummary>,
    #[serde(default)]
    pub ai_result: Option<Value>,
}

/// Review fields a clinician may change on an existing backend scan.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiScanUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clinician_note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
}

impl ApiScanUpdate {
    pub fn is_empty(&self) -> bool {
        self.review_status.is_none() && self.clinician_note.is_none() && self.risk_level.is_none()
    }
}

const DEFAULT_FILE_NAME: &str = "Uploaded scan";
const DEFAULT_FAILURE: &str = "Prediction failed";

impl From<&ScanSession> for ApiScan {
    fn from(session: &ScanSession) -> Self {
        let summary = session
            .data
            .as_ref()
            .and_then(|d| d.get("summary"))
            .filter(|v| !v.is_null())
            .and_then(|v| serde_json::from_value(v.clone()).ok());
        let ai_result = session
            .data
            .as_ref()
            .and_then(|d| d.get("ai_result"))
            .filter(|v| !v.is_null())
            .cloned();

        Self {
            id: ApiId::Text(session.id.clone()),
            patient_id: Some(ApiId::Text(session.patient_id.clone())),
            doctor_id: None,
            modality: Some(
                session
                    .modality
                    .map_or_else(|| session.scan_type.as_str().to_string(), |m| m.as_str().to_lowercase()),
            ),
            file_path: session.file_name.clone(),
            original_filename: session.file_name.clone(),
            status: Some(session.status.as_str().to_string()),
            risk_level: session.risk_level.clone(),
            review_status: session.review_status.clone(),
            clinician_note: session.clinician_note.clone(),
            created_at: Some(session.created_at.to_rfc3339()),
            updated_at: Some(session.last_modified().to_rfc3339()),
            summary,
            ai_result,
        }
    }
}

impl ApiScan {
    /// Map a backend record into a local scan session.
    ///
    /// `fallback_now` stands in for a missing or unparseable creation time.
    pub fn to_session(&self, fallback_now: DateTime<Utc>) -> ScanSession {
        let modality = self.modality.as_deref().unwrap_or_default().to_lowercase();
        let scan_type = if modality == "mri" {
            ScanType::Brain
        } else {
            ScanType::Heart
        };
        let modality_label = match modality.as_str() {
            "mri" => Modality::Mri,
            "xray" => Modality::Xray,
            _ => Modality::Other,
        };

        let status = match self.status.as_deref().unwrap_or_default().to_lowercase().as_str() {
            "failed" => ScanStatus::Failed,
            "predicted" | "completed" => ScanStatus::Done,
            _ => ScanStatus::Processing,
        };
        let progress = if status.is_terminal() { 100 } else { 50 };

        let error = (status == ScanStatus::Failed).then(|| {
            self.summary
                .as_ref()
                .and_then(|s| s.error.as_deref())
                .filter(|e| !e.trim().is_empty())
                .unwrap_or(DEFAULT_FAILURE)
                .to_string()
        });

        let data = (status == ScanStatus::Done).then(|| {
            serde_json::json!({
                "summary": self.summary,
                "ai_result": self.ai_result,
            })
        });

        let file_name = self
            .original_filename
            .clone()
            .or_else(|| self.file_path.clone())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let created_at = self
            .created_at
            .as_deref()
            .and_then(parse_backend_timestamp)
            .unwrap_or(fallback_now);

        let fields = NewScanSession {
            patient_id: self.patient_id.as_ref().map(ToString::to_string).unwrap_or_default(),
            scan_type,
            file_name: Some(file_name),
            modality: Some(modality_label),
            notes: self.clinician_note.clone(),
            status: Some(status),
            progress: Some(progress),
            data,
            error,
            risk_level: self.risk_level.clone(),
            review_status: self.review_status.clone(),
            clinician_note: self.clinician_note.clone(),
        };

        let mut session = ScanSession::with_id(self.id.to_string(), created_at, fields);
        session.updated_at = self.updated_at.as_deref().and_then(parse_backend_timestamp);
        session
    }
}

/// Parse a backend timestamp, accepting RFC 3339 or a naive ISO form taken as UTC.
pub fn parse_backend_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
