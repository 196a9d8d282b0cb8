//! Imaging backend port.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::{ApiScan, ApiScanUpdate};

/// Error type for backend calls
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scan not found: {0}")]
    NotFound(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Query filters for listing backend scans.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanListParams {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub modality: Option<String>,
}

impl ScanListParams {
    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            ..Default::default()
        }
    }

    /// Query pairs for the fields that are set.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        [
            ("patient_id", &self.patient_id),
            ("doctor_id", &self.doctor_id),
            ("modality", &self.modality),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.clone().map(|v| (name, v)))
        .collect()
    }
}

/// Scan API of the imaging backend.
#[async_trait]
pub trait ScanApi: Send + Sync {
    /// List scans matching the given filters.
    async fn list_scans(&self, params: &ScanListParams) -> Result<Vec<ApiScan>, ApiError>;

    /// Fetch one scan by id.
    async fn get_scan(&self, scan_id: &str) -> Result<ApiScan, ApiError>;

    /// Update review fields on a scan and return the stored record.
    async fn update_scan(&self, scan_id: &str, update: &ApiScanUpdate) -> Result<ApiScan, ApiError>;

    /// Delete a scan. Returns the backend's success flag.
    async fn delete_scan(&self, scan_id: &str) -> Result<bool, ApiError>;
}
