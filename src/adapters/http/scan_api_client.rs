//! HTTP client for the imaging backend's scan endpoints
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::domain::models::{ApiScan, ApiScanUpdate, BackendConfig};
use crate::domain::ports::{ApiError, ScanApi, ScanListParams};

/// reqwest-based `ScanApi` implementation.
///
/// Talks to `GET/PATCH/DELETE {base_url}/api/scans[/{id}]`. One underlying
/// `reqwest::Client` is reused for connection pooling.
pub struct HttpScanApiClient {
    http_client: ReqwestClient,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    #[serde(default)]
    success: bool,
}

impl HttpScanApiClient {
    /// Create a client from backend configuration
    ///
    /// # Errors
    /// Returns `ApiError::InvalidUrl` if `base_url` does not parse or cannot
    /// carry a path, and `ApiError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.base_url.clone()));
        }

        let http_client = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self { http_client, base_url })
    }

    fn scans_url(&self, scan_id: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(["api", "scans"]);
            if let Some(id) = scan_id {
                segments.push(id);
            }
        }
        Ok(url)
    }

    /// Map non-success statuses to `ApiError` and decode the JSON body.
    async fn decode<T: serde::de::DeserializeOwned>(response: Response, scan_id: Option<&str>) -> Result<T, ApiError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            if let Some(id) = scan_id {
                return Err(ApiError::NotFound(id.to_string()));
            }
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ScanApi for HttpScanApiClient {
    #[instrument(skip(self), err)]
    async fn list_scans(&self, params: &ScanListParams) -> Result<Vec<ApiScan>, ApiError> {
        let url = self.scans_url(None)?;
        let response = self
            .http_client
            .get(url)
            .query(&params.to_query())
            .send()
            .await?;

        let scans: Option<Vec<ApiScan>> = Self::decode(response, None).await?;
        let scans = scans.unwrap_or_default();
        debug!(count = scans.len(), "listed backend scans");
        Ok(scans)
    }

    #[instrument(skip(self), err)]
    async fn get_scan(&self, scan_id: &str) -> Result<ApiScan, ApiError> {
        let url = self.scans_url(Some(scan_id))?;
        let response = self.http_client.get(url).send().await?;
        Self::decode(response, Some(scan_id)).await
    }

    #[instrument(skip(self, update), err)]
    async fn update_scan(&self, scan_id: &str, update: &ApiScanUpdate) -> Result<ApiScan, ApiError> {
        let url = self.scans_url(Some(scan_id))?;
        let response = self.http_client.patch(url).json(update).send().await?;
        Self::decode(response, Some(scan_id)).await
    }

    #[instrument(skip(self), err)]
    async fn delete_scan(&self, scan_id: &str) -> Result<bool, ApiError> {
        let url = self.scans_url(Some(scan_id))?;
        let response = self.http_client.delete(url).send().await?;
        let body: DeleteResponse = Self::decode(response, Some(scan_id)).await?;
        Ok(body.success)
    }
}
