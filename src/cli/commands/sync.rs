//! Implementation of the `scanstore sync` command.

use anyhow::{Context, Result};
use clap::Args;
use std::sync::Arc;

use crate::adapters::HttpScanApiClient;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;
use crate::infrastructure::setup::open_session_store;
use crate::services::{ScanSyncService, SyncReport};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Patient whose scans are pulled
    #[arg(short, long)]
    pub patient: String,

    /// Override the configured backend base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

impl CommandOutput for SyncReport {
    fn to_human(&self) -> String {
        format!(
            "Synced {} scan(s) for patient {}: {} new, {} updated, {} unchanged",
            self.fetched, self.patient_id, self.inserted, self.updated, self.unchanged
        )
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SyncArgs, config: &Config, json_mode: bool) -> Result<()> {
    let mut backend = config.backend.clone();
    if let Some(base_url) = args.base_url {
        backend.base_url = base_url;
    }

    let api = HttpScanApiClient::new(&backend).context("Failed to create backend client")?;
    let store = open_session_store(&config.storage)
        .await
        .context("Failed to open session storage")?;

    let service = ScanSyncService::new(Arc::new(store), Arc::new(api));
    let report = service
        .sync_patient(&args.patient)
        .await
        .with_context(|| format!("Failed to sync scans from {}", backend.base_url))?;

    output(&report, json_mode);
    Ok(())
}
