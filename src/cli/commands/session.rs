//! Session CLI commands.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde_json::Value;
use std::sync::Arc;

use crate::cli::display::{colorize_status, create_pipeline_bar, format_timestamp, label, list_table, render_list};
use crate::cli::id_resolver::resolve_session_id;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{
    ApiScan, Config, Modality, NewScanSession, ScanSession, ScanSessionPatch, ScanStatus, ScanType,
};
use crate::infrastructure::setup::open_session_store;
use crate::services::{placeholder_results, ScanPipeline, ScanSessionStore};

#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Record a new scan session
    Create {
        /// Patient ID
        #[arg(short, long)]
        patient: String,
        /// Scan type (brain, heart)
        #[arg(short = 't', long = "type", value_parser = parse_scan_type)]
        scan_type: ScanType,
        /// Uploaded file name
        #[arg(short, long)]
        file: Option<String>,
        /// Modality (xray, mri, ct, other)
        #[arg(short, long, value_parser = parse_modality)]
        modality: Option<Modality>,
        /// Free-text notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Initial status (defaults to queued)
        #[arg(short, long, value_parser = parse_status)]
        status: Option<ScanStatus>,
    },
    /// List sessions, newest first
    List {
        /// Only this patient's sessions
        #[arg(short, long)]
        patient: Option<String>,
        /// Only this scan type
        #[arg(short = 't', long = "type", value_parser = parse_scan_type)]
        scan_type: Option<ScanType>,
    },
    /// Show session details
    Show {
        /// Session ID or unique prefix
        id: String,
    },
    /// Update a session's status, results or review metadata
    Update {
        /// Session ID or unique prefix
        id: String,
        #[arg(short, long, value_parser = parse_status)]
        status: Option<ScanStatus>,
        /// Progress percentage (0-100)
        #[arg(short, long)]
        progress: Option<u8>,
        /// Failure message (requires failed status)
        #[arg(short, long)]
        error: Option<String>,
        /// Results payload as JSON (requires done status)
        #[arg(short, long)]
        data: Option<String>,
        #[arg(short, long)]
        notes: Option<String>,
        #[arg(long)]
        risk_level: Option<String>,
        #[arg(long)]
        review_status: Option<String>,
        #[arg(long)]
        clinician_note: Option<String>,
        /// Reject the update unless the session was last modified at this RFC 3339 time
        #[arg(long)]
        expect: Option<DateTime<Utc>>,
    },
    /// Show the most recent completed session for a patient and scan type
    Latest {
        #[arg(short, long)]
        patient: String,
        #[arg(short = 't', long = "type", value_parser = parse_scan_type)]
        scan_type: ScanType,
    },
    /// Delete a session
    Delete {
        /// Session ID or unique prefix
        id: String,
    },
    /// Create a session and run the simulated prediction pipeline on it
    Run {
        #[arg(short, long)]
        patient: String,
        #[arg(short = 't', long = "type", value_parser = parse_scan_type)]
        scan_type: ScanType,
        #[arg(short, long)]
        file: Option<String>,
        #[arg(short, long, value_parser = parse_modality)]
        modality: Option<Modality>,
        #[arg(short, long)]
        notes: Option<String>,
        /// End the run as failed with this message
        #[arg(long)]
        fail: Option<String>,
    },
    /// Export sessions in the imaging backend's scan format
    Export {
        #[arg(short, long)]
        patient: Option<String>,
    },
}

fn parse_scan_type(s: &str) -> Result<ScanType, String> {
    ScanType::from_str(s).ok_or_else(|| format!("invalid scan type '{s}' (expected brain or heart)"))
}

fn parse_status(s: &str) -> Result<ScanStatus, String> {
    ScanStatus::from_str(s)
        .ok_or_else(|| format!("invalid status '{s}' (expected queued, processing, done or failed)"))
}

fn parse_modality(s: &str) -> Result<Modality, String> {
    Modality::from_str(s).ok_or_else(|| format!("invalid modality '{s}' (expected xray, mri, ct or other)"))
}

#[derive(Debug, serde::Serialize)]
pub struct SessionDetailOutput {
    pub session: ScanSession,
}

impl CommandOutput for SessionDetailOutput {
    fn to_human(&self) -> String {
        let s = &self.session;
        let mut lines = vec![
            format!("{} {}", label("ID"), s.id),
            format!("{} {}", label("Patient"), s.patient_id),
            format!("{} {}", label("Type"), s.scan_type),
            format!("{} {} ({}%)", label("Status"), colorize_status(s.status), s.progress),
            format!("{} {}", label("Created"), format_timestamp(&s.created_at)),
        ];
        let optional = [
            ("Updated", s.updated_at.as_ref().map(format_timestamp)),
            ("File", s.file_name.clone()),
            ("Modality", s.modality.map(|m| m.as_str().to_string())),
            ("Notes", s.notes.clone()),
            ("Error", s.error.clone()),
            ("Risk level", s.risk_level.clone()),
            ("Review status", s.review_status.clone()),
            ("Clinician note", s.clinician_note.clone()),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                lines.push(format!("{} {value}", label(name)));
            }
        }
        if let Some(ref data) = s.data {
            lines.push(label("Results"));
            lines.push(serde_json::to_string_pretty(data).unwrap_or_default());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.session).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionListOutput {
    pub sessions: Vec<ScanSession>,
    pub total: usize,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "patient", "type", "status", "progress", "file", "created"]);
        for s in &self.sessions {
            table.add_row(vec![
                truncate(&s.id, 11),
                s.patient_id.clone(),
                s.scan_type.to_string(),
                colorize_status(s.status).to_string(),
                format!("{}%", s.progress),
                truncate(s.file_name.as_deref().unwrap_or("-"), 24),
                format_timestamp(&s.created_at),
            ]);
        }
        render_list("session", table, self.total)
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct LatestOutput {
    pub patient_id: String,
    pub scan_type: ScanType,
    pub session: Option<ScanSession>,
}

impl CommandOutput for LatestOutput {
    fn to_human(&self) -> String {
        match self.session {
            Some(ref session) => SessionDetailOutput {
                session: session.clone(),
            }
            .to_human(),
            None => format!(
                "No completed {} session for patient {}.",
                self.scan_type, self.patient_id
            ),
        }
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.session).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct DeleteOutput {
    pub id: String,
    pub deleted: bool,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        if self.deleted {
            format!("Deleted session {}", self.id)
        } else {
            format!("Session {} could not be deleted", self.id)
        }
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ExportOutput {
    pub scans: Vec<ApiScan>,
}

impl CommandOutput for ExportOutput {
    fn to_human(&self) -> String {
        serde_json::to_string_pretty(&self.scans).unwrap_or_default()
    }

    fn to_json(&self) -> Value {
        serde_json::to_value(&self.scans).unwrap_or_default()
    }
}

pub async fn execute(args: SessionArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = Arc::new(
        open_session_store(&config.storage)
            .await
            .context("Failed to open session storage")?,
    );

    match args.command {
        SessionCommands::Create {
            patient,
            scan_type,
            file,
            modality,
            notes,
            status,
        } => {
            let input = NewScanSession {
                file_name: file,
                modality,
                notes,
                status,
                ..NewScanSession::new(patient, scan_type)
            };
            let session = store.create(input).await?;
            output(&SessionDetailOutput { session }, json_mode);
        }

        SessionCommands::List { patient, scan_type } => {
            let sessions = match patient {
                Some(ref patient) => store.list(patient, scan_type).await,
                None => store
                    .all()
                    .await
                    .into_iter()
                    .filter(|s| scan_type.is_none_or(|t| s.scan_type == t))
                    .collect(),
            };
            let total = sessions.len();
            output(&SessionListOutput { sessions, total }, json_mode);
        }

        SessionCommands::Show { id } => {
            let id = resolve_session_id(&store, &id).await?;
            let session = store
                .get(&id)
                .await
                .with_context(|| format!("Session {id} not found"))?;
            output(&SessionDetailOutput { session }, json_mode);
        }

        SessionCommands::Update {
            id,
            status,
            progress,
            error,
            data,
            notes,
            risk_level,
            review_status,
            clinician_note,
            expect,
        } => {
            let data = data
                .map(|raw| serde_json::from_str::<Value>(&raw))
                .transpose()
                .context("--data must be valid JSON")?;
            let patch = ScanSessionPatch {
                status,
                progress,
                error,
                data,
                notes,
                risk_level,
                review_status,
                clinician_note,
                expected_updated_at: expect,
                ..ScanSessionPatch::default()
            };
            if patch.is_empty() {
                bail!("Nothing to update: pass at least one field");
            }

            let id = resolve_session_id(&store, &id).await?;
            let session = store
                .update(&id, patch)
                .await?
                .with_context(|| format!("Session {id} not found"))?;
            output(&SessionDetailOutput { session }, json_mode);
        }

        SessionCommands::Latest { patient, scan_type } => {
            let session = store.latest_done(&patient, scan_type).await;
            output(
                &LatestOutput {
                    patient_id: patient,
                    scan_type,
                    session,
                },
                json_mode,
            );
        }

        SessionCommands::Delete { id } => {
            let id = resolve_session_id(&store, &id).await?;
            let deleted = store.delete(&id).await;
            output(&DeleteOutput { id, deleted }, json_mode);
        }

        SessionCommands::Run {
            patient,
            scan_type,
            file,
            modality,
            notes,
            fail,
        } => {
            let input = NewScanSession {
                file_name: file,
                modality,
                notes,
                ..NewScanSession::new(patient, scan_type)
            };
            let session = run_pipeline(store, config, input, fail, json_mode).await?;
            output(&SessionDetailOutput { session }, json_mode);
        }

        SessionCommands::Export { patient } => {
            let sessions = match patient {
                Some(ref patient) => store.list(patient, None).await,
                None => store.all().await,
            };
            let scans = sessions.iter().map(ApiScan::from).collect();
            output(&ExportOutput { scans }, json_mode);
        }
    }

    Ok(())
}

async fn run_pipeline(
    store: Arc<ScanSessionStore>,
    config: &Config,
    input: NewScanSession,
    fail: Option<String>,
    json_mode: bool,
) -> Result<ScanSession> {
    let session = store.create(input).await?;
    let pipeline = ScanPipeline::new(store, config.pipeline.clone());

    let bar = (!json_mode).then(create_pipeline_bar);
    let analyze = move |s: &ScanSession| match fail {
        Some(message) => Err(message),
        None => Ok(placeholder_results(s)),
    };

    let result = pipeline
        .run(&session.id, analyze, |s| {
            if let Some(ref bar) = bar {
                bar.set_position(u64::from(s.progress));
                bar.set_message(s.status.as_str());
            }
        })
        .await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    Ok(result?)
}
