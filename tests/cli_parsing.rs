use clap::Parser;

use scanstore::cli::commands::session::SessionCommands;
use scanstore::cli::{Cli, Commands};
use scanstore::domain::models::Modality;
use scanstore::{ScanStatus, ScanType};

fn session_command(args: &[&str]) -> SessionCommands {
    let argv = ["scanstore", "session"].iter().chain(args.iter()).copied();
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::Session(session) => session.command,
        other => panic!("Wrong top-level command: {other:?}"),
    }
}

#[test]
fn test_parse_session_create() {
    match session_command(&[
        "create",
        "--patient",
        "p-17",
        "--type",
        "brain",
        "--modality",
        "x-ray",
        "--file",
        "chest.png",
    ]) {
        SessionCommands::Create {
            patient,
            scan_type,
            file,
            modality,
            notes,
            status,
        } => {
            assert_eq!(patient, "p-17");
            assert_eq!(scan_type, ScanType::Brain);
            assert_eq!(file.as_deref(), Some("chest.png"));
            assert_eq!(modality, Some(Modality::Xray));
            assert!(notes.is_none());
            assert!(status.is_none());
        }
        other => panic!("Wrong session command: {other:?}"),
    }
}

#[test]
fn test_parse_session_update() {
    match session_command(&[
        "update",
        "3f2a",
        "--status",
        "processing",
        "--progress",
        "60",
        "--expect",
        "2025-01-01T00:00:00Z",
    ]) {
        SessionCommands::Update {
            id,
            status,
            progress,
            expect,
            data,
            ..
        } => {
            assert_eq!(id, "3f2a");
            assert_eq!(status, Some(ScanStatus::Processing));
            assert_eq!(progress, Some(60));
            assert_eq!(expect.unwrap().to_rfc3339(), "2025-01-01T00:00:00+00:00");
            assert!(data.is_none());
        }
        other => panic!("Wrong session command: {other:?}"),
    }
}

#[test]
fn test_parse_session_list_without_filters() {
    assert!(matches!(
        session_command(&["list"]),
        SessionCommands::List {
            patient: None,
            scan_type: None
        }
    ));
}

#[test]
fn test_parse_run_with_failure() {
    match session_command(&["run", "-p", "p-1", "-t", "heart", "--fail", "model offline"]) {
        SessionCommands::Run { scan_type, fail, .. } => {
            assert_eq!(scan_type, ScanType::Heart);
            assert_eq!(fail.as_deref(), Some("model offline"));
        }
        other => panic!("Wrong session command: {other:?}"),
    }
}

#[test]
fn test_rejects_unknown_scan_type() {
    let result = Cli::try_parse_from(["scanstore", "session", "latest", "--patient", "p-1", "--type", "lung"]);
    assert!(result.is_err());
}

#[test]
fn test_rejects_progress_beyond_u8() {
    let result = Cli::try_parse_from(["scanstore", "session", "update", "abc", "--progress", "300"]);
    assert!(result.is_err(), "progress must fit in a u8");
}

#[test]
fn test_global_flags() {
    let cli = Cli::try_parse_from([
        "scanstore",
        "sync",
        "--patient",
        "7",
        "--json",
        "--config",
        "custom.yaml",
        "--base-url",
        "http://imaging:8000",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("custom.yaml")));
    match cli.command {
        Commands::Sync(args) => {
            assert_eq!(args.patient, "7");
            assert_eq!(args.base_url.as_deref(), Some("http://imaging:8000"));
        }
        other => panic!("Wrong top-level command: {other:?}"),
    }
}

#[test]
fn test_init_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(["scanstore", "init"]).unwrap();
    match cli.command {
        Commands::Init(args) => {
            assert!(!args.force);
            assert_eq!(args.path, std::path::PathBuf::from("."));
        }
        other => panic!("Wrong top-level command: {other:?}"),
    }
}
