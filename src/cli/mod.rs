//! Command-line interface.

pub mod commands;
pub mod display;
pub mod id_resolver;
pub mod output;

use clap::{Parser, Subcommand};
use console::style;
use std::path::{Path, PathBuf};

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

#[derive(Parser, Debug)]
#[command(name = "scanstore")]
#[command(about = "Scan session store for imaging prediction jobs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .scanstore/config.yaml)
    #[arg(short, long, global = true, env = "SCANSTORE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize .scanstore configuration in a project directory
    Init(commands::init::InitArgs),

    /// Scan session management
    Session(commands::session::SessionArgs),

    /// Pull a patient's scans from the imaging backend
    Sync(commands::sync::SyncArgs),
}

/// Load configuration from `path`, or the project hierarchy when unset.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Print an error (with its cause chain) and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();

    if json_mode {
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": causes,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err}", style("error:").red().bold());
        for cause in causes {
            eprintln!("  {} {cause}", style("caused by:").dim());
        }
    }

    std::process::exit(1);
}
