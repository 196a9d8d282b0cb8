//! Implementation of the `scanstore init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{output, CommandOutput};
use crate::infrastructure::setup::{absolute_path, create_config_dir, create_config_file, SetupPaths};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.yaml
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push("\nWrote .scanstore/config.yaml".to_string());
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = absolute_path(&args.path)?;
    let paths = SetupPaths::for_root(&target_path);

    if paths.is_initialized() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to overwrite the configuration.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            config_written: false,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    let directories_created = create_config_dir(&paths)
        .context("Failed to create .scanstore directories")?
        .into_iter()
        .map(|p| p.display().to_string())
        .collect();
    let config_written = create_config_file(&paths, args.force)?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        directories_created,
        config_written,
    };

    output(&output_data, json_mode);
    Ok(())
}
