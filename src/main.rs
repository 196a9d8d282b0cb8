//! scanstore CLI entry point.

use clap::Parser;

use scanstore::cli::{commands, handle_error, load_config, Cli, Commands};
use scanstore::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    // Keeps the file writer flushing until exit
    let _logger = match LoggerImpl::init(&config.logging) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("warning: logging disabled: {err}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Session(args) => commands::session::execute(args, &config, cli.json).await,
        Commands::Sync(args) => commands::sync::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
