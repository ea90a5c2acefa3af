//! courtsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use courtsync_core::{TracingConfig, init_tracing};

use courtsync_client::cli::{Cli, Command, ConfigAction, SyncArgs};
use courtsync_client::commands;
use courtsync_client::config::ClientConfig;
use courtsync_client::error::{ClientError, ClientResult};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(TracingConfig::for_flags(cli.debug, cli.log_json)) {
        eprintln!("error: {}", ClientError::from(e));
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let config = if let Some(ref path) = cli.config {
        ClientConfig::load_from(path).map_err(ClientError::Config)?
    } else {
        ClientConfig::load().map_err(ClientError::Config)?
    };
    let credentials_path = cli.credentials_path.as_deref();

    match cli.command {
        Some(Command::Sync(args)) => {
            commands::sync::run(&config, &args, cli.dry_run, credentials_path).await
        }
        Some(Command::Purge { days }) => {
            commands::purge::run(&config, days, cli.dry_run, credentials_path).await
        }
        Some(Command::Config { action }) => match action {
            ConfigAction::Dump => commands::config::dump(&config, &config_path),
            ConfigAction::Validate => commands::config::validate(&config, credentials_path),
            ConfigAction::Path => commands::config::path(&config_path),
        },
        None => {
            commands::sync::run(&config, &SyncArgs::default(), cli.dry_run, credentials_path).await
        }
    }
}
