//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// courtsync - mirror court reservations into calendars
#[derive(Debug, Parser)]
#[command(name = "courtsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "COURTSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Log intended changes without making them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Path to the Google authorized-user credentials file
    #[arg(long, env = "COURTSYNC_CREDENTIALS", global = true)]
    pub credentials_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sync reservations into the group calendars (default)
    Sync(SyncArgs),

    /// Delete every managed event from the group calendars
    Purge {
        /// Number of days from today to purge
        #[arg(long)]
        days: Option<u32>,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Options of the sync command.
#[derive(Debug, Clone, Default, Args)]
pub struct SyncArgs {
    /// Seconds to wait before each availability request
    #[arg(long)]
    pub throttle: Option<f64>,

    /// Number of dates to sync
    #[arg(long)]
    pub days: Option<u32>,

    /// Days between today and the first synced date
    #[arg(long)]
    pub start_offset: Option<u32>,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_sync() {
        let cli = Cli::try_parse_from(["courtsync", "--dry-run"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.command.is_none());
    }

    #[test]
    fn sync_overrides() {
        let cli = Cli::try_parse_from([
            "courtsync",
            "sync",
            "--throttle",
            "0.25",
            "--days",
            "7",
            "--start-offset",
            "0",
            "--dry-run",
        ])
        .unwrap();

        assert!(cli.dry_run);
        match cli.command {
            Some(Command::Sync(args)) => {
                assert_eq!(args.throttle, Some(0.25));
                assert_eq!(args.days, Some(7));
                assert_eq!(args.start_offset, Some(0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn purge_with_credentials() {
        let cli = Cli::try_parse_from([
            "courtsync",
            "purge",
            "--days",
            "30",
            "--credentials-path",
            "/tmp/creds.json",
        ])
        .unwrap();

        assert_eq!(cli.credentials_path, Some(PathBuf::from("/tmp/creds.json")));
        assert!(matches!(cli.command, Some(Command::Purge { days: Some(30) })));
    }

    #[test]
    fn config_subcommands() {
        let cli = Cli::try_parse_from(["courtsync", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Validate
            })
        ));
    }

    #[test]
    fn rejects_bad_numbers() {
        assert!(Cli::try_parse_from(["courtsync", "sync", "--days", "-3"]).is_err());
        assert!(Cli::try_parse_from(["courtsync", "sync", "--throttle", "soon"]).is_err());
    }
}
