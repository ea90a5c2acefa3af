//! Log output for the `courtsync` binary.
//!
//! A run is either watched in a terminal or launched by cron. The first gets
//! compact lines on stderr, the second JSON lines a log shipper can read.
//! `--debug` raises the level and adds source locations in either mode.
//!
//! ```ignore
//! use courtsync_core::tracing::{TracingConfig, init_tracing};
//!
//! init_tracing(TracingConfig::for_flags(cli.debug, cli.log_json))?;
//! ```
//!
//! `RUST_LOG`, when set, replaces the default directive entirely.

use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// A global subscriber was already installed
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    /// The filter directive could not be parsed
    #[error("failed to parse log filter: {0}")]
    EnvFilter(#[from] tracing_subscriber::filter::ParseError),
}

/// Line format of log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracingOutputFormat {
    /// One human-readable line per event
    Compact,
    /// One JSON object per event
    Json,
}

/// How a run logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level applied to the courtsync crates when `RUST_LOG` is unset
    pub level: Level,
    pub format: TracingOutputFormat,
    /// Add file and line to every event
    pub include_location: bool,
    pub include_timestamp: bool,
}

impl TracingConfig {
    /// Terminal run: INFO, compact, timestamped.
    #[must_use]
    pub fn interactive() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Compact,
            include_location: false,
            include_timestamp: true,
        }
    }

    /// Terminal run with `--debug`: DEBUG with source locations, no
    /// timestamps.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            format: TracingOutputFormat::Compact,
            include_location: true,
            include_timestamp: false,
        }
    }

    /// Scheduled run: INFO as JSON lines.
    #[must_use]
    pub fn unattended() -> Self {
        Self {
            level: Level::INFO,
            format: TracingOutputFormat::Json,
            include_location: false,
            include_timestamp: true,
        }
    }

    /// Picks the preset for the `--debug` and `--log-json` flags.
    #[must_use]
    pub fn for_flags(debug: bool, json: bool) -> Self {
        match (debug, json) {
            (false, false) => Self::interactive(),
            (true, false) => Self::cli_debug(),
            (false, true) => Self::unattended(),
            (true, true) => Self {
                level: Level::DEBUG,
                include_location: true,
                ..Self::unattended()
            },
        }
    }

    /// The filter used when `RUST_LOG` is unset.
    pub fn directive(&self) -> String {
        default_directive(self.level)
    }
}

/// Crates whose events are shown. Dependencies (reqwest, hyper) stay quiet
/// unless `RUST_LOG` asks for them.
const CRATE_TARGETS: [&str; 3] = ["courtsync_core", "courtsync_providers", "courtsync_client"];

/// Builds the filter directive for `level`, e.g.
/// `courtsync_core=info,courtsync_providers=info,courtsync_client=info`.
pub fn default_directive(level: Level) -> String {
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level.as_str().to_lowercase()))
        .collect::<Vec<_>>()
        .join(",")
}

fn output_layer(config: &TracingConfig) -> Box<dyn Layer<Registry> + Send + Sync> {
    match config.format {
        TracingOutputFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(config.include_location)
                .with_line_number(config.include_location);
            if config.include_timestamp {
                layer.boxed()
            } else {
                layer.without_time().boxed()
            }
        }
        TracingOutputFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    }
}

/// Installs the global subscriber. Call once, before anything logs.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.directive())?,
    };

    let subscriber = tracing_subscriber::registry()
        .with(output_layer(&config))
        .with(filter);
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_select_presets() {
        assert_eq!(TracingConfig::for_flags(false, false), TracingConfig::interactive());
        assert_eq!(TracingConfig::for_flags(true, false), TracingConfig::cli_debug());
        assert_eq!(TracingConfig::for_flags(false, true), TracingConfig::unattended());
    }

    #[test]
    fn debug_json_keeps_json_lines() {
        let config = TracingConfig::for_flags(true, true);
        assert_eq!(config.format, TracingOutputFormat::Json);
        assert_eq!(config.level, Level::DEBUG);
        assert!(config.include_location);
        assert!(config.include_timestamp);
    }

    #[test]
    fn cron_runs_log_json_at_info() {
        let config = TracingConfig::unattended();
        assert_eq!(config.format, TracingOutputFormat::Json);
        assert_eq!(
            config.directive(),
            "courtsync_core=info,courtsync_providers=info,courtsync_client=info"
        );
    }

    #[test]
    fn debug_directive_leaves_dependencies_out() {
        let directive = TracingConfig::cli_debug().directive();
        assert_eq!(
            directive,
            "courtsync_core=debug,courtsync_providers=debug,courtsync_client=debug"
        );
        assert!(!directive.contains("reqwest"));
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
