//! Subcommand implementations.

pub mod config;
pub mod purge;
pub mod sync;

use std::path::Path;

use chrono::{NaiveDate, Utc};

use courtsync_providers::google::GoogleCalendar;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Builds the Google Calendar backend from configuration.
///
/// `credentials_path` overrides the configured credentials file.
pub(crate) fn google_calendar(
    config: &ClientConfig,
    credentials_path: Option<&Path>,
) -> ClientResult<GoogleCalendar> {
    let timezone = config.sync.tz().map_err(ClientError::Config)?;
    let google_config = config
        .google
        .to_provider_config(credentials_path, timezone)
        .map_err(ClientError::Config)?;
    Ok(GoogleCalendar::new(google_config)?)
}

/// Returns the current date in the configured timezone.
pub(crate) fn today(config: &ClientConfig) -> ClientResult<NaiveDate> {
    let timezone = config.sync.tz().map_err(ClientError::Config)?;
    Ok(Utc::now().with_timezone(&timezone).date_naive())
}
