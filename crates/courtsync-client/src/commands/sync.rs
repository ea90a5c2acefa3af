//! The sync command.

use std::path::Path;

use chrono::NaiveDate;
use courtsync_core::sync_dates;
use courtsync_providers::reservation::ReservationSource;
use tracing::info;

use crate::cli::SyncArgs;
use crate::config::{ClientConfig, throttle_duration};
use crate::error::{ClientError, ClientResult};
use crate::sync::{SyncOptions, run_sync};

/// Resolves sync options from configuration and command-line overrides.
pub fn options(
    config: &ClientConfig,
    args: &SyncArgs,
    dry_run: bool,
    today: NaiveDate,
) -> ClientResult<SyncOptions> {
    let settings = &config.sync;
    let timezone = settings.tz().map_err(ClientError::Config)?;
    let throttle = throttle_duration(args.throttle.unwrap_or(settings.throttle_secs))
        .map_err(ClientError::Config)?;
    let days = args.days.unwrap_or(settings.days);
    let start_offset = args.start_offset.unwrap_or(settings.start_offset);

    Ok(SyncOptions {
        dates: sync_dates(today, start_offset, days),
        throttle,
        dry_run,
        timezone,
        title_prefix: settings.title_prefix.clone(),
        groups: config.groups.clone(),
        rules: config.parser.clone(),
    })
}

/// Runs a sync against the reservation site and Google Calendar.
pub async fn run(
    config: &ClientConfig,
    args: &SyncArgs,
    dry_run: bool,
    credentials_path: Option<&Path>,
) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    let today = super::today(config)?;
    let options = options(config, args, dry_run, today)?;

    let reservation_config = config
        .reservation
        .to_provider_config()
        .map_err(ClientError::Config)?;
    let source = ReservationSource::new(reservation_config)?;
    let calendar = super::google_calendar(config, credentials_path)?;

    info!("started court sync");
    let report = run_sync(&source, &calendar, &options).await?;
    println!("{}", report);

    let skipped = report.skipped();
    if !skipped.is_empty() {
        info!("skipped groups: {}", skipped.join(", "));
    }
    info!("sync completed");
    Ok(())
}
