//! The purge command.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::purge::{PurgeOptions, run_purge};

/// Resolves purge options from configuration and the `--days` override.
pub fn options(
    config: &ClientConfig,
    days: Option<u32>,
    dry_run: bool,
    today: NaiveDate,
) -> ClientResult<PurgeOptions> {
    Ok(PurgeOptions {
        today,
        days: days.unwrap_or(config.sync.purge_days),
        dry_run,
        timezone: config.sync.tz().map_err(ClientError::Config)?,
        title_prefix: config.sync.title_prefix.clone(),
        groups: config.groups.clone(),
    })
}

/// Deletes every managed event from the configured calendars.
pub async fn run(
    config: &ClientConfig,
    days: Option<u32>,
    dry_run: bool,
    credentials_path: Option<&Path>,
) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    let options = options(config, days, dry_run, super::today(config)?)?;
    let calendar = super::google_calendar(config, credentials_path)?;

    info!("starting event deletion, dry run: {}", dry_run);
    let report = run_purge(&calendar, &options).await?;
    println!("{}", report);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_default_to_config() {
        let today = NaiveDate::from_ymd_opt(2025, 4, 18).unwrap();
        let config = ClientConfig::default();

        assert_eq!(options(&config, None, false, today).unwrap().days, 90);
        assert_eq!(options(&config, Some(5), true, today).unwrap().days, 5);
    }
}
