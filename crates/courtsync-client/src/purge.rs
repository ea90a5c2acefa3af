//! Removal of every managed event in a window.

use chrono::NaiveDate;
use chrono_tz::Tz;
use courtsync_core::TimeWindow;
use courtsync_providers::CalendarBackend;
use tracing::info;

use crate::config::GroupSettings;
use crate::error::{ClientError, ClientResult};
use crate::sync::{GroupReport, SyncReport, delete_events, list_managed};

/// Options for a purge run.
#[derive(Debug, Clone)]
pub struct PurgeOptions {
    /// First day of the window.
    pub today: NaiveDate,
    /// Number of days covered, starting with `today`.
    pub days: u32,
    pub dry_run: bool,
    pub timezone: Tz,
    pub title_prefix: String,
    pub groups: Vec<GroupSettings>,
}

/// Deletes every event whose title has the managed prefix in
/// `[today, today + days)` from every group's calendar.
///
/// A calendar that cannot be listed is skipped; gone events are counted,
/// any other delete failure aborts.
pub async fn run_purge(
    calendar: &dyn CalendarBackend,
    options: &PurgeOptions,
) -> ClientResult<SyncReport> {
    let mut report = SyncReport {
        dry_run: options.dry_run,
        groups: Vec::new(),
    };
    if options.days == 0 {
        return Ok(report);
    }

    let last = options
        .today
        .checked_add_days(chrono::Days::new(u64::from(options.days) - 1))
        .ok_or_else(|| ClientError::Config(format!("purge window of {} days overflows", options.days)))?;
    let window = TimeWindow::for_dates(options.today, last, &options.timezone).ok_or_else(|| {
        ClientError::Config(format!(
            "cannot build a window from {} to {} in {}",
            options.today,
            last,
            options.timezone.name()
        ))
    })?;
    info!(
        "purging events from {} up to (not including) {}",
        window.start, window.end
    );

    for group in &options.groups {
        let mut group_report = GroupReport::new(group);

        match list_managed(calendar, group, &window, &options.title_prefix).await {
            Some(events) => {
                info!("{}: {} events to delete", group.name, events.len());
                let ids: Vec<String> = events.into_iter().map(|event| event.id).collect();
                delete_events(calendar, group, &ids, options.dry_run, &mut group_report).await?;
            }
            None => group_report.skipped = true,
        }

        report.groups.push(group_report);
    }

    Ok(report)
}
