//! Sync orchestration.
//!
//! One run fetches the availability of every date in the window, one date at
//! a time with a throttle delay before each fetch, turns booked slots into
//! desired intervals and reconciles each group's calendar against them.

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;
use chrono_tz::Tz;
use courtsync_core::{
    Availability, CalendarEvent, GroupIntervals, ParseRules, TimeWindow, consolidate, diff, parse,
};
use courtsync_providers::{AvailabilitySource, CalendarBackend};
use tracing::{debug, error, info, warn};

use crate::config::GroupSettings;
use crate::error::{ClientError, ClientResult};

/// Everything a sync run needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Dates to sync, ascending.
    pub dates: Vec<NaiveDate>,
    /// Delay awaited before every availability fetch.
    pub throttle: Duration,
    /// Log intended mutations instead of performing them.
    pub dry_run: bool,
    /// Timezone slots are interpreted in and events written in.
    pub timezone: Tz,
    /// Only existing events whose title starts with this are managed.
    pub title_prefix: String,
    /// Groups to reconcile, each with its calendar.
    pub groups: Vec<GroupSettings>,
    /// Resource-name rules for the parser.
    pub rules: ParseRules,
}

/// Outcome of one group within a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupReport {
    pub group: String,
    pub calendar_id: String,
    /// Events created (or that would be, in a dry run).
    pub created: usize,
    /// Events deleted (or that would be, in a dry run).
    pub deleted: usize,
    /// Deletes that found the event already gone.
    pub already_gone: usize,
    /// Existing events that already matched desired state.
    pub unchanged: usize,
    /// The group's calendar could not be read and was left alone.
    pub skipped: bool,
}

impl GroupReport {
    pub(crate) fn new(group: &GroupSettings) -> Self {
        Self {
            group: group.name.clone(),
            calendar_id: group.calendar_id.clone(),
            ..Self::default()
        }
    }
}

/// Outcome of a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub dry_run: bool,
    pub groups: Vec<GroupReport>,
}

impl SyncReport {
    /// Total events created across groups.
    pub fn created(&self) -> usize {
        self.groups.iter().map(|g| g.created).sum()
    }

    /// Total events deleted across groups.
    pub fn deleted(&self) -> usize {
        self.groups.iter().map(|g| g.deleted).sum()
    }

    /// Names of groups that were skipped.
    pub fn skipped(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| g.skipped)
            .map(|g| g.group.as_str())
            .collect()
    }

    /// Returns the report of one group.
    pub fn group(&self, name: &str) -> Option<&GroupReport> {
        self.groups.iter().find(|g| g.group == name)
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for (i, group) in self.groups.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            if group.skipped {
                write!(f, "{}{}: skipped", prefix, group.group)?;
                continue;
            }
            write!(
                f,
                "{}{}: {} created, {} deleted, {} already gone, {} unchanged",
                prefix, group.group, group.created, group.deleted, group.already_gone, group.unchanged
            )?;
        }
        Ok(())
    }
}

/// Fetches and parses the availability of every date.
///
/// The throttle is awaited before each fetch, including the first.
pub async fn fetch_availability(
    source: &dyn AvailabilitySource,
    dates: &[NaiveDate],
    throttle: Duration,
    rules: &ParseRules,
) -> ClientResult<Availability> {
    let mut availability = Availability::new();

    for &date in dates {
        if !throttle.is_zero() {
            tokio::time::sleep(throttle).await;
        }

        debug!("fetching availability for {} from {}", date, source.name());
        let raw = source
            .fetch_day(date)
            .await
            .map_err(|e| ClientError::Fetch { date, source: e })?;
        let day =
            parse(&raw, date, rules).map_err(|e| ClientError::DataFormat { date, source: e })?;

        let stray: Vec<String> = day
            .days()
            .map(|(day_date, _)| *day_date)
            .filter(|day_date| !dates.contains(day_date))
            .map(|day_date| day_date.to_string())
            .collect();
        if !stray.is_empty() {
            warn!(
                "availability requested for {} is dated {}, outside the synced dates; ignoring it",
                date,
                stray.join(", ")
            );
            continue;
        }
        availability.merge(day);
    }

    info!("fetched availability for {} dates", dates.len());
    Ok(availability)
}

/// Runs one full sync.
///
/// # Errors
///
/// A fetch, parse or consolidation failure aborts the run before any
/// calendar is touched. A calendar that cannot be listed is skipped. A
/// failed create, or a failed delete other than "already gone", aborts the
/// run.
pub async fn run_sync(
    source: &dyn AvailabilitySource,
    calendar: &dyn CalendarBackend,
    options: &SyncOptions,
) -> ClientResult<SyncReport> {
    let mut report = SyncReport {
        dry_run: options.dry_run,
        groups: Vec::new(),
    };

    let (Some(&first), Some(&last)) = (options.dates.first(), options.dates.last()) else {
        warn!("no dates to sync");
        return Ok(report);
    };
    info!("sync date range: {} to {}", first, last);
    if options.dry_run {
        info!("dry run enabled, no changes will be made");
    }

    let availability =
        fetch_availability(source, &options.dates, options.throttle, &options.rules).await?;
    let desired = consolidate(&availability, options.timezone)?;
    info!(
        "{} busy intervals across {} groups",
        desired.interval_count(),
        desired.groups().count()
    );

    for (name, _) in desired.groups() {
        if !options.groups.iter().any(|g| &g.name == name) {
            warn!("group {} has bookings but no configured calendar", name);
        }
    }

    let window = TimeWindow::for_dates(first, last, &options.timezone).ok_or_else(|| {
        ClientError::Config(format!(
            "cannot build a window from {} to {} in {}",
            first,
            last,
            options.timezone.name()
        ))
    })?;

    let empty = GroupIntervals::new();
    for group in &options.groups {
        let desired_group = desired.group(&group.name).unwrap_or(&empty);
        let group_report = sync_group(calendar, group, desired_group, &window, options).await?;
        report.groups.push(group_report);
    }

    Ok(report)
}

async fn sync_group(
    calendar: &dyn CalendarBackend,
    group: &GroupSettings,
    desired: &GroupIntervals,
    window: &TimeWindow,
    options: &SyncOptions,
) -> ClientResult<GroupReport> {
    let mut report = GroupReport::new(group);

    let Some(existing) = list_managed(calendar, group, window, &options.title_prefix).await else {
        report.skipped = true;
        return Ok(report);
    };

    let desired = managed_intervals(group, desired, &options.title_prefix);
    let plan = diff(&desired, &existing);
    report.unchanged = plan.unchanged;
    info!(
        "{}: {} to create, {} to delete, {} unchanged",
        group.name,
        plan.to_create.len(),
        plan.to_delete.len(),
        plan.unchanged
    );

    let timezone = options.timezone.name();
    for event in &plan.to_create {
        if options.dry_run {
            info!("[dry-run] would create {} in {}", event.identity(), group.calendar_id);
        } else {
            calendar
                .create_event(&group.calendar_id, event, timezone)
                .await
                .map_err(|source| ClientError::Write {
                    group: group.name.clone(),
                    source,
                })?;
        }
        report.created += 1;
    }

    delete_events(calendar, group, &plan.to_delete, options.dry_run, &mut report).await?;
    Ok(report)
}

/// Keeps the sub-resources whose title has `title_prefix`.
///
/// Events with other titles would never be listed back as managed, so
/// creating them would repeat on every run.
fn managed_intervals(
    group: &GroupSettings,
    desired: &GroupIntervals,
    title_prefix: &str,
) -> GroupIntervals {
    desired
        .iter()
        .filter(|(title, _)| {
            let managed = title.starts_with(title_prefix);
            if !managed {
                warn!(
                    "{}: skipping '{}', title does not start with '{}'",
                    group.name, title, title_prefix
                );
            }
            managed
        })
        .map(|(title, intervals)| (title.clone(), intervals.clone()))
        .collect()
}

/// Lists the events of a group's calendar whose title has `title_prefix`.
///
/// Returns `None` when the calendar cannot be read; the failure is logged.
pub(crate) async fn list_managed(
    calendar: &dyn CalendarBackend,
    group: &GroupSettings,
    window: &TimeWindow,
    title_prefix: &str,
) -> Option<Vec<CalendarEvent>> {
    match calendar.list_events(&group.calendar_id, window).await {
        Ok(events) => {
            let total = events.len();
            let managed: Vec<CalendarEvent> = events
                .into_iter()
                .filter(|event| event.title.starts_with(title_prefix))
                .collect();
            debug!(
                "{}: {} of {} events match '{}'",
                group.name,
                managed.len(),
                total,
                title_prefix
            );
            Some(managed)
        }
        Err(e) => {
            error!(
                "failed to list events for {} ({}), skipping: {}",
                group.name, group.calendar_id, e
            );
            None
        }
    }
}

/// Deletes events by id, counting gone events instead of failing on them.
pub(crate) async fn delete_events(
    calendar: &dyn CalendarBackend,
    group: &GroupSettings,
    event_ids: &[String],
    dry_run: bool,
    report: &mut GroupReport,
) -> ClientResult<()> {
    for event_id in event_ids {
        if dry_run {
            info!("[dry-run] would delete event {} from {}", event_id, group.calendar_id);
            report.deleted += 1;
            continue;
        }
        match calendar.delete_event(&group.calendar_id, event_id).await {
            Ok(()) => report.deleted += 1,
            Err(e) if e.is_gone() => {
                warn!("event {} already deleted or not found: {}", event_id, e);
                report.already_gone += 1;
            }
            Err(source) => {
                return Err(ClientError::Write {
                    group: group.name.clone(),
                    source,
                });
            }
        }
    }
    Ok(())
}
