//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/courtsync/config.toml` by default. Every section is optional;
//! missing keys fall back to the defaults below, and command-line flags
//! override what the file says.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use courtsync_core::ParseRules;
use serde::{Deserialize, Serialize};
use url::Url;

use courtsync_providers::google::{AuthorizedUserCredentials, GoogleConfig};
use courtsync_providers::reservation::ReservationConfig;

// ---------------------------------------------------------------------------
// ClientConfig (config.toml)
// ---------------------------------------------------------------------------

/// Configuration for the courtsync client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Sync window and behavior.
    pub sync: SyncSettings,

    /// Resource-name rules for the availability parser.
    pub parser: ParseRules,

    /// Reservation site settings.
    pub reservation: ReservationSettings,

    /// Google Calendar settings.
    pub google: GoogleSettings,

    /// Resource groups and the calendar each one syncs into.
    pub groups: Vec<GroupSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            sync: SyncSettings::default(),
            parser: ParseRules::default(),
            reservation: ReservationSettings::default(),
            google: GoogleSettings::default(),
            groups: default_groups(),
        }
    }
}

fn default_groups() -> Vec<GroupSettings> {
    vec![
        GroupSettings::new(
            "Mervin",
            "c1b24574cbbcfe3d62b323de33ebc50956edf9212737a88f9423c661c5e37204@group.calendar.google.com",
        ),
        GroupSettings::new(
            "Bay",
            "8320fe0a847ce736584415a3777a3d4eb69e650d459ae9329fa1aaed42cf36d1@group.calendar.google.com",
        ),
    ]
}

/// Sync window and behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Number of consecutive dates to sync.
    pub days: u32,

    /// Days between today and the first synced date.
    pub start_offset: u32,

    /// Seconds to wait before each availability fetch.
    pub throttle_secs: f64,

    /// IANA timezone slots and events are expressed in.
    pub timezone: String,

    /// Only events whose title starts with this prefix are managed.
    pub title_prefix: String,

    /// Number of days from today the purge command covers.
    pub purge_days: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            days: 80,
            start_offset: 2,
            throttle_secs: 1.5,
            timezone: "America/Los_Angeles".to_string(),
            title_prefix: "Court ".to_string(),
            purge_days: 90,
        }
    }
}

impl SyncSettings {
    /// Parses the configured timezone.
    pub fn tz(&self) -> Result<Tz, String> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| format!("invalid timezone '{}': {}", self.timezone, e))
    }

    /// Returns the throttle as a duration.
    pub fn throttle(&self) -> Result<Duration, String> {
        throttle_duration(self.throttle_secs)
    }
}

/// Converts a throttle in seconds, rejecting negative or non-finite values.
pub fn throttle_duration(secs: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(secs).map_err(|_| format!("invalid throttle '{}'", secs))
}

/// Reservation site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservationSettings {
    /// Site root.
    pub base_url: String,

    /// Landing page path, relative to the site root.
    pub landing_path: String,

    /// Availability endpoint path, relative to the site root.
    pub availability_path: String,

    /// Facility group to request.
    pub facility_group_id: u64,

    /// Regex whose first capture group is the CSRF token.
    pub csrf_pattern: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ReservationSettings {
    fn default() -> Self {
        Self {
            base_url: ReservationConfig::DEFAULT_BASE_URL.to_string(),
            landing_path: ReservationConfig::DEFAULT_LANDING_PATH.to_string(),
            availability_path: ReservationConfig::DEFAULT_AVAILABILITY_PATH.to_string(),
            facility_group_id: ReservationConfig::DEFAULT_FACILITY_GROUP_ID,
            csrf_pattern: ReservationConfig::DEFAULT_CSRF_PATTERN.to_string(),
            timeout_secs: ReservationConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ReservationSettings {
    /// Converts to provider configuration.
    pub fn to_provider_config(&self) -> Result<ReservationConfig, String> {
        let config = ReservationConfig::new(&self.base_url)?
            .with_landing_path(&self.landing_path)
            .with_availability_path(&self.availability_path)
            .with_facility_group_id(self.facility_group_id)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_csrf_pattern(&self.csrf_pattern)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// GoogleSettings
// ---------------------------------------------------------------------------

/// Google Calendar settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleSettings {
    /// Path to the authorized-user credentials JSON file.
    pub credentials_path: Option<PathBuf>,

    /// Calendar API base URL.
    pub api_base: String,

    /// OAuth token endpoint.
    pub token_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleSettings {
    fn default() -> Self {
        Self {
            credentials_path: None,
            api_base: GoogleConfig::DEFAULT_API_BASE.to_string(),
            token_url: GoogleConfig::DEFAULT_TOKEN_URL.to_string(),
            timeout_secs: GoogleConfig::DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl GoogleSettings {
    /// Returns the credentials path, preferring `override_path`.
    pub fn resolve_credentials_path(&self, override_path: Option<&Path>) -> Result<PathBuf, String> {
        override_path
            .map(Path::to_path_buf)
            .or_else(|| self.credentials_path.clone())
            .ok_or_else(|| {
                format!(
                    "Google credentials not configured. Pass --credentials-path or add to {}:\n  \
                     [google]\n  \
                     credentials_path = \"/path/to/authorized_user.json\"",
                    ClientConfig::default_path().display()
                )
            })
    }

    /// Converts to provider configuration.
    ///
    /// Reads the credentials file; `override_path` takes precedence over
    /// the configured path.
    pub fn to_provider_config(
        &self,
        override_path: Option<&Path>,
        timezone: Tz,
    ) -> Result<GoogleConfig, String> {
        let path = self.resolve_credentials_path(override_path)?;
        let credentials = AuthorizedUserCredentials::from_file(&path)?;

        let api_base =
            Url::parse(&self.api_base).map_err(|e| format!("invalid google.api_base: {}", e))?;
        let token_url =
            Url::parse(&self.token_url).map_err(|e| format!("invalid google.token_url: {}", e))?;

        let config = GoogleConfig::new(credentials, timezone)
            .with_api_base(api_base)
            .with_token_url(token_url)
            .with_timeout(Duration::from_secs(self.timeout_secs));
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// GroupSettings
// ---------------------------------------------------------------------------

/// One resource group and its target calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Group name as it appears before the separator in resource names.
    pub name: String,

    /// Calendar the group's bookings are mirrored into.
    pub calendar_id: String,
}

impl GroupSettings {
    pub fn new(name: impl Into<String>, calendar_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            calendar_id: calendar_id.into(),
        }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("courtsync")
    }

    /// Checks everything that can be checked without network access.
    ///
    /// The Google credentials file is not read here; see
    /// [`GoogleSettings::to_provider_config`].
    pub fn validate(&self) -> Result<(), String> {
        self.sync.tz()?;
        self.sync.throttle()?;
        if self.sync.days == 0 {
            return Err("sync.days must be at least 1".to_string());
        }
        if self.sync.title_prefix.is_empty() {
            return Err("sync.title_prefix must not be empty".to_string());
        }

        if self.parser.marker.is_empty() {
            return Err("parser.marker must not be empty".to_string());
        }
        if self.parser.separator.is_empty() {
            return Err("parser.separator must not be empty".to_string());
        }
        if !self.parser.replacement.starts_with(self.sync.title_prefix.trim_end()) {
            return Err(format!(
                "parser.replacement '{}' does not produce titles starting with '{}'",
                self.parser.replacement, self.sync.title_prefix
            ));
        }

        self.reservation.to_provider_config()?;
        Url::parse(&self.google.api_base).map_err(|e| format!("invalid google.api_base: {}", e))?;
        Url::parse(&self.google.token_url)
            .map_err(|e| format!("invalid google.token_url: {}", e))?;

        if self.groups.is_empty() {
            return Err("at least one [[groups]] entry is required".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for group in &self.groups {
            if group.name.is_empty() || group.calendar_id.is_empty() {
                return Err("every group needs a name and a calendar_id".to_string());
            }
            if !seen.insert(group.name.as_str()) {
                return Err(format!("group '{}' is configured twice", group.name));
            }
        }

        Ok(())
    }
}
