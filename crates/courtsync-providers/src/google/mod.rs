//! Google Calendar backend.
//!
//! This module provides [`GoogleCalendar`], a [`CalendarBackend`](crate::CalendarBackend)
//! over the Google Calendar API v3.
//!
//! # Features
//!
//! - Authorized-user credentials (client id, client secret, refresh token)
//! - Access tokens from the refresh-token grant, cached in memory
//! - One transparent retry after a 401 with a freshly refreshed token
//! - Server-side recurring event expansion and internal pagination
//! - Event times re-expressed in the configured timezone
//!
//! # Example
//!
//! ```ignore
//! use courtsync_providers::google::{AuthorizedUserCredentials, GoogleCalendar, GoogleConfig};
//!
//! let credentials = AuthorizedUserCredentials::from_file("credentials.json")?;
//! let config = GoogleConfig::new(credentials, chrono_tz::America::Los_Angeles);
//! let calendar = GoogleCalendar::new(config)?;
//!
//! let events = calendar.list_events("team@group.calendar.google.com", &window).await?;
//! ```

mod client;
mod config;
mod oauth;
mod provider;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{AuthorizedUserCredentials, GoogleConfig};
pub use oauth::OAuthClient;
pub use provider::GoogleCalendar;
pub use tokens::{TokenCache, TokenInfo};
