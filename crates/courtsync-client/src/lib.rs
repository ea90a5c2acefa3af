//! CLI, configuration and sync orchestration
//!
//! This crate provides the `courtsync` command-line interface. The
//! orchestration in [`sync`] and [`purge`] only depends on the provider
//! traits, so it runs the same against live services and in-memory fakes.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod purge;
pub mod sync;

pub use cli::Cli;
pub use error::{ClientError, ClientResult};
pub use purge::{PurgeOptions, run_purge};
pub use sync::{GroupReport, SyncOptions, SyncReport, fetch_availability, run_sync};
