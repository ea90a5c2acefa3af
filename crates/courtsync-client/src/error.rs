//! Client error types.

use chrono::NaiveDate;
use courtsync_core::{ConsolidateError, DataFormatError, TracingError};
use courtsync_providers::ProviderError;
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in the client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The availability of a date could not be fetched.
    #[error("failed to fetch availability for {date}: {source}")]
    Fetch {
        date: NaiveDate,
        #[source]
        source: ProviderError,
    },

    /// The availability payload of a date was malformed.
    #[error("malformed availability for {date}: {source}")]
    DataFormat {
        date: NaiveDate,
        #[source]
        source: DataFormatError,
    },

    /// Booked slots could not be turned into intervals.
    #[error("failed to consolidate availability: {0}")]
    Consolidate(#[from] ConsolidateError),

    /// A create or delete against a group's calendar failed.
    #[error("failed to update calendar for group {group}: {source}")]
    Write {
        group: String,
        #[source]
        source: ProviderError,
    },

    /// Provider setup or other provider error.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be initialized.
    #[error(transparent)]
    Tracing(#[from] TracingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_date_and_group() {
        let date = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
        let err = ClientError::Fetch {
            date,
            source: ProviderError::network("connection refused").with_provider("reservation"),
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"failed to fetch availability for 2025-04-20: [reservation] network_error: connection refused"
        );

        let err = ClientError::Write {
            group: "Bay".to_string(),
            source: ProviderError::server("HTTP 500: boom"),
        };
        assert!(err.to_string().contains("group Bay"));
    }
}
