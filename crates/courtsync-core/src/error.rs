//! Error types for the reconciliation engine.

use chrono::NaiveDate;
use thiserror::Error;

/// The availability payload did not have the expected shape.
///
/// Every variant names the offending key so the failure can be traced back
/// to the upstream payload.
#[derive(Debug, Error)]
pub enum DataFormatError {
    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    /// A required container key is missing.
    #[error("payload is missing key '{key}'")]
    MissingKey { key: &'static str },

    /// A field that must be a list has another shape.
    #[error("payload key '{key}' is not a list")]
    NotAList { key: &'static str },

    /// A field is present but its value cannot be used.
    #[error("payload key '{key}' has an invalid value: {value}")]
    InvalidValue { key: &'static str, value: String },
}

impl DataFormatError {
    /// Creates a missing key error.
    pub fn missing(key: &'static str) -> Self {
        Self::MissingKey { key }
    }

    /// Creates a not-a-list error.
    pub fn not_a_list(key: &'static str) -> Self {
        Self::NotAList { key }
    }

    /// Creates an invalid value error.
    pub fn invalid(key: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key,
            value: value.into(),
        }
    }

    /// Returns the key this error refers to, if any.
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::Decode(_) => None,
            Self::MissingKey { key } | Self::NotAList { key } | Self::InvalidValue { key, .. } => {
                Some(key)
            }
        }
    }
}

/// Booked slots could not be turned into absolute intervals.
#[derive(Debug, Error)]
pub enum ConsolidateError {
    /// A slot label is not a `HH:MM` time of day.
    #[error("invalid slot label '{slot}' on {date} for {resource}")]
    InvalidSlot {
        date: NaiveDate,
        resource: String,
        slot: String,
    },

    /// The slot's local time does not exist in the configured timezone.
    #[error("slot {slot} on {date} does not exist in timezone {timezone}")]
    NonexistentLocalTime {
        date: NaiveDate,
        slot: String,
        timezone: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_format_error_names_key() {
        let err = DataFormatError::missing("availability");
        assert_eq!(err.key(), Some("availability"));
        assert_eq!(err.to_string(), "payload is missing key 'availability'");

        let err = DataFormatError::not_a_list("resources");
        assert!(err.to_string().contains("'resources'"));
    }

    #[test]
    fn decode_error_has_no_key() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = DataFormatError::from(json_err);
        assert!(err.key().is_none());
        assert!(err.to_string().starts_with("payload is not valid JSON"));
    }
}
