//! Configuration commands.

use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dump the current configuration to stdout.
pub fn dump(config: &ClientConfig, path: &Path) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    println!("# config.toml ({})", path.display());
    println!("{}", toml_str);

    Ok(())
}

/// Validate the configuration.
///
/// The Google credentials file is read and checked too when one is
/// configured or passed with `--credentials-path`.
pub fn validate(config: &ClientConfig, credentials_path: Option<&Path>) -> ClientResult<()> {
    config.validate().map_err(ClientError::Config)?;

    if credentials_path.is_some() || config.google.credentials_path.is_some() {
        let timezone = config.sync.tz().map_err(ClientError::Config)?;
        config
            .google
            .to_provider_config(credentials_path, timezone)
            .map_err(|e| ClientError::Config(format!("invalid Google credentials: {}", e)))?;
        println!("Google credentials are valid.");
    }

    println!("Configuration is valid.");
    Ok(())
}

/// Show the configuration file path.
pub fn path(path: &Path) -> ClientResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn validate_reads_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type":"authorized_user","client_id":"id","client_secret":"secret","refresh_token":"token"}}"#
        )
        .unwrap();

        let config = ClientConfig::default();
        assert!(validate(&config, Some(file.path())).is_ok());
    }

    #[test]
    fn validate_rejects_service_account_credentials() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"type":"service_account","client_email":"x@y"}}"#).unwrap();

        let err = validate(&ClientConfig::default(), Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("invalid Google credentials"));
    }

    #[test]
    fn validate_without_credentials_checks_settings_only() {
        let mut config = ClientConfig::default();
        assert!(validate(&config, None).is_ok());

        config.groups.clear();
        assert!(matches!(validate(&config, None), Err(ClientError::Config(_))));
    }
}
