//! Settings loading from config.toml
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! Secrets never live here: the cron bearer secret is read from the
//! `CRON_SECRET` environment variable right before it is used.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "RECURRING_INCOME_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[server]` section
    pub server: ServerSettings,
    /// `[jobs]` section
    pub jobs: JobSettings,
    /// `[cleanup]` section
    pub cleanup: CleanupSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Socket address the trigger endpoints listen on
    pub bind_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Settings shared by the income jobs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobSettings {
    /// Prefix marking an income as subscription-derived
    pub subscription_source_prefix: String,
    /// Hard cap on billing dates produced for one subscription
    pub max_occurrences: usize,
    /// Whether the reconciler promotes past-due pending incomes to paid
    pub promote_past_due: bool,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            subscription_source_prefix: "Subscription: ".to_string(),
            max_occurrences: 1000,
            promote_past_due: true,
        }
    }
}

/// Plan expiry and data retention windows, in days
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupSettings {
    /// Days before expiry the first warning goes out
    pub first_warning_days: i64,
    /// Days before expiry the final warning goes out
    pub final_warning_days: i64,
    /// Days an account stays blocked before its data is purged
    pub deletion_grace_days: i64,
}

impl Default for CleanupSettings {
    fn default() -> Self {
        Self {
            first_warning_days: 30,
            final_warning_days: 7,
            deletion_grace_days: 30,
        }
    }
}

impl Settings {
    /// Rejects settings the jobs cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.jobs.subscription_source_prefix.trim().is_empty() {
            return Err(Error::Config {
                message: "jobs.subscription_source_prefix must not be empty".to_string(),
            });
        }
        if self.jobs.max_occurrences == 0 {
            return Err(Error::Config {
                message: "jobs.max_occurrences must be at least 1".to_string(),
            });
        }
        let cleanup = &self.cleanup;
        if cleanup.final_warning_days < 0
            || cleanup.first_warning_days < cleanup.final_warning_days
            || cleanup.deletion_grace_days < 0
        {
            return Err(Error::Config {
                message: format!(
                    "cleanup windows are inconsistent: first={} final={} grace={}",
                    cleanup.first_warning_days,
                    cleanup.final_warning_days,
                    cleanup.deletion_grace_days
                ),
            });
        }
        Ok(())
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The resulting settings fail [`Settings::validate`]
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    debug!("Loading settings from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    parse_settings(&contents)
}

/// Parses and validates settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from `$RECURRING_INCOME_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: defaults are used instead.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("No config file at {}, using default settings", path);
        Ok(Settings::default())
    }
}

/// Reads the shared cron secret from `CRON_SECRET`.
pub fn cron_secret() -> Result<String> {
    let secret = std::env::var("CRON_SECRET")?;
    if secret.trim().is_empty() {
        return Err(Error::Config {
            message: "CRON_SECRET is set but empty".to_string(),
        });
    }
    Ok(secret)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_partial_settings_keeps_defaults() {
        let toml_str = r#"
            [jobs]
            subscription_source_prefix = "Retainer - "

            [cleanup]
            deletion_grace_days = 14
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.jobs.subscription_source_prefix, "Retainer - ");
        assert_eq!(settings.jobs.max_occurrences, 1000);
        assert!(settings.jobs.promote_past_due);
        assert_eq!(settings.cleanup.first_warning_days, 30);
        assert_eq!(settings.cleanup.final_warning_days, 7);
        assert_eq!(settings.cleanup.deletion_grace_days, 14);
        assert_eq!(settings.server.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn test_parse_empty_settings() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.jobs.subscription_source_prefix, "Subscription: ");
    }

    #[test]
    fn test_rejects_zero_occurrence_cap() {
        let result = parse_settings("[jobs]\nmax_occurrences = 0\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_inverted_warning_windows() {
        let result = parse_settings("[cleanup]\nfirst_warning_days = 3\nfinal_warning_days = 7\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_rejects_malformed_toml() {
        let result = parse_settings("[jobs\nmax_occurrences = ");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
