use std::env;
use std::path::PathBuf;

use nexus_app_state::{AppSettings, default_storage_dir};
use thiserror::Error;

pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub settings_dir: PathBuf,
    pub log_filter: String,
    pub base_url_override: Option<String>,
    pub token_override: Option<String>,
    pub storage_disabled: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid NEXUS_SETTINGS_DIR: {0}")]
    InvalidSettingsDir(String),
    #[error("invalid NEXUS_API_BASE_URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid NEXUS_NO_STORAGE: {0}")]
    InvalidNoStorage(String),
}

impl CliConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let settings_dir = match lookup("NEXUS_SETTINGS_DIR") {
            Some(raw) if raw.trim().is_empty() => {
                return Err(ConfigError::InvalidSettingsDir("empty path".to_string()));
            }
            Some(raw) => PathBuf::from(raw.trim()),
            None => default_storage_dir(),
        };

        let log_filter = lookup("NEXUS_LOG")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

        let base_url_override = non_empty(lookup("NEXUS_API_BASE_URL"));
        if let Some(url) = base_url_override.as_deref()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidBaseUrl(url.to_string()));
        }

        let token_override = non_empty(lookup("NEXUS_API_TOKEN"));

        let storage_disabled = match lookup("NEXUS_NO_STORAGE") {
            None => false,
            Some(raw) => parse_bool(&raw).map_err(ConfigError::InvalidNoStorage)?,
        };

        Ok(Self {
            settings_dir,
            log_filter,
            base_url_override,
            token_override,
            storage_disabled,
        })
    }

    /// Loaded settings with the per-invocation overrides applied.
    #[must_use]
    pub fn effective_settings(&self, stored: &AppSettings) -> AppSettings {
        AppSettings {
            api_base_url: self
                .base_url_override
                .clone()
                .unwrap_or_else(|| stored.api_base_url.clone()),
            api_token: self
                .token_override
                .clone()
                .unwrap_or_else(|| stored.api_token.clone()),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(other.to_string()),
    }
}
