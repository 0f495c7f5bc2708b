//! Client-side settings: where the record service lives.

use std::{collections::HashMap, fs, path::Path};

use tracing::warn;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base URL including any proxy prefix (e.g. `http://localhost:3000/api`).
    pub api_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
        }
    }
}

impl ClientSettings {
    /// Defaults, then the optional TOML file, then environment variables.
    /// The resulting URL is validated and normalized.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = Self::default();
        if let Some(path) = file {
            match fs::read_to_string(path) {
                Ok(raw) => settings.apply_file_overrides(&raw),
                Err(error) => {
                    warn!(path = %path.display(), %error, "config: settings file not readable")
                }
            }
        }
        settings.apply_env_overrides(|key| std::env::var(key).ok());
        settings.api_url = normalize_base_url(&settings.api_url)?;
        Ok(settings)
    }

    pub fn apply_file_overrides(&mut self, raw: &str) {
        match toml::from_str::<HashMap<String, toml::Value>>(raw) {
            Ok(file_cfg) => {
                if let Some(v) = file_cfg.get("api_url").and_then(toml::Value::as_str) {
                    self.api_url = v.to_string();
                }
            }
            Err(error) => warn!(%error, "config: ignoring unparsable settings file"),
        }
    }

    pub fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(v) = env("RECORDS_API_URL") {
            self.api_url = v;
        }
        if let Some(v) = env("APP__API_URL") {
            self.api_url = v;
        }
    }
}

/// Accepts `host:port`, `http(s)://host[:port][/prefix]`; returns the URL
/// without a trailing slash so route paths can be appended directly.
pub fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(DEFAULT_API_URL.to_string());
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    let url = Url::parse(&candidate).map_err(|source| ConfigError::InvalidUrl {
        raw: raw.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::UnsupportedScheme {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::UnexpectedSuffix {
            raw: raw.to_string(),
        });
    }

    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
