use std::{collections::HashMap, fs, path::Path};

use anyhow::{Context, Result};
use client_core::ClientSettings;
use tracing::warn;

use crate::theme::Theme;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub client: ClientSettings,
    pub theme: Theme,
}

impl ConsoleSettings {
    /// `console.toml` (if present), then `APP__THEME`, then the CLI flags.
    pub fn load(
        file: &Path,
        api_url_flag: Option<&str>,
        theme_flag: Option<Theme>,
    ) -> Result<Self> {
        let file = file.exists().then_some(file);
        let mut client = ClientSettings::load(file).context("loading record service url")?;
        if let Some(url) = api_url_flag {
            client.api_url = client_core::config::normalize_base_url(url)
                .with_context(|| format!("invalid --api-url '{url}'"))?;
        }

        let mut theme = Theme::default();
        if let Some(path) = file {
            match fs::read_to_string(path) {
                Ok(raw) => theme = theme_from_file(&raw).unwrap_or(theme),
                Err(error) => warn!(path = %path.display(), %error, "config: settings file not readable"),
            }
        }
        if let Ok(raw) = std::env::var("APP__THEME") {
            theme = parse_theme_override("APP__THEME", &raw).unwrap_or(theme);
        }
        if let Some(flag) = theme_flag {
            theme = flag;
        }

        Ok(Self { client, theme })
    }
}

pub fn theme_from_file(raw: &str) -> Option<Theme> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw).ok()?;
    let value = file_cfg.get("theme").and_then(toml::Value::as_str)?;
    parse_theme_override("theme", value)
}

fn parse_theme_override(source: &str, raw: &str) -> Option<Theme> {
    match raw.parse() {
        Ok(theme) => Some(theme),
        Err(error) => {
            warn!(source, %error, "config: ignoring theme override");
            None
        }
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
