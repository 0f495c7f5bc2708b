use std::{collections::HashMap, fs, time::Duration};

use tracing::warn;

pub const SETTINGS_FILE: &str = "server.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    pub db_connect_attempts: u32,
    pub db_connect_retry_delay: Duration,
    pub max_body_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "0.0.0.0:5001".into(),
            database_url: "sqlite://./data/students.db".into(),
            db_connect_attempts: 20,
            db_connect_retry_delay: Duration::from_secs(2),
            max_body_bytes: 64 * 1024,
        }
    }
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

pub(crate) fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(%error, file = SETTINGS_FILE, "config: ignoring unparsable settings file");
            return;
        }
    };

    if let Some(v) = file_cfg.get("bind_addr").and_then(toml::Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("database_url").and_then(toml::Value::as_str) {
        settings.database_url = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("db_connect_attempts")
        .and_then(toml::Value::as_integer)
    {
        settings.db_connect_attempts = v.max(1) as u32;
    }
    if let Some(v) = file_cfg
        .get("db_connect_retry_delay_secs")
        .and_then(toml::Value::as_integer)
    {
        settings.db_connect_retry_delay = Duration::from_secs(v.max(0) as u64);
    }
    if let Some(v) = file_cfg.get("max_body_bytes").and_then(toml::Value::as_integer) {
        settings.max_body_bytes = v.max(0) as usize;
    }
}

pub(crate) fn apply_env_overrides(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__DB_CONNECT_ATTEMPTS") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.db_connect_attempts = parsed.max(1);
        }
    }
    if let Some(v) = env("APP__DB_CONNECT_RETRY_DELAY_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.db_connect_retry_delay = Duration::from_secs(parsed);
        }
    }
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
