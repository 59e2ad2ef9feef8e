use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "dealflow.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub api_token: Option<String>,
    pub notification_ttl_ms: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            api_token: None,
            notification_ttl_ms: 3000,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FileSettings {
    api_url: Option<String>,
    api_token: Option<String>,
    notification_ttl_ms: Option<u64>,
    log_filter: Option<String>,
}

/// Reads `dealflow.toml` (or `config_path` when given) and applies
/// environment overrides. A missing default file is not an error; a missing
/// explicit one is.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let file = read_file_settings(&path, config_path.is_some())?;
    Ok(resolve(file, |key| std::env::var(key).ok()))
}

pub(crate) fn read_file_settings(
    path: &Path,
    required: bool,
) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let parsed = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    Ok(Some(parsed))
}

/// Layers file values and then environment values over the defaults.
pub(crate) fn resolve(
    file: Option<FileSettings>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(file) = file {
        if let Some(v) = file.api_url {
            settings.api_url = v;
        }
        if let Some(v) = file.api_token {
            settings.api_token = Some(v);
        }
        if let Some(v) = file.notification_ttl_ms {
            settings.notification_ttl_ms = v;
        }
        if let Some(v) = file.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("DEALFLOW_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = env("DEALFLOW_API_TOKEN") {
        settings.api_token = Some(v);
    }
    if let Some(v) = env("APP__API_TOKEN") {
        settings.api_token = Some(v);
    }

    if let Some(v) = env("APP__NOTIFICATION_TTL_MS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.notification_ttl_ms = parsed;
        }
    }

    if let Some(v) = env("RUST_LOG") {
        settings.log_filter = v;
    }

    settings.api_url = normalize_api_url(&settings.api_url);
    settings.api_token = settings
        .api_token
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());
    settings
}

pub fn normalize_api_url(raw_api_url: &str) -> String {
    let raw_api_url = raw_api_url.trim();

    if raw_api_url.is_empty() {
        return Settings::default().api_url;
    }

    let with_scheme = if raw_api_url.contains("://") {
        raw_api_url.to_string()
    } else {
        format!("http://{raw_api_url}")
    };
    with_scheme.trim_end_matches('/').to_string()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
