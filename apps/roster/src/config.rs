use std::{fs, num::NonZeroUsize, path::Path, time::Duration};

use anyhow::Context;
use client_core::{sort::DEFAULT_SORT_KEY, DEFAULT_PAGE_SIZE};

pub const DEFAULT_CONFIG_PATH: &str = "roster.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint_url: String,
    pub page_size: NonZeroUsize,
    pub request_timeout_secs: u64,
    pub sort_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint_url: "http://127.0.0.1:4000/graphql".into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 15,
            sort_key: DEFAULT_SORT_KEY.into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// [`load_settings`] with the environment read through `lookup`.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> anyhow::Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        apply_file_settings(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    }

    apply_env_overrides(&mut settings, lookup);
    Ok(settings)
}

pub(crate) fn apply_file_settings(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: toml::Table = toml::from_str(raw)?;

    if let Some(v) = table.get("endpoint_url").and_then(toml::Value::as_str) {
        settings.endpoint_url = v.to_string();
    }
    if let Some(v) = table.get("page_size").and_then(value_as_u64) {
        if let Some(page_size) = usize::try_from(v).ok().and_then(NonZeroUsize::new) {
            settings.page_size = page_size;
        }
    }
    if let Some(v) = table.get("request_timeout_secs").and_then(value_as_u64) {
        settings.request_timeout_secs = v;
    }
    if let Some(v) = table.get("sort_key").and_then(toml::Value::as_str) {
        settings.sort_key = v.to_string();
    }

    Ok(())
}

pub(crate) fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ROSTER_ENDPOINT_URL") {
        settings.endpoint_url = v;
    }
    if let Some(v) = lookup("APP__ENDPOINT_URL") {
        settings.endpoint_url = v;
    }

    if let Some(page_size) = lookup("APP__PAGE_SIZE")
        .and_then(|v| v.trim().parse::<usize>().ok())
        .and_then(NonZeroUsize::new)
    {
        settings.page_size = page_size;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }

    if let Some(v) = lookup("APP__SORT_KEY") {
        if !v.trim().is_empty() {
            settings.sort_key = v.trim().to_string();
        }
    }
}

fn value_as_u64(value: &toml::Value) -> Option<u64> {
    match value {
        toml::Value::Integer(v) => u64::try_from(*v).ok(),
        toml::Value::String(v) => v.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
