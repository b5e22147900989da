use anyhow::{Context, anyhow};
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod tests;

// TOML configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub request_timeout: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PollConfig {
    #[serde(default)]
    pub interval: Option<String>,
    #[serde(default)]
    pub max_attempts: Option<u32>,
    #[serde(default)]
    pub max_consecutive_errors: Option<u32>,
    #[serde(default)]
    pub max_wait: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct CacheConfig {
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: Option<String>,
}

fn default_value(name: &str) -> Option<&'static str> {
    match name {
        "API_BASE_URL" => Some("http://localhost:8000"),
        "REQUEST_TIMEOUT" => Some("30s"),
        "CACHE_DIR" => Some(".video_tracker/cache"),
        "LOG_FORMAT" => Some("term"),
        _ => None,
    }
}

static CONFIG: Lazy<Config> = Lazy::new(|| {
    load_config().unwrap_or_else(|e| {
        eprintln!(
            "Warning: Failed to load config files: {}. Using defaults.",
            e
        );
        Config::default()
    })
});

static CONFIG_STORE: Lazy<Arc<Mutex<HashMap<String, String>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

pub fn get(name: &str) -> anyhow::Result<String> {
    match lookup(name)? {
        Some(value) => Ok(value),
        // Priority 4: built-in defaults
        None => default_value(name)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("Configuration key not found: {}", name)),
    }
}

/// Like [`get`] but without built-in defaults; keys whose default lives with
/// their consumer (the poll limits) are read through this.
fn lookup(name: &str) -> anyhow::Result<Option<String>> {
    // Priority 1: CONFIG_STORE (runtime overrides)
    if let Some(value) = get_from_store(name) {
        if value.is_empty() {
            return Err(anyhow!("{} is empty", name));
        }
        return Ok(Some(value));
    }

    // Priority 2: Environment variables
    if let Ok(val) = std::env::var(name)
        && !val.is_empty()
    {
        return Ok(Some(val));
    }

    // Priority 3: TOML config
    let toml_value = match name {
        "API_BASE_URL" => CONFIG.api.base_url.clone(),
        "REQUEST_TIMEOUT" => CONFIG.api.request_timeout.clone(),
        "POLL_INTERVAL" => CONFIG.poll.interval.clone(),
        "POLL_MAX_ATTEMPTS" => CONFIG.poll.max_attempts.map(|v| v.to_string()),
        "POLL_MAX_CONSECUTIVE_ERRORS" => CONFIG.poll.max_consecutive_errors.map(|v| v.to_string()),
        "POLL_MAX_WAIT" => CONFIG.poll.max_wait.clone(),
        "CACHE_DIR" => CONFIG.cache.dir.clone(),
        "LOG_FORMAT" => CONFIG.logging.format.clone(),
        _ => None,
    };

    Ok(toml_value.filter(|value| !value.is_empty()))
}

/// Reads `name` and parses it with `FromStr`.
pub fn get_parsed<T>(name: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = get(name)?;
    raw.parse::<T>()
        .with_context(|| format!("invalid value for {}: {:?}", name, raw))
}

/// Reads `name` as a humantime duration such as `5s` or `5m`.
pub fn get_duration(name: &str) -> anyhow::Result<Duration> {
    parse_duration(name, &get(name)?)
}

/// [`get_parsed`] falling back to `default` when `name` is not configured.
pub fn get_parsed_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name)? {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("invalid value for {}: {:?}", name, raw)),
        None => Ok(default),
    }
}

/// [`get_duration`] falling back to `default` when `name` is not configured.
pub fn get_duration_or(name: &str, default: Duration) -> anyhow::Result<Duration> {
    match lookup(name)? {
        Some(raw) => parse_duration(name, &raw),
        None => Ok(default),
    }
}

fn parse_duration(name: &str, raw: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(raw).with_context(|| format!("invalid duration for {}: {:?}", name, raw))
}

/// Overrides a value at runtime; mainly for tests.
#[doc(hidden)]
pub fn set(name: &str, value: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.insert(name.to_string(), value.to_string());
    }
}

#[doc(hidden)]
pub fn remove(name: &str) {
    if let Ok(mut store) = CONFIG_STORE.lock() {
        store.remove(name);
    }
}

/// Sets an override in CONFIG_STORE and restores the previous value on drop,
/// even when the test panics.
#[doc(hidden)]
pub struct ConfigGuard {
    key: String,
    previous: Option<String>,
}

impl ConfigGuard {
    pub fn new(key: &str, value: &str) -> Self {
        let previous = get_from_store(key);
        set(key, value);
        Self {
            key: key.to_string(),
            previous,
        }
    }
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(prev) => set(&self.key, prev),
            None => remove(&self.key),
        }
    }
}

fn get_from_store(name: &str) -> Option<String> {
    if let Ok(store) = CONFIG_STORE.lock() {
        store.get(name).cloned()
    } else {
        None
    }
}

/// Load configuration from TOML files with priority:
/// 1. config/config.local.toml (git-ignored, for local overrides)
/// 2. config/config.toml (git-managed template)
/// 3. Default values
fn load_config() -> anyhow::Result<Config> {
    let mut config = Config::default();

    let base_path = "config/config.toml";
    if Path::new(base_path).exists() {
        let content = fs::read_to_string(base_path)?;
        config = toml::from_str(&content)?;
    }

    let local_path = "config/config.local.toml";
    if Path::new(local_path).exists() {
        let content = fs::read_to_string(local_path)?;
        let local_config: Config = toml::from_str(&content)?;
        merge_config(&mut config, local_config);
    }

    Ok(config)
}

/// Merge local config into base config (local values override base values)
fn merge_config(base: &mut Config, local: Config) {
    fn take<T>(base: &mut Option<T>, local: Option<T>) {
        if local.is_some() {
            *base = local;
        }
    }

    take(&mut base.api.base_url, local.api.base_url);
    take(&mut base.api.request_timeout, local.api.request_timeout);
    take(&mut base.poll.interval, local.poll.interval);
    take(&mut base.poll.max_attempts, local.poll.max_attempts);
    take(
        &mut base.poll.max_consecutive_errors,
        local.poll.max_consecutive_errors,
    );
    take(&mut base.poll.max_wait, local.poll.max_wait);
    take(&mut base.cache.dir, local.cache.dir);
    take(&mut base.logging.format, local.logging.format);
}
