//! Application configuration management.
//!
//! Configuration is read from `~/.config/knowify-rejected/config.json` when
//! present and then overridden by `KNOWIFY_*` environment variables.
//! The session key is only ever taken from the environment or the file and
//! is never written back.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::{API_BASE_URL, REPORTING_BASE_URL};
use crate::auth::SessionStore;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "knowify-rejected";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: String,
    pub api_base_url: String,
    pub reporting_base_url: String,
    pub session_file: Option<PathBuf>,
    #[serde(skip_serializing)]
    pub session_key: Option<String>,
    pub log_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            api_base_url: API_BASE_URL.to_string(),
            reporting_base_url: REPORTING_BASE_URL.to_string(),
            session_file: None,
            session_key: None,
            log_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (if any), then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                serde_json::from_str(&contents)
                    .with_context(|| format!("Failed to parse config file {}", path.display()))?
            }
            _ => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Override fields from `KNOWIFY_*` variables; empty values are ignored
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("KNOWIFY_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = var("KNOWIFY_API_BASE_URL") {
            self.api_base_url = v;
        }
        if let Some(v) = var("KNOWIFY_REPORTING_BASE_URL") {
            self.reporting_base_url = v;
        }
        if let Some(v) = var("KNOWIFY_SESSION_FILE") {
            self.session_file = Some(PathBuf::from(v));
        }
        if let Some(v) = var("KNOWIFY_SESSION_KEY") {
            self.session_key = Some(v);
        }
        if let Some(v) = var("KNOWIFY_LOG_DIR") {
            self.log_dir = Some(PathBuf::from(v));
        }
    }

    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Where the session lives: the configured file, else the user cache dir,
    /// else the working directory
    pub fn session_path(&self) -> PathBuf {
        if let Some(ref path) = self.session_file {
            return path.clone();
        }
        dirs::cache_dir()
            .map(|dir| dir.join(APP_NAME).join(SESSION_FILE))
            .unwrap_or_else(|| PathBuf::from(SESSION_FILE))
    }

    pub fn session_store(&self) -> SessionStore {
        let store = SessionStore::new(self.session_path());
        match self.session_key {
            Some(ref key) => store.with_session_key(key.clone()),
            None => store,
        }
    }
}
