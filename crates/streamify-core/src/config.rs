//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the provider base URL, which storage backend holds the
//! session, and the last used username.
//!
//! Configuration is stored at `~/.config/streamify/config.json`. The API key
//! is never written there; it comes from the `STREAMIFY_API_KEY` environment
//! variable (a `.env` file works too).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::api::client::DEFAULT_BASE_URL;
use crate::store::{FileBackend, KeyValueBackend, KeyringBackend, MemoryBackend};

/// Application name used for config/data directory paths
const APP_NAME: &str = "streamify";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable holding the provider API key
pub const API_KEY_ENV: &str = "STREAMIFY_API_KEY";

/// Environment variable overriding the provider base URL
pub const BASE_URL_ENV: &str = "STREAMIFY_BASE_URL";

/// Where the session and theme preference are persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    File,
    Keyring,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub storage: StorageKind,
    #[serde(default)]
    pub last_username: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Base URL from the environment, then the config file, then the default
    pub fn base_url(&self) -> String {
        Self::resolve_base_url(std::env::var(BASE_URL_ENV).ok(), self.base_url.as_deref())
    }

    fn resolve_base_url(env: Option<String>, configured: Option<&str>) -> String {
        env.filter(|v| !v.trim().is_empty())
            .or_else(|| configured.map(str::to_string))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    /// API key from the environment. Missing is a configuration error.
    pub fn api_key() -> Result<String> {
        Self::resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    fn resolve_api_key(value: Option<String>) -> Result<String> {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "{} is not set; an identity provider API key is required",
                    API_KEY_ENV
                )
            })
    }

    /// Build the configured storage backend
    pub fn storage_backend(&self) -> Result<Arc<dyn KeyValueBackend>> {
        let backend: Arc<dyn KeyValueBackend> = match self.storage {
            StorageKind::File => Arc::new(FileBackend::in_dir(&self.data_dir()?)),
            StorageKind::Keyring => Arc::new(KeyringBackend::new()),
            StorageKind::Memory => Arc::new(MemoryBackend::new()),
        };
        Ok(backend)
    }
}
