//! Console configuration management.
//!
//! This module handles loading and saving the console configuration: the
//! backend base URL, the endpoint and page paths both controllers use, and
//! the storage key of the token slot.
//!
//! Configuration is stored at `~/.config/smartio-admin/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
pub const APP_NAME: &str = "smartio-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Storage key of the single persisted token slot
pub const DEFAULT_STORAGE_KEY: &str = "admin_access_token";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    /// Token exchange endpoint (form-urlencoded POST)
    pub token_endpoint: String,
    /// Current-identity endpoint (bearer GET)
    pub identity_endpoint: String,
    pub login_path: String,
    pub dashboard_path: String,
    pub storage_key: String,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            token_endpoint: "/admin/token".to_string(),
            identity_endpoint: "/api/admin/me".to_string(),
            login_path: "/admin/login".to_string(),
            dashboard_path: "/admin".to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults when absent
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the file-backed token store.
    pub fn data_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find local data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Whether `path` names the login page.
    pub fn is_login_path(&self, path: &str) -> bool {
        path == self.login_path
    }

    /// Whether `path` names the protected dashboard.
    pub fn is_dashboard_path(&self, path: &str) -> bool {
        path == self.dashboard_path
    }
}
