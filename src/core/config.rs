use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MdashError;

/// Application key of the maintenance manager whose tags the table shows.
pub const DEFAULT_MANAGER_APP_KEY: &str = "maintenance_manager_1";

/// Application key of the dashboard entry holding the device map.
pub const DEFAULT_APP_KEY: &str = "maintenance_dashboard_1";

pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// The widget's own configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Dashboard application key; selects `applications.<app_key>.DEVICE_MAP`.
    pub app_key: String,
    /// Namespace of the service tags and prefix of the reset command.
    pub manager_app_key: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            app_key: DEFAULT_APP_KEY.to_string(),
            manager_app_key: DEFAULT_MANAGER_APP_KEY.to_string(),
        }
    }
}

/// Where channel data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedSource {
    /// JSON-lines replay file.
    File {
        path: String,
        #[serde(default)]
        pace_ms: u64,
    },
    /// Live WebSocket channel server.
    WebSocket { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Coordinating agent whose deployment config lists the devices
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub widget: WidgetConfig,
    #[serde(default)]
    pub feed: Option<FeedSource>,
    #[serde(default = "default_refresh_secs")]
    pub refresh_secs: u64,
}

fn default_refresh_secs() -> u64 {
    DEFAULT_REFRESH_SECS
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            agent_id: None,
            widget: WidgetConfig::default(),
            feed: None,
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl DashboardConfig {
    /// Load from the default location.
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from `path`. A missing, empty or unreadable file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(Self::default());
        }

        Ok(serde_json::from_str(&data).unwrap_or_else(|e| {
            // The format may have changed between versions
            log::warn!("ignoring unreadable config {:?}: {}", path, e);
            Self::default()
        }))
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(path, data).with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("mdash").join("config.json"))
    }

    /// Refresh period for relative timestamps, at least one second.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_secs.max(1))
    }

    /// Check the values a running dashboard cannot do without.
    pub fn validate(&self) -> crate::Result<()> {
        if self.widget.app_key.trim().is_empty() {
            return Err(MdashError::config("app_key must not be empty"));
        }
        if self.widget.manager_app_key.trim().is_empty() {
            return Err(MdashError::config("manager_app_key must not be empty"));
        }
        match self.agent_id.as_deref() {
            Some(id) if !id.trim().is_empty() => Ok(()),
            _ => Err(MdashError::config(
                "agent id is required (use --agent-id or set agent_id in the config file)",
            )),
        }
    }
}
