//! Configuration loading for zapcmd.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding the zapcmd home directory.
pub const HOME_ENV: &str = "ZAPCMD_HOME";

/// Get the zapcmd home directory (~/.zapcmd, or $ZAPCMD_HOME).
pub fn get_home_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }

    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".zapcmd"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.zapcmd/settings.json
pub fn load_settings() -> Result<Settings> {
    let path = get_settings_path()?;

    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path)?;
    let settings: Settings = serde_json::from_str(&content)?;
    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.server.port == 0 {
        return Err(Error::Config("server.port must be non-zero".to_string()));
    }
    if settings.gateway.timeout_secs == 0 {
        return Err(Error::Config(
            "gateway.timeout_secs must be non-zero".to_string(),
        ));
    }
    if settings.scheduler.enabled && settings.scheduler.interval_secs == 0 {
        return Err(Error::Config(
            "scheduler.interval_secs must be non-zero when the scheduler is enabled".to_string(),
        ));
    }
    Ok(())
}

/// HTTP server configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Server {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3333
}

impl Default for Server {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Gateway client configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct GatewaySettings {
    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause between creating a group and editing it.
    #[serde(default = "default_group_settle_delay_ms")]
    pub group_settle_delay_ms: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_group_settle_delay_ms() -> u64 {
    500
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.group_settle_delay_ms)
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            group_settle_delay_ms: default_group_settle_delay_ms(),
        }
    }
}

/// Scheduled message processor configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Scheduler {
    #[serde(default = "default_scheduler_enabled")]
    pub enabled: bool,
    #[serde(default = "default_scheduler_interval_secs")]
    pub interval_secs: u64,
}

fn default_scheduler_enabled() -> bool {
    true
}

fn default_scheduler_interval_secs() -> u64 {
    60
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            enabled: default_scheduler_enabled(),
            interval_secs: default_scheduler_interval_secs(),
        }
    }
}

/// Database configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Database {
    /// SQLite file; defaults to ~/.zapcmd/zapcmd.db
    pub path: Option<PathBuf>,
}

impl Database {
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(get_home_dir()?.join("zapcmd.db")),
        }
    }
}

/// zapcmd settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub server: Server,

    #[serde(default)]
    pub gateway: GatewaySettings,

    #[serde(default)]
    pub scheduler: Scheduler,

    #[serde(default)]
    pub database: Database,
}
