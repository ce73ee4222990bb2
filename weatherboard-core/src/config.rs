use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{alert::DEFAULT_HEAT_THRESHOLD_C, source::SourceId, units::Units};

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:5000/api/weather";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Credentials and city list for the OpenWeather source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenWeatherConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_cities")]
    pub cities: Vec<String>,
}

impl Default for OpenWeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            cities: default_cities(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// source = "endpoint"
/// endpoint = "http://127.0.0.1:5000/api/weather"
/// poll_interval_secs = 300
///
/// [openweather]
/// api_key = "..."
/// cities = ["Delhi", "Mumbai"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// "endpoint" or "openweather".
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_threshold")]
    pub alert_threshold_c: f64,
    #[serde(default)]
    pub units: Units,
    #[serde(default)]
    pub openweather: OpenWeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: default_source(),
            endpoint: default_endpoint(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            alert_threshold_c: DEFAULT_HEAT_THRESHOLD_C,
            units: Units::default(),
            openweather: OpenWeatherConfig::default(),
        }
    }
}

fn default_source() -> String {
    SourceId::Endpoint.as_str().to_string()
}
fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_threshold() -> f64 {
    DEFAULT_HEAT_THRESHOLD_C
}
fn default_cities() -> Vec<String> {
    ["Delhi", "Mumbai", "Chennai", "Hyderabad", "Bangalore", "Kolkata"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Config {
    /// Return the configured source as a strongly-typed SourceId.
    pub fn source_id(&self) -> Result<SourceId> {
        SourceId::try_from(self.source.as_str())
    }

    pub fn set_source(&mut self, id: SourceId) {
        self.source = id.as_str().to_string();
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn openweather_api_key(&self) -> Option<&str> {
        self.openweather.api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn set_openweather_api_key(&mut self, api_key: String) {
        self.openweather.api_key = Some(api_key);
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(contents)?;
        cfg.source_id()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weatherboard", "weatherboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
