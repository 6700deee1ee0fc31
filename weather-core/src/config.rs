use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::{model::Coordinates, present::Units};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data";
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// Where location fixes come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Fixed coordinates, used before any network lookup.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Resolve the location from the public IP address.
    pub ip_lookup: bool,
    pub ip_lookup_url: String,

    /// Upper bound on waiting for a location fix.
    pub timeout_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            ip_lookup: true,
            ip_lookup_url: DEFAULT_IP_LOOKUP_URL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl LocationConfig {
    pub fn fixed_coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
    /// When false, the network is assumed to be available.
    pub check: bool,
    pub sysfs_root: PathBuf,
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self { check: true, sysfs_root: PathBuf::from("/sys/class/net") }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// units = "metric"
///
/// [location]
/// latitude = 44.34
/// longitude = 10.99
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: String,

    /// Overrides the units derived from the locale.
    pub units: Option<Units>,

    /// Overrides the locale read from the environment.
    pub locale: Option<String>,

    pub http_timeout_secs: u64,
    pub location: LocationConfig,
    pub connectivity: ConnectivityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            units: None,
            locale: None,
            http_timeout_secs: 10,
            location: LocationConfig::default(),
            connectivity: ConnectivityConfig::default(),
        }
    }
}

impl Config {
    /// Return the API key or a hint on how to configure it.
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty()).ok_or_else(|| {
            anyhow!(
                "No API key configured.\n\
                 Hint: run `weather configure` and enter your OpenWeather API key."
            )
        })
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    pub fn set_fixed_location(&mut self, coords: Option<Coordinates>) {
        self.location.latitude = coords.map(|c| c.latitude);
        self.location.longitude = coords.map(|c| c.longitude);
    }

    /// Locale string used for the unit label, e.g. `en_US.UTF-8`.
    pub fn effective_locale(&self) -> String {
        if let Some(locale) = &self.locale {
            return locale.clone();
        }

        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find(|v| !v.is_empty())
            .unwrap_or_default()
    }

    /// Units requested from the provider and shown in the label.
    pub fn effective_units(&self) -> Units {
        self.units.unwrap_or_else(|| Units::for_locale(&self.effective_locale()))
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

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
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the persisted preference namespaces.
    pub fn preferences_dir() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("prefs"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
