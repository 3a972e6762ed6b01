use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::warn;

use crate::{
    format::DisplayOptions,
    model::{Language, MAX_COORDINATE_PRECISION},
    provider::{AcquisitionSettings, CURL_NO_CONNECTIVITY_EXIT_CODE, LocatorId},
    units::{SpeedUnit, TemperatureUnit},
};

/// Environment variable that takes precedence over the stored API key.
pub const API_KEY_ENV: &str = "OPEN_WEATHER_API_KEY";

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// language = "ru"
/// temperature_unit = "fahrenheit"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key.
    pub api_key: Option<String>,
    /// Language code for weather descriptions, e.g. "en" or "ru".
    pub language: String,
    /// Locator id, "whereami" or "ipinfo".
    pub locator: String,
    pub round_coordinates: bool,
    pub coordinate_precision: u32,
    pub timeout_secs: f64,
    pub no_connectivity_exit_code: Option<i32>,
    pub temperature_unit: String,
    pub speed_unit: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            language: Language::default().code().to_string(),
            locator: LocatorId::default().as_str().to_string(),
            round_coordinates: true,
            coordinate_precision: 2,
            timeout_secs: 5.0,
            no_connectivity_exit_code: Some(CURL_NO_CONNECTIVITY_EXIT_CODE),
            temperature_unit: TemperatureUnit::default().as_str().to_string(),
            speed_unit: SpeedUnit::default().as_str().to_string(),
        }
    }
}

impl Config {
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
        Ok(toml::from_str(contents)?)
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
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// API key from the environment if set, otherwise from the file.
    pub fn api_key(&self) -> Option<String> {
        self.api_key_with_env(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with_env(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone())
    }

    pub fn language(&self) -> Language {
        resolve_or_default("language", &self.language)
    }

    pub fn temperature_unit(&self) -> TemperatureUnit {
        resolve_or_default("temperature_unit", &self.temperature_unit)
    }

    pub fn speed_unit(&self) -> SpeedUnit {
        resolve_or_default("speed_unit", &self.speed_unit)
    }

    /// Locator as a strongly-typed id; unlike units, an unknown locator is an error.
    pub fn locator_id(&self) -> Result<LocatorId> {
        LocatorId::try_from(self.locator.as_str())
    }

    pub fn timeout(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.timeout_secs)
            .ok()
            .filter(|timeout| !timeout.is_zero())
            .ok_or_else(|| anyhow!("timeout_secs must be positive, got {}", self.timeout_secs))
    }

    /// Digits to round coordinates to, or `None` when rounding is switched off.
    pub fn coordinate_precision(&self) -> Result<Option<u32>> {
        if !self.round_coordinates {
            return Ok(None);
        }
        if self.coordinate_precision > MAX_COORDINATE_PRECISION {
            return Err(anyhow!(
                "coordinate_precision must be at most {MAX_COORDINATE_PRECISION}, got {}",
                self.coordinate_precision
            ));
        }
        Ok(Some(self.coordinate_precision))
    }

    pub fn acquisition_settings(&self) -> Result<AcquisitionSettings> {
        Ok(AcquisitionSettings {
            api_key: self.api_key(),
            language: self.language(),
            locator: self.locator_id()?,
            coordinate_precision: self.coordinate_precision()?,
            timeout: self.timeout()?,
            no_connectivity_exit_code: self.no_connectivity_exit_code,
        })
    }

    pub fn display_options(&self) -> DisplayOptions {
        DisplayOptions {
            language: self.language(),
            temperature_unit: self.temperature_unit(),
            speed_unit: self.speed_unit(),
        }
    }
}

/// Parse a display setting, falling back to its default with a warning.
fn resolve_or_default<T>(name: &str, value: &str) -> T
where
    T: Default + std::fmt::Debug + for<'a> TryFrom<&'a str, Error = anyhow::Error>,
{
    T::try_from(value).unwrap_or_else(|err| {
        let fallback = T::default();
        warn!(setting = name, error = %err, "Falling back to {fallback:?}");
        fallback
    })
}
