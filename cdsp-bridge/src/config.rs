use crate::error::ConfigError;
use crate::volume::VolumeRange;
use anyhow::Context;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_SETTINGS_FILE_NAME: &str = "config.toml";
pub const DEVICE_NAME: &str = "CamillaDSP";
pub const DEVICE_MANUFACTURER: &str = "HEnquist";
pub const DEVICE_MODEL: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub volume: VolumeConfig,
    pub polling: PollingConfig,
}

impl AppConfig {
    pub fn parse() -> anyhow::Result<Self> {
        Self::build(
            Config::builder()
                .add_source(
                    File::with_name(config_file_path(DEFAULT_SETTINGS_FILE_NAME)?.as_str())
                        .required(false),
                )
                .add_source(File::with_name(DEFAULT_SETTINGS_FILE_NAME).required(false))
                .add_source(
                    Environment::with_prefix("cdsp_bridge")
                        .separator("__")
                        .try_parsing(true),
                ),
        )
    }

    /// Layers the given sources on top of the defaults, then deserializes and validates the result.
    pub(crate) fn build(sources: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?)
            .add_source(
                sources
                    .build()
                    .context("Failed to build config sources")?,
            )
            .build()
            .context("Failed to build config")?
            .try_deserialize::<Self>()
            .context("Failed to deserialize config")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.validate()?;
        self.volume.range()?;
        self.polling.validate()
    }
}

pub fn config_file_path(file_name: impl AsRef<Path>) -> anyhow::Result<String> {
    Ok(Path::new("/etc")
        .join(env!("CARGO_PKG_NAME").to_lowercase())
        .join(file_name)
        .to_str()
        .context("Failed to build config file path")?
        .to_string())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Base URL of the CamillaDSP backend, e.g. `http://dsp.local:5005`.
    pub url: String,
    pub timeout_secs: u64,
}

impl DeviceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid_host = |reason: &str| ConfigError::InvalidHost {
            url: self.url.clone(),
            reason: reason.to_string(),
        };

        if self.url.trim().is_empty() {
            return Err(invalid_host("URL is empty"));
        }
        let url = Url::parse(&self.url).map_err(|err| invalid_host(&err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid_host("scheme must be http or https"));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid_host("URL has no host"));
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid_value(
                "device.timeout_secs",
                "timeout must be at least one second",
            ));
        }
        Ok(())
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            url: "".to_string(),
            timeout_secs: 60,
        }
    }
}

/// User-editable volume options, all values in dB.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VolumeConfig {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl VolumeConfig {
    pub fn range(&self) -> Result<VolumeRange, ConfigError> {
        VolumeRange::new(self.min, self.max, self.step)
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        let range = VolumeRange::default();
        Self {
            min: range.min(),
            max: range.max(),
            step: range.step_db(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PollingConfig {
    pub scan_interval_secs: u64,
}

impl PollingConfig {
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan_interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "polling.scan_interval_secs",
                "interval must be at least one second",
            ));
        }
        Ok(())
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: 10,
        }
    }
}
