//! Settings for the windowed bootstrap, loaded from a TOML file.
//!
//! Every field has a default, so an empty or missing file yields a working
//! configuration.

use crate::debug_messenger::{MessageSeverity, severity_mask};
use crate::system_info::VALIDATION_LAYER_NAME;
use crate::{ConfigError, Version};
use ash::vk;
use serde::Deserialize;
use std::ffi::CString;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "vkinit.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub application: ApplicationConfig,
    pub validation: ValidationConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Window".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Values forwarded to `VkApplicationInfo`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub app_name: String,
    pub app_version: Version,
    pub engine_name: String,
    pub engine_version: Version,
    pub api_version: Version,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            app_name: "Vulkan Application".to_string(),
            app_version: Version::V1_0_0,
            engine_name: "Vulkan Engine".to_string(),
            engine_version: Version::V1_0_0,
            api_version: Version::V1_2_0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub layers: Vec<String>,
    pub message_severity: Vec<MessageSeverity>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            layers: vec![VALIDATION_LAYER_NAME.to_string_lossy().into_owned()],
            message_severity: vec![
                MessageSeverity::Verbose,
                MessageSeverity::Info,
                MessageSeverity::Warning,
                MessageSeverity::Error,
            ],
        }
    }
}

impl ValidationConfig {
    pub fn layer_names(&self) -> Result<Vec<CString>, ConfigError> {
        self.layers
            .iter()
            .map(|layer| {
                CString::new(layer.as_str()).map_err(|_| ConfigError::InvalidName(layer.clone()))
            })
            .collect()
    }

    pub fn severity_flags(&self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        severity_mask(self.message_severity.iter().copied())
    }
}

impl Config {
    /// Reads [`DEFAULT_CONFIG_PATH`], falling back to defaults on any error.
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_CONFIG_PATH).unwrap_or_else(|_e| {
            #[cfg(feature = "enable_tracing")]
            tracing::warn!("Failed to load {DEFAULT_CONFIG_PATH}: {_e}. Using defaults.");
            Config::default()
        })
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            #[cfg(feature = "enable_tracing")]
            tracing::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        #[cfg(feature = "enable_tracing")]
        {
            tracing::info!("Loaded configuration from {:?}", path);
            tracing::debug!(?config);
        }

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}
