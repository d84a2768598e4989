//! Client configuration shared by every UCGator front end.
//!
//! A JSON file provides the API base URL, the reachability probe URL and the
//! connectivity timings. Environment variables override the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connectivity::ConnectivitySettings;
use crate::util::{is_http_url, normalize_base_url, normalize_text_option};

const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const API_BASE_URL_ENV: &str = "UCGATOR_API_BASE_URL";
pub const PROBE_URL_ENV: &str = "UCGATOR_PROBE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub api_base_url: Option<String>,
    /// URL probed by the reachability checker. Falls back to the API base URL.
    #[serde(default)]
    pub probe_url: Option<String>,
    #[serde(default)]
    pub connectivity: ConnectivitySettings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_SCHEMA_VERSION,
            api_base_url: None,
            probe_url: None,
            connectivity: ConnectivitySettings::default(),
        }
    }
}

const fn default_config_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

impl ClientConfig {
    /// Load from `path`, returning defaults when the file does not exist.
    pub fn load_from_path(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config =
            serde_json::from_str::<Self>(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let payload = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, payload).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides read through `lookup` (normally `std::env::var`).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = normalize_text_option(lookup(API_BASE_URL_ENV)) {
            self.api_base_url = Some(url);
        }
        if let Some(url) = normalize_text_option(lookup(PROBE_URL_ENV)) {
            self.probe_url = Some(url);
        }
        self.normalize();
    }

    pub fn normalize(&mut self) {
        self.api_base_url = normalize_text_option(self.api_base_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.probe_url = normalize_text_option(self.probe_url.take());
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.version != CONFIG_SCHEMA_VERSION {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {} (expected {})",
                self.version, CONFIG_SCHEMA_VERSION
            )));
        }
        for (field, value) in [
            ("api_base_url", &self.api_base_url),
            ("probe_url", &self.probe_url),
        ] {
            if let Some(value) = value {
                if !is_http_url(value) {
                    return Err(ConfigError::Invalid(format!(
                        "{field} must include http:// or https://"
                    )));
                }
            }
        }
        self.connectivity.validate().map_err(ConfigError::Invalid)
    }

    pub fn require_api_base_url(&self) -> ConfigResult<String> {
        self.api_base_url
            .as_deref()
            .and_then(normalize_base_url)
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "API base URL is not configured. Run `ucgator config set-api-url <URL>` or set {API_BASE_URL_ENV}."
                ))
            })
    }

    /// URL for reachability checks: the explicit probe URL, else the API base.
    pub fn resolved_probe_url(&self) -> Option<String> {
        normalize_text_option(self.probe_url.clone()).or_else(|| self.api_base_url.clone())
    }
}
