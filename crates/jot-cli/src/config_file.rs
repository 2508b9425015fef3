//! Persistent CLI configuration.

use std::env;
use std::path::{Path, PathBuf};

use jot_core::util::normalize_text_option;
use jot_core::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

const CONFIG_FILE_NAME: &str = "cli-config.json";
const CACHE_FILE_NAME: &str = "cache.db";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, CliError> {
    dirs::config_dir()
        .map(|dir| dir.join("jot").join(CONFIG_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI config directory".into()))
}

pub fn default_cache_path() -> Result<PathBuf, CliError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("jot").join(CACHE_FILE_NAME))
        .ok_or_else(|| CliError::Config("Failed to resolve local data directory".into()))
}

impl CliConfig {
    pub fn load_from_path(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|error| {
            CliError::Config(format!(
                "Failed to read config at {}: {}",
                path.display(),
                error
            ))
        })?;
        let mut config = serde_json::from_str::<Self>(&raw).map_err(|error| {
            CliError::Config(format!(
                "Failed to parse config at {}: {}",
                path.display(),
                error
            ))
        })?;
        config.normalize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), CliError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Transport config from, in order of precedence: the `--base-url`
    /// flag, `JOT_*` environment variables, this file, and defaults.
    pub fn client_config(&self, base_url_flag: Option<String>) -> Result<ClientConfig, CliError> {
        self.client_config_with(base_url_flag, |key| env::var(key).ok())
    }

    fn client_config_with(
        &self,
        base_url_flag: Option<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<ClientConfig, CliError> {
        let mut config = ClientConfig::default();
        if let Some(url) = normalize_text_option(self.base_url.clone()) {
            config.base_url = url;
        }
        let mut config = config.with_overrides(lookup)?;
        if let Some(url) = normalize_text_option(base_url_flag) {
            config.base_url = url;
            config.validate()?;
        }
        Ok(config)
    }

    pub fn cache_path(&self, flag: Option<PathBuf>) -> Result<PathBuf, CliError> {
        match flag.or_else(|| self.cache_path.clone()) {
            Some(path) => Ok(path),
            None => default_cache_path(),
        }
    }

    fn normalize(&mut self) {
        self.base_url = normalize_text_option(self.base_url.take());
    }
}
