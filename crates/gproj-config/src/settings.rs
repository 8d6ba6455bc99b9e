//! Optional user settings at `<config dir>/gproj/config.yaml`

use crate::error::{ConfigError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const POLL_INTERVAL_ENV: &str = "GPROJ_POLL_INTERVAL_MS";
pub const CREATE_TIMEOUT_ENV: &str = "GPROJ_CREATE_TIMEOUT_SECS";
pub const CACHE_DIR_ENV: &str = "GPROJ_CACHE_DIR";

const SETTINGS_FILE: &str = "config.yaml";
const DEFAULT_POLL_INTERVAL_MS: u64 = 400;
const DEFAULT_CREATE_TIMEOUT_SECS: u64 = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub create_timeout_secs: Option<u64>,
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

impl Settings {
    /// Settings file merged with environment overrides
    pub fn load() -> Result<Self> {
        let mut settings = match crate::get_config_dir() {
            Ok(dir) => Self::from_file(&dir.join(SETTINGS_FILE))?,
            Err(ConfigError::ConfigDirNotFound) => Self::default(),
            Err(e) => return Err(e),
        };
        settings.apply_env()?;
        Ok(settings)
    }

    /// Read a settings file; a missing file yields defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No settings file at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self =
            serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(ms) = env_number(POLL_INTERVAL_ENV)? {
            self.poll_interval_ms = Some(ms);
        }
        if let Some(secs) = env_number(CREATE_TIMEOUT_ENV)? {
            self.create_timeout_secs = Some(secs);
        }
        if let Ok(dir) = std::env::var(CACHE_DIR_ENV)
            && !dir.is_empty()
        {
            self.cache_dir = Some(PathBuf::from(dir));
        }
        self.validate()
    }

    /// A zero poll interval would re-fetch operations without pause
    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == Some(0) {
            return Err(ConfigError::InvalidSetting {
                name: "poll_interval_ms".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs.unwrap_or(DEFAULT_CREATE_TIMEOUT_SECS))
    }

    /// Root of the API catalog cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join("gproj"))
                .ok_or(ConfigError::CacheDirNotFound),
        }
    }
}

fn env_number(name: &str) -> Result<Option<u64>> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSetting {
                name: name.to_string(),
                value,
            }),
        _ => Ok(None),
    }
}
