//! Process configuration read from the environment.
//!
//! # Invariants
//! - Blank variables count as unset.
//! - `log_level` is always one of `trace|debug|info|warn|error`.
//! - A configured `log_dir` is absolute.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const DB_PATH_VAR: &str = "FLEET_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "FLEET_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "FLEET_LOG_DIR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidLogLevel(String),
    RelativeLogDir(PathBuf),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{LOG_DIR_VAR} must be an absolute path, got `{}`",
                path.display()
            ),
        }
    }
}

impl Error for ConfigError {}

/// Where the ledger lives and how the process logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetConfig {
    /// `None` keeps the ledger in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: &'static str,
    /// `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl FleetConfig {
    /// Reads `FLEET_DB_PATH`, `FLEET_LOG_LEVEL` and `FLEET_LOG_DIR`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`FleetConfig::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|raw| raw.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            db_path: read(DB_PATH_VAR).map(PathBuf::from),
            ..Self::default()
        };
        if let Some(level) = read(LOG_LEVEL_VAR) {
            config = config.with_log_level(&level)?;
        }
        if let Some(dir) = read(LOG_DIR_VAR) {
            config = config.with_log_dir(dir)?;
        }
        Ok(config)
    }

    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_log_level(mut self, level: &str) -> Result<Self, ConfigError> {
        self.log_level = normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        Ok(self)
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let dir = dir.into();
        if !Path::new(&dir).is_absolute() {
            return Err(ConfigError::RelativeLogDir(dir));
        }
        self.log_dir = Some(dir);
        Ok(self)
    }
}
