//! Configuration loading and persistence for appdeps.
//!
//! Two files live under the appdeps directory (`~/.appdeps`, or
//! `$APPDEPS_HOME` when set):
//!
//! - `config.toml`: optional, read-only settings for the library itself.
//! - `preferences.toml`: the user's persisted preferences, rewritten
//!   atomically whenever the preference store is persisted.

mod paths;
mod preferences_file;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub use paths::{
    APPDEPS_HOME_ENV, config_dir, config_path, default_preferences_path, expand_env_vars,
};
pub use preferences_file::PreferencesFile;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("could not determine the home directory")]
    NoHomeDir,
}

pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[derive(Debug, Default, Deserialize)]
pub struct AppDepsConfig {
    pub preferences: Option<PreferencesConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PreferencesConfig {
    /// Override for the preferences file location. `${VAR}` references are
    /// expanded.
    pub path: Option<String>,
}

impl AppDepsConfig {
    /// Loads `config.toml` from the appdeps directory.
    ///
    /// A missing file yields `None`. Unreadable or malformed files are logged
    /// and also yield `None`, so a broken config never prevents startup.
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("Ignoring config: {err}");
                None
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Some(config))
    }

    /// The configured preferences path, if the config names one.
    #[must_use]
    pub fn preferences_path(&self) -> Option<PathBuf> {
        let raw = self.preferences.as_ref()?.path.as_deref()?;
        let expanded = expand_env_vars(raw);
        if expanded.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(expanded))
        }
    }
}

/// Where the standard preference store lives: the config override if one is
/// set, otherwise `preferences.toml` in the appdeps directory.
pub fn resolve_preferences_path() -> Result<PathBuf> {
    if let Some(path) = AppDepsConfig::load().and_then(|config| config.preferences_path()) {
        tracing::debug!(path = %path.display(), "Using configured preferences path");
        return Ok(path);
    }
    default_preferences_path().ok_or(ConfigError::NoHomeDir)
}
