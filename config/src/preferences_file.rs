//! On-disk format of the user's preferences.
//!
//! ```toml
//! [values]
//! EnableAnalytics = false
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use appdeps_types::PreferenceKey;
use appdeps_utils::{AtomicWriteOptions, PersistMode, atomic_write_with_options, recover_bak_file};

use crate::{ConfigError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferencesFile {
    #[serde(default)]
    pub values: BTreeMap<PreferenceKey, bool>,
}

impl PreferencesFile {
    /// Reads the file at `path`. A missing file is an empty set of values.
    pub fn load(path: &Path) -> Result<Self> {
        recover_bak_file(path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self)?;
        let options = AtomicWriteOptions {
            mode: PersistMode::OwnerOnly,
            ..AtomicWriteOptions::default()
        };
        atomic_write_with_options(path, content.as_bytes(), options).map_err(|source| {
            ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        tracing::debug!(path = %path.display(), count = self.values.len(), "Saved preferences");
        Ok(())
    }
}
