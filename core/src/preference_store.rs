//! Boolean user preferences with registered defaults.
//!
//! Lookups check the user's explicit values first, then the registered
//! defaults, then fall back to `false`. Only explicit values are persisted.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{OnceLock, PoisonError, RwLock};

use appdeps_config::{PreferencesFile, resolve_preferences_path};
use appdeps_types::PreferenceKey;

use crate::errors::Result;

#[derive(Debug, Default)]
struct StoreState {
    defaults: HashMap<PreferenceKey, bool>,
    values: BTreeMap<PreferenceKey, bool>,
}

#[derive(Debug)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    state: RwLock<StoreState>,
}

static STANDARD: OnceLock<PreferenceStore> = OnceLock::new();

impl PreferenceStore {
    /// A store that lives only in memory; [`persist`](Self::persist) is a no-op.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Opens the store backed by `path`, loading any values already saved
    /// there.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = PreferencesFile::load(&path)?;
        tracing::debug!(path = %path.display(), count = file.values.len(), "Loaded preferences");
        Ok(Self {
            path: Some(path),
            state: RwLock::new(StoreState {
                defaults: HashMap::new(),
                values: file.values,
            }),
        })
    }

    /// The process-wide store, opened on first use at the configured
    /// preferences path.
    ///
    /// If the path cannot be resolved or the file cannot be read, the
    /// standard store is in-memory for the rest of the process.
    pub fn standard() -> &'static Self {
        STANDARD.get_or_init(|| {
            let opened = resolve_preferences_path()
                .map_err(Into::into)
                .and_then(|path| Self::open(path));
            match opened {
                Ok(store) => store,
                Err(err) => {
                    tracing::warn!("Falling back to in-memory preferences: {err}");
                    Self::in_memory()
                }
            }
        })
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Registers fallback values. Registered defaults are never persisted and
    /// never hide a value the user has set.
    pub fn register_defaults(&self, defaults: impl IntoIterator<Item = (PreferenceKey, bool)>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.defaults.extend(defaults);
    }

    /// The effective value for `key`, if it has an explicit value or a
    /// registered default.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<bool> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .values
            .get(key)
            .or_else(|| state.defaults.get(key))
            .copied()
    }

    /// The effective value for `key`, `false` when unknown.
    #[must_use]
    pub fn bool(&self, key: &str) -> bool {
        self.get(key).unwrap_or(false)
    }

    pub fn set_bool(&self, key: PreferenceKey, value: bool) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.values.insert(key, value);
    }

    /// Removes the explicit value for `key`, returning it. Registered defaults
    /// apply again afterwards.
    pub fn remove(&self, key: &str) -> Option<bool> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.values.remove(key)
    }

    /// Writes explicit values to the backing file.
    pub fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let file = {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            PreferencesFile {
                values: state.values.clone(),
            }
        };
        file.save(path)?;
        Ok(())
    }
}
