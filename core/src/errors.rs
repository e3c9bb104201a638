//! Error types for the dependency container.
//!
//! Obtaining the shared instance never fails; only the operations that touch
//! optional services or the filesystem can.

use thiserror::Error;

use appdeps_config::ConfigError;

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("no view loader is installed")]
    MissingViewLoader,
    #[error(transparent)]
    Preferences(#[from] ConfigError),
}

pub type Result<T, E = DependencyError> = std::result::Result<T, E>;
