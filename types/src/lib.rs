//! Core domain types for appdeps.
//!
//! This crate contains pure value types with no IO and minimal dependencies.
//! Everything here can be used from any layer of the application.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod analytics;
mod preferences;

pub use analytics::{AnalyticEvent, AnalyticSession, UserInfo};
pub use preferences::{
    DEFAULT_PREFERENCES, ENABLE_ANALYTICS_KEY, ENABLE_CRASH_REPORTING_KEY, EmptyKeyError,
    PreferenceKey,
};
