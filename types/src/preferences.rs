use std::borrow::{Borrow, Cow};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of a stored user preference.
///
/// Invariant: never empty or made only of ASCII whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PreferenceKey(Cow<'static, str>);

#[derive(Debug, Error)]
#[error("preference key must not be empty")]
pub struct EmptyKeyError;

impl PreferenceKey {
    /// Compile-time key. Panics (during const evaluation for constants) if
    /// `key` is blank.
    #[must_use]
    pub const fn from_static(key: &'static str) -> Self {
        assert!(!is_blank(key), "preference key must not be empty");
        Self(Cow::Borrowed(key))
    }

    pub fn new(key: impl Into<String>) -> Result<Self, EmptyKeyError> {
        let key = key.into();
        if is_blank(&key) {
            Err(EmptyKeyError)
        } else {
            Ok(Self(Cow::Owned(key)))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

const fn is_blank(key: &str) -> bool {
    key.trim_ascii().is_empty()
}

impl TryFrom<String> for PreferenceKey {
    type Error = EmptyKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PreferenceKey> for String {
    fn from(value: PreferenceKey) -> Self {
        value.0.into_owned()
    }
}

impl Borrow<str> for PreferenceKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// User's permission to send crash reports.
pub const ENABLE_CRASH_REPORTING_KEY: PreferenceKey =
    PreferenceKey::from_static("EnableCrashReporting");

/// User's permission to send analytics.
pub const ENABLE_ANALYTICS_KEY: PreferenceKey = PreferenceKey::from_static("EnableAnalytics");

/// Defaults registered at startup: everything enabled until the user opts out.
pub const DEFAULT_PREFERENCES: [(PreferenceKey, bool); 2] = [
    (ENABLE_CRASH_REPORTING_KEY, true),
    (ENABLE_ANALYTICS_KEY, true),
];
