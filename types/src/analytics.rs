use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form extra information attached to an [`AnalyticEvent`].
pub type UserInfo = Map<String, Value>;

/// A single analytic event.
///
/// Events are plain values: mutating one (via [`add_info`](Self::add_info) or
/// [`set_user_info`](Self::set_user_info)) never affects a copy that has
/// already been handed to a reporter.
///
/// Two events are equal when their `category`, `action` and `label` match.
/// `user_info` does not take part in equality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticEvent {
    category: String,
    action: String,
    label: Option<String>,
    #[serde(default)]
    user_info: UserInfo,
}

impl AnalyticEvent {
    /// Applications are expected to wrap this in a constructor that takes
    /// their own category/action enums.
    pub fn new(
        category: impl Into<String>,
        action: impl Into<String>,
        label: Option<impl Into<String>>,
    ) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: label.map(Into::into),
            user_info: UserInfo::new(),
        }
    }

    #[must_use]
    pub fn with_user_info(mut self, info: UserInfo) -> Self {
        self.user_info = info;
        self
    }

    /// High level grouping used for filtering.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Mid level grouping within a category.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Identifies one specific event.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    #[must_use]
    pub fn user_info(&self) -> &UserInfo {
        &self.user_info
    }

    /// Inserts `value` under `key`, replacing any previous value.
    pub fn add_info(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.user_info.insert(key.into(), value.into());
    }

    /// Replaces the whole user info map.
    pub fn set_user_info(&mut self, info: UserInfo) {
        self.user_info = info;
    }
}

impl PartialEq for AnalyticEvent {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category && self.action == other.action && self.label == other.label
    }
}

impl Eq for AnalyticEvent {}

impl fmt::Display for AnalyticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<Analytic: {} - {} - {}, UserInfo: {}>",
            self.category,
            self.action,
            self.label.as_deref().unwrap_or("nil"),
            Value::Object(self.user_info.clone())
        )
    }
}

/// Session wide properties used to group analytic events.
///
/// A new session should be started whenever anything here changes, e.g. when
/// the user logs out or in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticSession {
    device_name: String,
    #[serde(default)]
    custom_dimensions: BTreeMap<u32, String>,
}

impl AnalyticSession {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            custom_dimensions: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_dimension(mut self, index: u32, value: impl Into<String>) -> Self {
        self.custom_dimensions.insert(index, value.into());
        self
    }

    /// Human readable device name, used for segmentation.
    #[must_use]
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    #[must_use]
    pub fn custom_dimensions(&self) -> &BTreeMap<u32, String> {
        &self.custom_dimensions
    }

    /// JSON form used when a session is attached to an event's user info.
    #[must_use]
    pub fn to_value(&self) -> Value {
        // Integer map keys serialize as strings, so this cannot fail.
        serde_json::to_value(self).unwrap_or_default()
    }
}
