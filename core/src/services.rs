//! Contracts for the services the container hands out.
//!
//! Every service is shared behind an `Arc` and may be called from any thread,
//! so the traits take `&self` and implementations keep their own state behind
//! locks.

use std::any::Any;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

use appdeps_types::{
    AnalyticEvent, AnalyticSession, DEFAULT_PREFERENCES, ENABLE_ANALYTICS_KEY,
    ENABLE_CRASH_REPORTING_KEY,
};

use crate::preference_store::PreferenceStore;

/// Crash reporting: setup, breadcrumbs and non-fatal errors.
pub trait CrashReporter: Send + Sync {
    /// Starts crash reporting. Called when the reporter is installed into an
    /// [`AppDependencies`](crate::AppDependencies).
    fn setup_crash_reporting(&self);

    /// Deliberately crashes so the reporting pipeline can be verified.
    fn simulate_crash(&self);

    /// Appends `message` to any upcoming crash report.
    fn log_to_crash_report(&self, message: &str);

    /// Reports an error that did not crash the process.
    fn log_non_fatal_error(&self, error: &(dyn Error + 'static));
}

/// Sends analytic events.
pub trait AnalyticsReporter: Send + Sync {
    /// Enables or disables sending of further events.
    fn enable_analytics(&self, enable: bool);

    /// Applies default properties such as tracking ids. Called when the
    /// reporter is installed, before any event is sent.
    fn setup_analytics(&self);

    /// Records `event`. A `Some` session closes the previous session and
    /// starts a new one with the given configuration.
    fn send_analytic_in_session(&self, event: AnalyticEvent, session: Option<&AnalyticSession>);

    /// Records `event` in the current session.
    fn send_analytic(&self, event: AnalyticEvent) {
        self.send_analytic_in_session(event, None);
    }
}

/// The user's permission to send crash reports and analytics.
///
/// Every method has a default backed by [`preference_store`](Self::preference_store),
/// which in turn defaults to [`PreferenceStore::standard`].
pub trait PreferencesInteractor: Send + Sync {
    fn preference_store(&self) -> &PreferenceStore {
        PreferenceStore::standard()
    }

    /// Registers both permissions as granted unless the user has chosen
    /// otherwise.
    fn set_default_preferences(&self) {
        self.preference_store().register_defaults(DEFAULT_PREFERENCES);
    }

    fn can_send_crash_reports(&self) -> bool {
        self.preference_store().bool(ENABLE_CRASH_REPORTING_KEY.as_str())
    }

    fn can_send_analytics(&self) -> bool {
        self.preference_store().bool(ENABLE_ANALYTICS_KEY.as_str())
    }
}

/// Preferences read from the process-wide standard store.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPreferences;

impl PreferencesInteractor for StandardPreferences {}

/// Preferences read from a specific store.
#[derive(Debug, Clone)]
pub struct StorePreferences {
    store: Arc<PreferenceStore>,
}

impl StorePreferences {
    #[must_use]
    pub fn new(store: Arc<PreferenceStore>) -> Self {
        Self { store }
    }
}

impl PreferencesInteractor for StorePreferences {
    fn preference_store(&self) -> &PreferenceStore {
        &self.store
    }
}

/// The application's root view, opaque to the container.
pub struct RootView(Box<dyn Any + Send>);

impl RootView {
    pub fn new<V: Any + Send>(view: V) -> Self {
        Self(Box::new(view))
    }

    #[must_use]
    pub fn is<V: Any>(&self) -> bool {
        self.0.is::<V>()
    }

    /// Recovers the concrete view, or gives the `RootView` back if it holds
    /// something else.
    pub fn downcast<V: Any>(self) -> Result<V, Self> {
        match self.0.downcast::<V>() {
            Ok(view) => Ok(*view),
            Err(other) => Err(Self(other)),
        }
    }
}

impl fmt::Debug for RootView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootView(..)")
    }
}

/// Creates and configures the views used for navigation.
pub trait ViewLoader: Send + Sync {
    fn configured_root_view(&self) -> RootView;
}

/// Whatever displays the root view, such as a window.
pub trait RootViewHost {
    fn set_root_view(&mut self, view: RootView);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_view_downcasts_to_original_type() {
        let view = RootView::new(String::from("home"));
        assert!(view.is::<String>());
        assert_eq!(view.downcast::<String>().unwrap(), "home");
    }

    #[test]
    fn root_view_downcast_mismatch_returns_view() {
        let view = RootView::new(7_u32);
        let back = view.downcast::<String>().unwrap_err();
        assert!(back.is::<u32>());
    }

    #[test]
    fn store_preferences_use_defaults_until_overridden() {
        let store = Arc::new(PreferenceStore::in_memory());
        let prefs = StorePreferences::new(Arc::clone(&store));
        assert!(!prefs.can_send_analytics());

        prefs.set_default_preferences();
        assert!(prefs.can_send_analytics());
        assert!(prefs.can_send_crash_reports());

        store.set_bool(ENABLE_ANALYTICS_KEY, false);
        assert!(!prefs.can_send_analytics());
        assert!(prefs.can_send_crash_reports());
    }
}
