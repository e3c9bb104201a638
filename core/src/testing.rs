//! In-memory services for tests.
//!
//! Each double records what it is asked to do so tests can assert on it
//! without touching the filesystem or a real reporting backend.

use std::error::Error;
use std::sync::{Mutex, PoisonError};

use appdeps_types::{AnalyticEvent, AnalyticSession};

use crate::services::{AnalyticsReporter, CrashReporter, PreferencesInteractor};

/// Records crash report messages and non-fatal errors.
#[derive(Debug, Default)]
pub struct TestCrashReporter {
    messages: Mutex<Vec<String>>,
    non_fatals: Mutex<Vec<String>>,
}

impl TestCrashReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Non-fatal errors, rendered with `Display`.
    #[must_use]
    pub fn non_fatals(&self) -> Vec<String> {
        self.non_fatals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CrashReporter for TestCrashReporter {
    /// Clears recorded messages, so installing the reporter in a test's setup
    /// gives a clean slate.
    fn setup_crash_reporting(&self) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn simulate_crash(&self) {
        panic!("Simulated Crash!");
    }

    fn log_to_crash_report(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn log_non_fatal_error(&self, error: &(dyn Error + 'static)) {
        self.non_fatals
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(error.to_string());
    }
}

/// Records sent analytic events.
#[derive(Debug, Default)]
pub struct TestAnalyticsReporter {
    tracked_events: Mutex<Vec<AnalyticEvent>>,
}

impl TestAnalyticsReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tracked_events(&self) -> Vec<AnalyticEvent> {
        self.tracked_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AnalyticsReporter for TestAnalyticsReporter {
    fn enable_analytics(&self, _enable: bool) {}

    fn setup_analytics(&self) {
        self.tracked_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// A new session clears previously tracked events and is attached to the
    /// event under the `session` key.
    fn send_analytic_in_session(&self, event: AnalyticEvent, session: Option<&AnalyticSession>) {
        let mut event = event;
        let mut tracked = self
            .tracked_events
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = session {
            event.add_info("session", session.to_value());
            tracked.clear();
        }
        tracked.push(event);
    }
}

/// Grants every permission without consulting any store.
#[derive(Debug, Clone, Copy, Default)]
pub struct TestPreferences;

impl TestPreferences {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl PreferencesInteractor for TestPreferences {
    fn set_default_preferences(&self) {}

    fn can_send_crash_reports(&self) -> bool {
        true
    }

    fn can_send_analytics(&self) -> bool {
        true
    }
}
