//! The base dependency container.

use std::error::Error;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use appdeps_types::{AnalyticEvent, AnalyticSession};

use crate::errors::{DependencyError, Result};
use crate::preference_store::PreferenceStore;
use crate::services::{
    AnalyticsReporter, CrashReporter, PreferencesInteractor, RootViewHost, StandardPreferences,
    ViewLoader,
};
use crate::shared::Dependencies;

type Slot<T> = RwLock<Option<Arc<T>>>;

fn load<T: ?Sized>(slot: &Slot<T>) -> Option<Arc<T>> {
    slot.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn store<T: ?Sized>(slot: &Slot<T>, value: Option<Arc<T>>) {
    *slot.write().unwrap_or_else(PoisonError::into_inner) = value;
}

/// Application-wide services, each optional and replaceable at runtime.
///
/// Installing a service runs its setup hook; installing `None` just clears
/// the slot. Hooks run after the slot lock is released, so a hook may read
/// the container.
pub struct AppDependencies {
    crash_reporter: Slot<dyn CrashReporter>,
    analytics_reporter: Slot<dyn AnalyticsReporter>,
    preferences_interactor: Slot<dyn PreferencesInteractor>,
    view_loader: Slot<dyn ViewLoader>,
}

impl AppDependencies {
    /// A container whose preferences come from [`PreferenceStore::standard`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_preferences(Arc::new(StandardPreferences))
    }

    /// A container using `preferences`, whose defaults are registered
    /// immediately.
    #[must_use]
    pub fn with_preferences(preferences: Arc<dyn PreferencesInteractor>) -> Self {
        let deps = Self {
            crash_reporter: RwLock::new(None),
            analytics_reporter: RwLock::new(None),
            preferences_interactor: RwLock::new(None),
            view_loader: RwLock::new(None),
        };
        deps.set_preferences_interactor(Some(preferences));
        deps
    }

    #[must_use]
    pub fn crash_reporter(&self) -> Option<Arc<dyn CrashReporter>> {
        load(&self.crash_reporter)
    }

    /// Installs `reporter` and calls its `setup_crash_reporting`.
    pub fn set_crash_reporter(&self, reporter: Option<Arc<dyn CrashReporter>>) {
        store(&self.crash_reporter, reporter.clone());
        if let Some(reporter) = reporter {
            tracing::debug!("Installed crash reporter");
            reporter.setup_crash_reporting();
        }
    }

    #[must_use]
    pub fn analytics_reporter(&self) -> Option<Arc<dyn AnalyticsReporter>> {
        load(&self.analytics_reporter)
    }

    /// Installs `reporter` and calls its `setup_analytics`.
    pub fn set_analytics_reporter(&self, reporter: Option<Arc<dyn AnalyticsReporter>>) {
        store(&self.analytics_reporter, reporter.clone());
        if let Some(reporter) = reporter {
            tracing::debug!("Installed analytics reporter");
            reporter.setup_analytics();
        }
    }

    #[must_use]
    pub fn preferences_interactor(&self) -> Option<Arc<dyn PreferencesInteractor>> {
        load(&self.preferences_interactor)
    }

    /// Installs `interactor` and calls its `set_default_preferences`.
    pub fn set_preferences_interactor(&self, interactor: Option<Arc<dyn PreferencesInteractor>>) {
        store(&self.preferences_interactor, interactor.clone());
        if let Some(interactor) = interactor {
            tracing::debug!("Installed preferences interactor");
            interactor.set_default_preferences();
        }
    }

    #[must_use]
    pub fn view_loader(&self) -> Option<Arc<dyn ViewLoader>> {
        load(&self.view_loader)
    }

    pub fn set_view_loader(&self, loader: Option<Arc<dyn ViewLoader>>) {
        store(&self.view_loader, loader);
    }

    /// Builds the root view from the view loader and hands it to `host`.
    /// Typically called once, when the application window is ready.
    pub fn install_root_view(&self, host: &mut dyn RootViewHost) -> Result<()> {
        let loader = self
            .view_loader()
            .ok_or(DependencyError::MissingViewLoader)?;
        host.set_root_view(loader.configured_root_view());
        tracing::debug!("Installed root view");
        Ok(())
    }

    /// Appends a breadcrumb to the crash report if a reporter is installed and
    /// the user allows crash reporting. Returns whether it was forwarded.
    pub fn log_to_crash_report(&self, message: &str) -> bool {
        match self.permitted_crash_reporter() {
            Some(reporter) => {
                reporter.log_to_crash_report(message);
                true
            }
            None => false,
        }
    }

    /// Reports a non-fatal error, gated like [`log_to_crash_report`](Self::log_to_crash_report).
    pub fn report_non_fatal(&self, error: &(dyn Error + 'static)) -> bool {
        match self.permitted_crash_reporter() {
            Some(reporter) => {
                reporter.log_non_fatal_error(error);
                true
            }
            None => false,
        }
    }

    /// Sends `event` if a reporter is installed and the user allows analytics.
    /// Returns whether it was forwarded.
    pub fn track(&self, event: AnalyticEvent) -> bool {
        self.dispatch_analytic(event, None)
    }

    /// Sends `event` as the first event of a new `session`, gated like
    /// [`track`](Self::track).
    pub fn track_in_session(&self, event: AnalyticEvent, session: &AnalyticSession) -> bool {
        self.dispatch_analytic(event, Some(session))
    }

    /// Pushes the user's current analytics permission to the installed
    /// reporter.
    pub fn sync_analytics_preference(&self) {
        if let Some(reporter) = self.analytics_reporter() {
            reporter.enable_analytics(self.can_send_analytics());
        }
    }

    fn permitted_crash_reporter(&self) -> Option<Arc<dyn CrashReporter>> {
        let reporter = self.crash_reporter()?;
        if self.can_send_crash_reports() {
            Some(reporter)
        } else {
            tracing::debug!("Crash reporting disabled by user preference");
            None
        }
    }

    fn dispatch_analytic(&self, event: AnalyticEvent, session: Option<&AnalyticSession>) -> bool {
        let Some(reporter) = self.analytics_reporter() else {
            return false;
        };
        if !self.can_send_analytics() {
            tracing::debug!(event = %event, "Analytics disabled by user preference");
            return false;
        }
        reporter.send_analytic_in_session(event, session);
        true
    }
}

impl Default for AppDependencies {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppDependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppDependencies")
            .field("crash_reporter", &self.crash_reporter().is_some())
            .field("analytics_reporter", &self.analytics_reporter().is_some())
            .field(
                "preferences_interactor",
                &self.preferences_interactor().is_some(),
            )
            .field("view_loader", &self.view_loader().is_some())
            .finish()
    }
}

impl Dependencies for AppDependencies {
    fn create() -> Self {
        Self::new()
    }

    fn app_dependencies(&self) -> &AppDependencies {
        self
    }
}

/// The container answers preference queries through its installed
/// interactor, or the standard store when none is installed.
impl PreferencesInteractor for AppDependencies {
    fn preference_store(&self) -> &PreferenceStore {
        PreferenceStore::standard()
    }

    fn set_default_preferences(&self) {
        match self.preferences_interactor() {
            Some(interactor) => interactor.set_default_preferences(),
            None => StandardPreferences.set_default_preferences(),
        }
    }

    fn can_send_crash_reports(&self) -> bool {
        match self.preferences_interactor() {
            Some(interactor) => interactor.can_send_crash_reports(),
            None => StandardPreferences.can_send_crash_reports(),
        }
    }

    fn can_send_analytics(&self) -> bool {
        match self.preferences_interactor() {
            Some(interactor) => interactor.can_send_analytics(),
            None => StandardPreferences.can_send_analytics(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use appdeps_types::ENABLE_ANALYTICS_KEY;

    use super::*;
    use crate::services::{RootView, StorePreferences};
    use crate::testing::{TestAnalyticsReporter, TestCrashReporter, TestPreferences};

    fn test_container() -> AppDependencies {
        AppDependencies::with_preferences(Arc::new(TestPreferences::new()))
    }

    fn store_container() -> (AppDependencies, Arc<PreferenceStore>) {
        let store = Arc::new(PreferenceStore::in_memory());
        let deps =
            AppDependencies::with_preferences(Arc::new(StorePreferences::new(Arc::clone(&store))));
        (deps, store)
    }

    #[derive(Default)]
    struct Window {
        root: Option<RootView>,
    }

    impl RootViewHost for Window {
        fn set_root_view(&mut self, view: RootView) {
            self.root = Some(view);
        }
    }

    struct HomeLoader;

    impl ViewLoader for HomeLoader {
        fn configured_root_view(&self) -> RootView {
            RootView::new("home")
        }
    }

    #[test]
    fn installing_crash_reporter_runs_setup() {
        let deps = test_container();
        let reporter = Arc::new(TestCrashReporter::new());
        reporter.log_to_crash_report("stale");

        deps.set_crash_reporter(Some(reporter.clone()));

        assert!(reporter.messages().is_empty());
        assert!(deps.crash_reporter().is_some());
    }

    #[test]
    fn installing_analytics_reporter_runs_setup() {
        let deps = test_container();
        let reporter = Arc::new(TestAnalyticsReporter::new());
        reporter.send_analytic(AnalyticEvent::new("Stale", "Event", None::<String>));

        deps.set_analytics_reporter(Some(reporter.clone()));

        assert!(reporter.tracked_events().is_empty());
    }

    #[test]
    fn clearing_a_slot_removes_the_service() {
        let deps = test_container();
        deps.set_crash_reporter(Some(Arc::new(TestCrashReporter::new())));
        deps.set_crash_reporter(None);
        assert!(deps.crash_reporter().is_none());
        assert!(!deps.log_to_crash_report("ignored"));
    }

    #[test]
    fn installing_preferences_registers_defaults() {
        let (deps, store) = store_container();
        assert!(store.bool("EnableAnalytics"));
        assert!(store.bool("EnableCrashReporting"));
        assert!(deps.can_send_analytics());
    }

    #[test]
    fn crash_report_forwarded_when_allowed() {
        let deps = test_container();
        let reporter = Arc::new(TestCrashReporter::new());
        deps.set_crash_reporter(Some(reporter.clone()));

        assert!(deps.log_to_crash_report("opened settings"));
        let err = io::Error::other("disk full");
        assert!(deps.report_non_fatal(&err));

        assert_eq!(reporter.messages(), vec!["opened settings".to_string()]);
        assert_eq!(reporter.non_fatals(), vec!["disk full".to_string()]);
    }

    #[test]
    fn crash_report_suppressed_when_user_opts_out() {
        let (deps, store) = store_container();
        let reporter = Arc::new(TestCrashReporter::new());
        deps.set_crash_reporter(Some(reporter.clone()));
        store.set_bool(appdeps_types::ENABLE_CRASH_REPORTING_KEY, false);

        assert!(!deps.log_to_crash_report("opened settings"));
        assert!(!deps.report_non_fatal(&io::Error::other("disk full")));
        assert!(reporter.messages().is_empty());
        assert!(reporter.non_fatals().is_empty());
    }

    #[test]
    fn analytics_forwarded_when_allowed() {
        let deps = test_container();
        let reporter = Arc::new(TestAnalyticsReporter::new());
        deps.set_analytics_reporter(Some(reporter.clone()));

        let event = AnalyticEvent::new("Login", "Success", None::<String>);
        assert!(deps.track(event.clone()));
        assert_eq!(reporter.tracked_events(), vec![event]);
    }

    #[test]
    fn analytics_suppressed_when_user_opts_out() {
        let (deps, store) = store_container();
        let reporter = Arc::new(TestAnalyticsReporter::new());
        deps.set_analytics_reporter(Some(reporter.clone()));
        store.set_bool(ENABLE_ANALYTICS_KEY, false);

        assert!(!deps.track(AnalyticEvent::new("Login", "Success", None::<String>)));
        assert!(reporter.tracked_events().is_empty());
    }

    #[test]
    fn track_without_reporter_is_not_forwarded() {
        let deps = test_container();
        assert!(!deps.track(AnalyticEvent::new("Login", "Success", None::<String>)));
    }

    #[test]
    fn track_in_session_starts_new_session() {
        let deps = test_container();
        let reporter = Arc::new(TestAnalyticsReporter::new());
        deps.set_analytics_reporter(Some(reporter.clone()));
        deps.track(AnalyticEvent::new("Browse", "Open", None::<String>));

        let session = AnalyticSession::new("Pixel 8");
        let login = AnalyticEvent::new("Login", "Success", None::<String>);
        assert!(deps.track_in_session(login, &session));

        let events = reporter.tracked_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_info()["session"], session.to_value());
    }

    #[test]
    fn sync_analytics_preference_disables_reporter() {
        let (deps, store) = store_container();
        let reporter = Arc::new(crate::reporting::TracingAnalyticsReporter::new());
        deps.set_analytics_reporter(Some(reporter.clone()));
        store.set_bool(ENABLE_ANALYTICS_KEY, false);

        deps.sync_analytics_preference();

        assert!(!reporter.is_enabled());
    }

    #[test]
    fn install_root_view_requires_loader() {
        let deps = test_container();
        let mut window = Window::default();

        let err = deps.install_root_view(&mut window).unwrap_err();
        assert!(matches!(err, DependencyError::MissingViewLoader));
        assert!(window.root.is_none());
    }

    #[test]
    fn install_root_view_uses_loader() {
        let deps = test_container();
        deps.set_view_loader(Some(Arc::new(HomeLoader)));
        let mut window = Window::default();

        deps.install_root_view(&mut window).unwrap();

        let root = window.root.take().expect("root view");
        assert_eq!(root.downcast::<&str>().unwrap(), "home");
    }

    #[test]
    fn debug_lists_installed_services() {
        let deps = test_container();
        let rendered = format!("{deps:?}");
        assert!(rendered.contains("preferences_interactor: true"));
        assert!(rendered.contains("crash_reporter: false"));
    }
}
