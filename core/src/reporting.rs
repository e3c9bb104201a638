//! Reporters that write through `tracing`.
//!
//! These are the production defaults: whatever subscriber the application
//! installs decides where crash breadcrumbs and analytic events end up.

use std::collections::VecDeque;
use std::error::Error;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};

use serde_json::Value;

use appdeps_types::{AnalyticEvent, AnalyticSession};

use crate::services::{AnalyticsReporter, CrashReporter};

/// Breadcrumbs kept for the next crash report; older ones are dropped.
pub const MAX_BREADCRUMBS: usize = 64;

const ANALYTICS_TARGET: &str = "appdeps::analytics";

type Breadcrumbs = Arc<Mutex<VecDeque<String>>>;

/// Breadcrumbs of the most recently set up reporter. The panic hook reads
/// them through a weak reference so a replaced reporter can still be dropped.
static ACTIVE_BREADCRUMBS: Mutex<Weak<Mutex<VecDeque<String>>>> = Mutex::new(Weak::new());
static PANIC_HOOK: OnceLock<()> = OnceLock::new();

/// Crash reporter backed by a panic hook.
///
/// The first setup in the process installs a single panic hook that logs the
/// panic at error level, then defers to the previously installed hook. Each
/// setup makes that reporter the active one, so a panic reports only the
/// breadcrumbs of the reporter installed last.
#[derive(Debug, Default)]
pub struct TracingCrashReporter {
    breadcrumbs: Breadcrumbs,
}

impl TracingCrashReporter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest first.
    #[must_use]
    pub fn breadcrumbs(&self) -> Vec<String> {
        snapshot(&self.breadcrumbs)
    }

    /// Whether a panic right now would report this reporter's breadcrumbs.
    #[must_use]
    pub fn is_active(&self) -> bool {
        ACTIVE_BREADCRUMBS
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
            .is_some_and(|active| Arc::ptr_eq(&active, &self.breadcrumbs))
    }
}

fn snapshot(breadcrumbs: &Mutex<VecDeque<String>>) -> Vec<String> {
    breadcrumbs
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .cloned()
        .collect()
}

fn install_panic_hook() {
    PANIC_HOOK.get_or_init(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let active = ACTIVE_BREADCRUMBS
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .upgrade();
            if let Some(active) = active {
                let trail = snapshot(&active);
                tracing::error!(panic = %info, breadcrumbs = ?trail, "Crash reported");
            }
            previous(info);
        }));
    });
}

fn error_chain(error: &(dyn Error + 'static)) -> String {
    let mut chain = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}

impl CrashReporter for TracingCrashReporter {
    fn setup_crash_reporting(&self) {
        install_panic_hook();
        let mut active = ACTIVE_BREADCRUMBS
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *active = Arc::downgrade(&self.breadcrumbs);
        drop(active);
        tracing::info!("Crash reporting enabled");
    }

    fn simulate_crash(&self) {
        panic!("Simulated crash");
    }

    fn log_to_crash_report(&self, message: &str) {
        let mut breadcrumbs = self
            .breadcrumbs
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if breadcrumbs.len() == MAX_BREADCRUMBS {
            breadcrumbs.pop_front();
        }
        breadcrumbs.push_back(message.to_string());
    }

    fn log_non_fatal_error(&self, error: &(dyn Error + 'static)) {
        tracing::warn!(error = %error_chain(error), "Non-fatal error");
    }
}

/// Analytics reporter that emits each event as an info-level `tracing` event
/// under the `appdeps::analytics` target.
#[derive(Debug)]
pub struct TracingAnalyticsReporter {
    enabled: AtomicBool,
    session: Mutex<Option<AnalyticSession>>,
    sent: AtomicU64,
}

impl TracingAnalyticsReporter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            session: Mutex::new(None),
            sent: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn current_session(&self) -> Option<AnalyticSession> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events emitted since creation; dropped events are not counted.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl Default for TracingAnalyticsReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsReporter for TracingAnalyticsReporter {
    fn enable_analytics(&self, enable: bool) {
        self.enabled.store(enable, Ordering::Release);
        tracing::debug!(target: ANALYTICS_TARGET, enabled = enable, "Analytics toggled");
    }

    fn setup_analytics(&self) {
        tracing::debug!(target: ANALYTICS_TARGET, "Analytics ready");
    }

    fn send_analytic_in_session(&self, event: AnalyticEvent, session: Option<&AnalyticSession>) {
        if !self.is_enabled() {
            tracing::trace!(
                target: ANALYTICS_TARGET,
                event = %event,
                "Analytics disabled, event dropped"
            );
            return;
        }
        if let Some(session) = session {
            *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session.clone());
            let dimensions = session.to_value();
            tracing::info!(
                target: ANALYTICS_TARGET,
                device = session.device_name(),
                dimensions = %dimensions["custom_dimensions"],
                "New analytics session"
            );
        }
        let user_info = Value::Object(event.user_info().clone());
        tracing::info!(
            target: ANALYTICS_TARGET,
            category = event.category(),
            action = event.action(),
            label = event.label().unwrap_or_default(),
            user_info = %user_info,
            "Analytic event"
        );
        self.sent.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;
    use std::io::{self, Write};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        captured.contents()
    }

    #[derive(Debug)]
    struct Outer(io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("sync failed")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn breadcrumbs_are_bounded() {
        let reporter = TracingCrashReporter::new();
        for i in 0..(MAX_BREADCRUMBS + 5) {
            reporter.log_to_crash_report(&format!("step {i}"));
        }

        let crumbs = reporter.breadcrumbs();
        assert_eq!(crumbs.len(), MAX_BREADCRUMBS);
        assert_eq!(crumbs[0], "step 5");
        assert_eq!(crumbs[MAX_BREADCRUMBS - 1], format!("step {}", MAX_BREADCRUMBS + 4));
    }

    #[test]
    fn error_chain_includes_sources() {
        let err = Outer(io::Error::other("connection reset"));
        assert_eq!(error_chain(&err), "sync failed: connection reset");
    }

    #[test]
    fn non_fatal_error_is_logged_with_chain() {
        let reporter = TracingCrashReporter::new();
        let output = capture(|| {
            reporter.log_non_fatal_error(&Outer(io::Error::other("connection reset")));
        });
        assert!(output.contains("Non-fatal error"));
        assert!(output.contains("sync failed: connection reset"));
    }

    #[test]
    fn latest_setup_becomes_active() {
        let first = TracingCrashReporter::new();
        let second = TracingCrashReporter::new();
        assert!(!first.is_active());

        first.setup_crash_reporting();
        first.setup_crash_reporting();
        assert!(first.is_active());

        second.setup_crash_reporting();
        assert!(second.is_active());
        assert!(!first.is_active());

        drop(second);
        assert!(!first.is_active());
    }

    #[test]
    #[should_panic(expected = "Simulated crash")]
    fn simulate_crash_panics() {
        TracingCrashReporter::new().simulate_crash();
    }

    #[test]
    fn analytics_event_is_logged() {
        let reporter = TracingAnalyticsReporter::new();
        let mut event = AnalyticEvent::new("Checkout", "Pay", Some("card"));
        event.add_info("amount", 42);

        let output = capture(|| reporter.send_analytic(event));

        assert!(output.contains("Analytic event"));
        assert!(output.contains("category=\"Checkout\""));
        assert!(output.contains("label=\"card\""));
        assert!(output.contains(r#"user_info={"amount":42}"#));
        assert_eq!(reporter.sent_count(), 1);
    }

    #[test]
    fn disabled_reporter_drops_events() {
        let reporter = TracingAnalyticsReporter::new();
        reporter.enable_analytics(false);

        let output = capture(|| {
            reporter.send_analytic(AnalyticEvent::new("Checkout", "Pay", None::<String>));
        });

        assert!(!output.contains("Analytic event"));
        assert_eq!(reporter.sent_count(), 0);
    }

    #[test]
    fn new_session_is_remembered() {
        let reporter = TracingAnalyticsReporter::new();
        let session = AnalyticSession::new("Pixel 8").with_dimension(1, "gold");

        let output = capture(|| {
            reporter.send_analytic_in_session(
                AnalyticEvent::new("Account", "Login", None::<String>),
                Some(&session),
            );
        });

        assert!(output.contains("New analytics session"));
        assert_eq!(reporter.current_session(), Some(session));
    }
}
