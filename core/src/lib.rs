//! Process-wide shared dependencies.
//!
//! The entry point is [`Dependencies::shared_dependencies`]: the first type it
//! is called through decides the concrete type of the one shared instance,
//! and every later call, through any type, returns that same instance.
//!
//! ```
//! use std::sync::Arc;
//!
//! use appdeps_core::testing::TestPreferences;
//! use appdeps_core::{AppDependencies, Dependencies};
//!
//! struct MyAppDependencies {
//!     base: AppDependencies,
//!     api_url: String,
//! }
//!
//! impl Dependencies for MyAppDependencies {
//!     fn create() -> Self {
//!         Self {
//!             base: AppDependencies::with_preferences(Arc::new(TestPreferences::new())),
//!             api_url: "https://api.example.com".to_string(),
//!         }
//!     }
//!
//!     fn app_dependencies(&self) -> &AppDependencies {
//!         &self.base
//!     }
//! }
//!
//! let shared = MyAppDependencies::shared_dependencies();
//! assert!(shared.is::<MyAppDependencies>());
//! assert_eq!(
//!     MyAppDependencies::shared().unwrap().api_url,
//!     "https://api.example.com"
//! );
//!
//! // Asking through the base type still yields the same instance.
//! assert!(AppDependencies::shared_dependencies().ptr_eq(&shared));
//! ```

mod container;
pub mod errors;
mod preference_store;
pub mod reporting;
mod services;
mod shared;
pub mod testing;

pub use container::AppDependencies;
pub use errors::{DependencyError, Result};
pub use preference_store::PreferenceStore;
pub use services::{
    AnalyticsReporter, CrashReporter, PreferencesInteractor, RootView, RootViewHost,
    StandardPreferences, StorePreferences, ViewLoader,
};
pub use shared::{Dependencies, SharedDependencies, SharedSlot, current_shared_dependencies};

pub use appdeps_types::{
    AnalyticEvent, AnalyticSession, ENABLE_ANALYTICS_KEY, ENABLE_CRASH_REPORTING_KEY,
    PreferenceKey, UserInfo,
};
