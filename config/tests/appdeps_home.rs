//! `APPDEPS_HOME` relocates every appdeps file.
//!
//! Lives in its own test binary because it changes the process environment.

use std::fs;

use appdeps_config::{
    APPDEPS_HOME_ENV, config_dir, config_path, default_preferences_path,
    resolve_preferences_path,
};

#[test]
fn home_override_and_configured_preferences_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    unsafe {
        std::env::set_var(APPDEPS_HOME_ENV, dir.path());
    }

    assert_eq!(config_dir(), Some(dir.path().to_path_buf()));
    assert_eq!(config_path(), Some(dir.path().join("config.toml")));
    assert_eq!(
        default_preferences_path(),
        Some(dir.path().join("preferences.toml"))
    );

    // Without a config file the default location is used.
    assert_eq!(
        resolve_preferences_path().expect("resolve"),
        dir.path().join("preferences.toml")
    );

    fs::write(
        dir.path().join("config.toml"),
        "[preferences]\npath = \"${APPDEPS_HOME}/custom/prefs.toml\"\n",
    )
    .expect("write config");
    assert_eq!(
        resolve_preferences_path().expect("resolve"),
        dir.path().join("custom").join("prefs.toml")
    );

    // A broken config is ignored rather than failing resolution.
    fs::write(dir.path().join("config.toml"), "[preferences\n").expect("write config");
    assert_eq!(
        resolve_preferences_path().expect("resolve"),
        dir.path().join("preferences.toml")
    );

    unsafe {
        std::env::remove_var(APPDEPS_HOME_ENV);
    }
}
