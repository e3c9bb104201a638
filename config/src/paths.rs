use std::env;
use std::path::PathBuf;

/// Overrides the `~/.appdeps` directory when set to a non-empty value.
pub const APPDEPS_HOME_ENV: &str = "APPDEPS_HOME";

const DIR_NAME: &str = ".appdeps";
const CONFIG_FILE: &str = "config.toml";
const PREFERENCES_FILE: &str = "preferences.toml";

#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = env::var(APPDEPS_HOME_ENV)
        && !dir.trim().is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(DIR_NAME))
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE))
}

#[must_use]
pub fn default_preferences_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(PREFERENCES_FILE))
}

/// Replaces `${VAR}` with the value of `VAR`, or nothing if it is unset.
/// An unterminated `${` is copied through verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
