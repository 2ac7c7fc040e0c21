use std::{env, path::PathBuf};

use dirs::home_dir;

pub const HOME_ENV: &str = "MILETRACK_HOME";
const DEFAULT_DIR_NAME: &str = ".miletrack";

/// Directory holding the CLI configuration, defaulting to `~/.miletrack`.
pub fn app_config_dir() -> PathBuf {
    if let Some(custom) = home_override() {
        return custom;
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// `MILETRACK_HOME`, when set to a non-empty value.
pub fn home_override() -> Option<PathBuf> {
    env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
