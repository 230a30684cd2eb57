mod config;

pub use config::{
    Config, GoogleConfig, SchedulerConfig, TodoistConfig, MAX_EVENT_DURATION_MINUTES,
    MAX_INTERVAL_MINUTES, MAX_WINDOW_HOURS,
};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the config directory, creating it if needed.
///
/// `TODO5_CONFIG_DIR` wins if set. Otherwise `~/.config/todo5[-dev]/`,
/// with the `-dev` suffix selected by `TODO5_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TODO5_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TODO5_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("todo5-dev")
            } else {
                base_dir.join("todo5")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DirUnavailable(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
