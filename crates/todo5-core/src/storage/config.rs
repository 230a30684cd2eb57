//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Run cadence, event length, and the calendar fetch window
//! - The usability policy applied to free periods
//! - Todoist and Google Calendar endpoints
//!
//! Configuration is stored at `~/.config/todo5/config.toml`. Secrets are
//! kept in the OS keyring, never in this file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::ConfigError;
use crate::timeline::UsabilityPolicy;

/// Upper bound for `gap_horizon_hours` and `fetch_window_hours`.
pub const MAX_WINDOW_HOURS: i64 = 366 * 24;
/// Upper bound for `event_duration_minutes`.
pub const MAX_EVENT_DURATION_MINUTES: i64 = 24 * 60;
/// Upper bound for `interval_minutes`.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Run cadence and placement sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes between periodic runs
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    /// Length of each created event
    #[serde(default = "default_event_duration_minutes")]
    pub event_duration_minutes: i64,
    /// How far ahead calendar events are fetched
    #[serde(default = "default_fetch_window_hours")]
    pub fetch_window_hours: i64,
    /// How far ahead free periods are computed
    #[serde(default = "default_gap_horizon_hours")]
    pub gap_horizon_hours: i64,
}

/// Todoist task source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoistConfig {
    #[serde(default = "default_todoist_filter")]
    pub filter: String,
    #[serde(default = "default_todoist_base_url")]
    pub base_url: String,
}

/// Google Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleConfig {
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    #[serde(default = "default_google_base_url")]
    pub base_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/todo5/config.toml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub usability: UsabilityPolicy,
    #[serde(default)]
    pub todoist: TodoistConfig,
    #[serde(default)]
    pub google: GoogleConfig,
}

// Default functions
fn default_interval_minutes() -> u64 {
    60
}
fn default_event_duration_minutes() -> i64 {
    30
}
fn default_fetch_window_hours() -> i64 {
    48
}
fn default_gap_horizon_hours() -> i64 {
    24
}
fn default_todoist_filter() -> String {
    "today|overdue".into()
}
fn default_todoist_base_url() -> String {
    "https://api.todoist.com".into()
}
fn default_calendar_id() -> String {
    "primary".into()
}
fn default_google_base_url() -> String {
    "https://www.googleapis.com".into()
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            event_duration_minutes: default_event_duration_minutes(),
            fetch_window_hours: default_fetch_window_hours(),
            gap_horizon_hours: default_gap_horizon_hours(),
        }
    }
}

impl Default for TodoistConfig {
    fn default() -> Self {
        Self {
            filter: default_todoist_filter(),
            base_url: default_todoist_base_url(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            calendar_id: default_calendar_id(),
            base_url: default_google_base_url(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let (parent_path, leaf) = match key.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, key),
        };
        if leaf.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        if let Some(parent_path) = parent_path {
            for part in parent_path.split('.') {
                current = current.get_mut(part).ok_or_else(unknown)?;
            }
        }

        let obj = current.as_object_mut().ok_or_else(unknown)?;
        let existing = obj.get(leaf).ok_or_else(unknown)?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value
                    .parse::<bool>()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => {
                if let Ok(n) = value.parse::<i64>() {
                    serde_json::Value::Number(n.into())
                } else {
                    return Err(invalid(format!("cannot parse '{value}' as integer")));
                }
            }
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            _ => serde_json::Value::String(value.into()),
        };

        obj.insert(leaf.to_string(), new_value);
        Ok(())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by dot-separated key without saving.
    ///
    /// The value is parsed according to the type of the existing value, and
    /// the whole config is revalidated before it replaces `self`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config =
            serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check cross-field constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        let scheduler = &self.scheduler;
        if !(1..=MAX_INTERVAL_MINUTES).contains(&scheduler.interval_minutes) {
            return Err(invalid(
                "scheduler.interval_minutes",
                &format!("must be between 1 and {MAX_INTERVAL_MINUTES}"),
            ));
        }
        if !(1..=MAX_EVENT_DURATION_MINUTES).contains(&scheduler.event_duration_minutes) {
            return Err(invalid(
                "scheduler.event_duration_minutes",
                &format!("must be between 1 and {MAX_EVENT_DURATION_MINUTES}"),
            ));
        }
        for (key, hours) in [
            ("scheduler.fetch_window_hours", scheduler.fetch_window_hours),
            ("scheduler.gap_horizon_hours", scheduler.gap_horizon_hours),
        ] {
            if !(1..=MAX_WINDOW_HOURS).contains(&hours) {
                return Err(invalid(key, &format!("must be between 1 and {MAX_WINDOW_HOURS}")));
            }
        }
        self.usability
            .validate()
            .map_err(|e| invalid("usability", &e.to_string()))
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default configuration");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_default_values() {
        let cfg = Config::default();
        assert_eq!(cfg.scheduler.interval_minutes, 60);
        assert_eq!(cfg.scheduler.event_duration_minutes, 30);
        assert_eq!(cfg.scheduler.fetch_window_hours, 48);
        assert_eq!(cfg.scheduler.gap_horizon_hours, 24);
        assert_eq!(cfg.usability.min_duration_minutes, 30);
        assert_eq!(cfg.usability.earliest_hour, 9);
        assert_eq!(cfg.usability.latest_hour, 14);
        assert_eq!(cfg.usability.weekdays.len(), 5);
        assert_eq!(cfg.todoist.filter, "today|overdue");
        assert_eq!(cfg.google.calendar_id, "primary");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [usability]
            latest_hour = 16
            "#,
        )
        .unwrap();
        assert_eq!(cfg.usability.latest_hour, 16);
        assert_eq!(cfg.usability.earliest_hour, 9);
        assert_eq!(cfg.scheduler.interval_minutes, 60);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("scheduler.interval_minutes").as_deref(), Some("60"));
        assert_eq!(cfg.get("google.calendar_id").as_deref(), Some("primary"));
        assert!(cfg.get("scheduler.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("usability.earliest_hour", "8").unwrap();
        assert_eq!(cfg.usability.earliest_hour, 8);
    }

    #[test]
    fn set_updates_nested_string() {
        let mut cfg = Config::default();
        cfg.set("todoist.filter", "today").unwrap();
        assert_eq!(cfg.todoist.filter, "today");
    }

    #[test]
    fn set_updates_weekday_list() {
        let mut cfg = Config::default();
        cfg.set("usability.weekdays", r#"["Mon","Wed"]"#).unwrap();
        assert_eq!(cfg.usability.weekdays, vec![Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("usability.nonexistent_key", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("nope.deeper.still", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("scheduler.interval_minutes", "hourly").is_err());
        assert_eq!(cfg.scheduler.interval_minutes, 60);
    }

    #[test]
    fn set_rejects_inverted_hours() {
        let mut cfg = Config::default();
        assert!(cfg.set("usability.earliest_hour", "20").is_err());
        assert_eq!(cfg.usability.earliest_hour, 9);
    }

    #[test]
    fn set_rejects_zero_interval() {
        let mut cfg = Config::default();
        assert!(cfg.set("scheduler.interval_minutes", "0").is_err());
    }

    #[test]
    fn set_rejects_huge_horizon() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("scheduler.gap_horizon_hours", "10000000000000"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("scheduler.fetch_window_hours", "10000000000000").is_err());
        assert_eq!(cfg, Config::default());

        let max = MAX_WINDOW_HOURS.to_string();
        cfg.set("scheduler.gap_horizon_hours", &max).unwrap();
        cfg.set("scheduler.fetch_window_hours", &max).unwrap();
        let _runner = crate::runner::Runner::from_config(&cfg);
        let periods = crate::timeline::GapCalculator::new()
            .with_horizon(chrono::Duration::hours(cfg.scheduler.gap_horizon_hours))
            .find_free_periods(&[], chrono::Utc::now());
        assert_eq!(periods.len(), 1);
    }

    #[test]
    fn set_rejects_oversized_event_and_interval() {
        let mut cfg = Config::default();
        assert!(cfg.set("scheduler.event_duration_minutes", "1441").is_err());
        assert!(cfg.set("scheduler.event_duration_minutes", "9223372036854775807").is_err());
        assert!(cfg.set("scheduler.interval_minutes", "9223372036854775807").is_err());
        cfg.set("scheduler.event_duration_minutes", "1440").unwrap();
        assert_eq!(cfg.scheduler.event_duration_minutes, 1440);
    }

    #[test]
    fn load_from_rejects_out_of_range_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[scheduler]\nfetch_window_hours = 99999999999\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut cfg = Config::default();
        cfg.set("scheduler.event_duration_minutes", "45").unwrap();
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.scheduler.event_duration_minutes, 45);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "scheduler = 12").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
