//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Nominal work/break phase durations for the focus timer
//! - Notification preferences
//!
//! Configuration is stored at `~/.config/taskflow/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};

use super::data_dir;

/// Focus timer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Nominal work phase length in minutes.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    /// Nominal break phase length in minutes.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: u32,
}

/// Notification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/taskflow/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_work_minutes() -> u32 {
    25
}
fn default_break_minutes() -> u32 {
    5
}
fn default_true() -> bool {
    true
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Path of the config file on disk.
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk, writing the defaults on first run.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from disk, falling back to defaults on any problem.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    pub(crate) fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config =
                    toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    })?;
                // A hand-edited file goes through the same range checks
                // as `set`.
                for key in ["timer.work_minutes", "timer.break_minutes"] {
                    if let Some(value) = cfg.get(key) {
                        parse_minutes(key, &value)?;
                    }
                }
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    pub(crate) fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        std::fs::write(path, content).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "timer.work_minutes" => Some(self.timer.work_minutes.to_string()),
            "timer.break_minutes" => Some(self.timer.break_minutes.to_string()),
            "notifications.enabled" => Some(self.notifications.enabled.to_string()),
            _ => None,
        }
    }

    /// Set a config value by dot-separated key.
    ///
    /// # Errors
    /// Returns an error for unknown keys, unparsable values, or phase
    /// durations outside 1..=1440 minutes.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "timer.work_minutes" => {
                self.timer.work_minutes = parse_minutes(key, value)?;
            }
            "timer.break_minutes" => {
                self.timer.break_minutes = parse_minutes(key, value)?;
            }
            "notifications.enabled" => {
                self.notifications.enabled =
                    value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("cannot parse '{value}' as bool"),
                    })?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string()).into()),
        }
        Ok(())
    }
}

/// Longest configurable phase duration: one day. Keeps the session's
/// second counts comfortably inside u32.
const MAX_PHASE_MINUTES: u32 = 1_440;

fn parse_minutes(key: &str, value: &str) -> Result<u32> {
    let minutes = value.parse::<u32>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("cannot parse '{value}' as minutes"),
    })?;
    if minutes == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "phase duration must be at least one minute".into(),
        }
        .into());
    }
    if minutes > MAX_PHASE_MINUTES {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("phase duration must be at most {MAX_PHASE_MINUTES} minutes"),
        }
        .into());
    }
    Ok(minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_pomodoro() {
        let cfg = Config::default();
        assert_eq!(cfg.timer.work_minutes, 25);
        assert_eq!(cfg.timer.break_minutes, 5);
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn get_set_round_trip() {
        let mut cfg = Config::default();
        cfg.set("timer.work_minutes", "45").unwrap();
        assert_eq!(cfg.get("timer.work_minutes").as_deref(), Some("45"));
        cfg.set("notifications.enabled", "false").unwrap();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("false"));
    }

    #[test]
    fn rejects_zero_duration_and_unknown_keys() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.work_minutes", "0").is_err());
        assert!(cfg.set("timer.volume", "50").is_err());
        assert!(cfg.get("timer.volume").is_none());
    }

    #[test]
    fn duration_is_capped_at_one_day() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.work_minutes", "1440").is_ok());
        assert!(cfg.set("timer.work_minutes", "1441").is_err());
        // A value whose second count would not fit in u32.
        assert!(cfg.set("timer.work_minutes", "71582789").is_err());
        assert_eq!(cfg.timer.work_minutes, 1440);
    }

    #[test]
    fn first_load_writes_defaults_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        // A saved change survives a reload.
        let mut cfg = cfg;
        cfg.set("timer.break_minutes", "10").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.timer.break_minutes, 10);
    }

    #[test]
    fn hand_edited_out_of_range_duration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[timer]\nwork_minutes = 71582789\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = \"not a table\"").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
