//! TOML-based application configuration.
//!
//! Stores the timer durations, the long-break cycle, the auto-start flag
//! and the default log level.
//!
//! Configuration is stored at `~/.config/pomocycle/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::timer::TimerSettings;

/// Timer configuration. Durations are in minutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break: u32,
    #[serde(default = "default_long_break")]
    pub long_break: u32,
    #[serde(default = "default_sessions_until_long_break")]
    pub sessions_until_long_break: u32,
    #[serde(default = "default_true")]
    pub auto_start_work_after_break: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomocycle/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_until_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".into()
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break: default_short_break(),
            long_break: default_long_break(),
            sessions_until_long_break: default_sessions_until_long_break(),
            auto_start_work_after_break: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
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
        let unknown = || ConfigError::invalid(key, "unknown config key");
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::invalid(key, "config key is empty"));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => value
                        .parse::<bool>()
                        .map(serde_json::Value::Bool)
                        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}' as bool")))?,
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| ConfigError::invalid(key, format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(ConfigError::invalid(key, "not a leaf value"));
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("config.toml"),
                message: e.to_string(),
            })
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if the file is missing.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
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
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
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
            serde_json::Value::Object(_) | serde_json::Value::Array(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key, in memory only.
    ///
    /// The change is applied only if the resulting config still validates;
    /// on error `self` is left untouched. Call [`Config::save`] to persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the new value is out of range.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json)
            .map_err(|e| ConfigError::invalid(key, e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Check every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.timer;
        for (key, value, min, max) in [
            ("timer.work_duration", t.work_duration, 1, 120),
            ("timer.short_break", t.short_break, 1, 60),
            ("timer.long_break", t.long_break, 5, 120),
        ] {
            if !(min..=max).contains(&value) {
                return Err(ConfigError::invalid(
                    key,
                    format!("must be between {min} and {max} minutes, got {value}"),
                ));
            }
        }
        if !(2..=10).contains(&t.sessions_until_long_break) {
            return Err(ConfigError::invalid(
                "timer.sessions_until_long_break",
                format!("must be between 2 and 10, got {}", t.sessions_until_long_break),
            ));
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "logging.level",
                format!("expected one of {}", LOG_LEVELS.join(", ")),
            ));
        }
        Ok(())
    }

    /// Validated timer settings built from this config.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the config fails [`Config::validate`].
    pub fn settings(&self) -> Result<TimerSettings, ConfigError> {
        self.validate()?;
        let minutes = |m: u32| Duration::from_secs(u64::from(m) * 60);
        TimerSettings::new(
            minutes(self.timer.work_duration),
            minutes(self.timer.short_break),
            minutes(self.timer.long_break),
            self.timer.sessions_until_long_break,
            self.timer.auto_start_work_after_break,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(parsed.timer.auto_start_work_after_break);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[timer]\nwork_duration = 50\n").unwrap();
        assert_eq!(parsed.timer.work_duration, 50);
        assert_eq!(parsed.timer.short_break, 5);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timer.work_duration").as_deref(), Some("25"));
        assert_eq!(cfg.get("timer.auto_start_work_after_break").as_deref(), Some("true"));
        assert_eq!(cfg.get("logging.level").as_deref(), Some("info"));
        assert!(cfg.get("timer.missing_key").is_none());
        assert!(cfg.get("timer").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Config::default();
        cfg.set("timer.short_break", "10").unwrap();
        cfg.set("timer.auto_start_work_after_break", "false").unwrap();
        cfg.set("logging.level", "debug").unwrap();
        assert_eq!(cfg.timer.short_break, 10);
        assert!(!cfg.timer.auto_start_work_after_break);
        assert_eq!(cfg.logging.level, "debug");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.nonexistent_key", "1").is_err());
        assert!(cfg.set("", "1").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set("timer.auto_start_work_after_break", "yes please").is_err());
        assert!(cfg.set("timer.work_duration", "-3").is_err());
    }

    #[test]
    fn set_rejects_out_of_range_and_leaves_config_untouched() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.sessions_until_long_break", "1").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "timer.sessions_until_long_break"));
        assert!(cfg.set("timer.work_duration", "0").is_err());
        assert!(cfg.set("logging.level", "chatty").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn long_break_has_a_five_minute_floor() {
        let mut cfg = Config::default();
        let err = cfg.set("timer.long_break", "4").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "timer.long_break"));
        assert_eq!(cfg, Config::default());

        cfg.set("timer.long_break", "5").unwrap();
        assert_eq!(cfg.timer.long_break, 5);
    }

    #[test]
    fn settings_convert_minutes() {
        let mut cfg = Config::default();
        cfg.timer.work_duration = 50;
        cfg.timer.sessions_until_long_break = 3;
        let settings = cfg.settings().unwrap();
        assert_eq!(settings.work(), Duration::from_secs(50 * 60));
        assert_eq!(settings.long_break(), Duration::from_secs(15 * 60));
        assert_eq!(settings.sessions_until_long_break(), 3);
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
    fn load_from_reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timer = [not valid").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailed { path: ref p, .. } if p == &path));
    }
}
