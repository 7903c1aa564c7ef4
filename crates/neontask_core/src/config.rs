//! Application configuration.
//!
//! # Responsibility
//! - Load `config.toml` from the platform config directory (or an explicit
//!   path) with a default for every field.
//! - Resolve profile paths (database, logs) against platform directories.
//!
//! # Invariants
//! - A missing default config file is not an error; an explicit path is.
//! - Poll interval and tolerance are strictly positive after `validate`.

use crate::logging::default_log_level;
use crate::reminder::poller::{DEFAULT_POLL_INTERVAL, DEFAULT_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR_NAME: &str = "neontask";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "neontask.sqlite3";
const LOG_DIR_NAME: &str = "logs";
const DEFAULT_SOUND_PATH: &str = "notify.mp3";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
    /// The platform exposes no data/config directory and no path was given.
    NoDefaultLocation(&'static str),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "failed to parse config file `{}`: {source}", path.display())
            }
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
            Self::NoDefaultLocation(what) => {
                write!(f, "no default location for {what}; set it explicitly")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) | Self::NoDefaultLocation(_) => None,
        }
    }
}

/// Top-level `config.toml` shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// SQLite profile file; defaults to `<data_dir>/neontask/neontask.sqlite3`.
    pub db_path: Option<PathBuf>,
    /// Rolling log directory; defaults to `<data_dir>/neontask/logs`.
    pub log_dir: Option<PathBuf>,
    /// `trace|debug|info|warn|error`; defaults per build mode.
    pub log_level: Option<String>,
    pub reminder: ReminderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReminderConfig {
    pub poll_interval_secs: u64,
    pub tolerance_secs: u64,
    /// Audio asset played when a reminder fires.
    pub sound_path: PathBuf,
    /// Player command line; the platform default is used when absent.
    pub sound_player: Option<String>,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: DEFAULT_POLL_INTERVAL.as_secs(),
            tolerance_secs: DEFAULT_TOLERANCE.as_secs(),
            sound_path: PathBuf::from(DEFAULT_SOUND_PATH),
            sound_player: None,
        }
    }
}

impl ReminderConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn tolerance(&self) -> Duration {
        Duration::from_secs(self.tolerance_secs)
    }
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// With `explicit = Some(path)` the file must exist. Otherwise the
    /// default location is tried and a missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (Some(path.to_path_buf()), true),
            None => (default_config_path(), false),
        };

        let Some(path) = path else {
            return Ok(Self::default());
        };
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse { path, source },
            other => other,
        })
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reminder.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminder.poll_interval_secs must be greater than 0".to_string(),
            ));
        }
        if self.reminder.tolerance_secs == 0 {
            return Err(ConfigError::Invalid(
                "reminder.tolerance_secs must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => app_data_dir()
                .map(|dir| dir.join(DB_FILE_NAME))
                .ok_or(ConfigError::NoDefaultLocation("db_path")),
        }
    }

    pub fn log_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.log_dir {
            Some(path) => Ok(path.clone()),
            None => app_data_dir()
                .map(|dir| dir.join(LOG_DIR_NAME))
                .ok_or(ConfigError::NoDefaultLocation("log_dir")),
        }
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or_else(|| default_log_level())
    }
}

/// `<config_dir>/neontask/config.toml`, when the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn app_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, ConfigError};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn empty_text_yields_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.reminder.poll_interval(), Duration::from_secs(20));
        assert_eq!(config.reminder.tolerance(), Duration::from_secs(60));
        assert_eq!(config.reminder.sound_path, PathBuf::from("notify.mp3"));
    }

    #[test]
    fn partial_reminder_section_keeps_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            log_level = "warn"

            [reminder]
            poll_interval_secs = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.log_level(), "warn");
        assert_eq!(config.reminder.poll_interval_secs, 5);
        assert_eq!(config.reminder.tolerance_secs, 60);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = AppConfig::from_toml_str("[reminder]\npoll_interval_secs = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AppConfig::from_toml_str("colour = \"neon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn explicit_db_path_wins() {
        let config = AppConfig::from_toml_str("db_path = \"/tmp/tasks.sqlite3\"").unwrap();
        assert_eq!(
            config.db_path().unwrap(),
            PathBuf::from("/tmp/tasks.sqlite3")
        );
    }
}
