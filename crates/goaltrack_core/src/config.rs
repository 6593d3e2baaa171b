//! Runtime configuration for hosts embedding the core.
//!
//! Sources, highest priority first:
//! 1. `GOALTRACK_*` environment variables
//! 2. built-in defaults
//!
//! Extracted values are validated and normalized before use.

use crate::logging::{default_log_level, normalize_level, normalize_log_dir};
use crate::service::stats_service::DAILY_STATS_DEFAULT_DAYS;
use crate::service::time_log_service::{TIME_LOG_PAGE_DEFAULT_LIMIT, TIME_LOG_PAGE_LIMIT_MAX};
use figment::providers::{Env, Serialized};
use figment::value::{Uncased, UncasedStr};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "GOALTRACK_";
pub const ENV_DB_PATH: &str = "GOALTRACK_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "GOALTRACK_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "GOALTRACK_LOG_DIR";
pub const ENV_DAILY_DAYS: &str = "GOALTRACK_DAILY_DAYS";
pub const ENV_PAGE_SIZE: &str = "GOALTRACK_PAGE_SIZE";

const DEFAULT_DB_FILE: &str = "goaltrack.sqlite3";
const DAILY_WINDOW_MAX_DAYS: u32 = 3650;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// One of trace|debug|info|warn|error after loading.
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    pub daily_window_days: u32,
    pub list_page_size: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            log_level: default_log_level().to_string(),
            log_dir: None,
            daily_window_days: DAILY_STATS_DEFAULT_DAYS,
            list_page_size: TIME_LOG_PAGE_DEFAULT_LIMIT,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// Merging or extracting the provider chain failed.
    Figment(figment::Error),
    /// A value was read but cannot be used.
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Figment(err) => write!(f, "configuration error: {err}"),
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Figment(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Figment(value)
    }
}

impl CoreConfig {
    /// Loads defaults overridden by `GOALTRACK_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Default provider chain. Public so callers can merge extra providers.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::prefixed(ENV_PREFIX).map(env_key_to_field))
    }

    /// Extracts and validates a config from any provider chain.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract::<Self>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        let log_level = normalize_level(&self.log_level)
            .map_err(|reason| invalid(ENV_LOG_LEVEL, self.log_level.clone(), reason))?;

        let log_dir = match self.log_dir.as_deref() {
            None => None,
            Some(dir) => {
                let dir = dir.to_string_lossy();
                if dir.trim().is_empty() {
                    None
                } else {
                    let path = normalize_log_dir(&dir)
                        .map_err(|reason| invalid(ENV_LOG_DIR, dir.to_string(), reason))?;
                    Some(path)
                }
            }
        };

        Ok(Self {
            log_level: log_level.to_string(),
            log_dir,
            daily_window_days: ensure_range(
                ENV_DAILY_DAYS,
                self.daily_window_days,
                DAILY_WINDOW_MAX_DAYS,
            )?,
            list_page_size: ensure_range(
                ENV_PAGE_SIZE,
                self.list_page_size,
                TIME_LOG_PAGE_LIMIT_MAX,
            )?,
            db_path: self.db_path,
        })
    }
}

/// Maps the short variable suffixes onto struct fields.
fn env_key_to_field(key: &UncasedStr) -> Uncased<'_> {
    let key = key.as_str();
    if key.eq_ignore_ascii_case("daily_days") {
        Uncased::from("daily_window_days")
    } else if key.eq_ignore_ascii_case("page_size") {
        Uncased::from("list_page_size")
    } else {
        Uncased::from(key)
    }
}

fn ensure_range(key: &'static str, value: u32, max: u32) -> Result<u32, ConfigError> {
    if (1..=max).contains(&value) {
        return Ok(value);
    }
    Err(invalid(key, value.to_string(), format!("expected 1..={max}")))
}

fn invalid(key: &'static str, value: String, reason: String) -> ConfigError {
    ConfigError::InvalidValue { key, value, reason }
}
