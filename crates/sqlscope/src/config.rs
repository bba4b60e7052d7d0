//! Session configuration.
//!
//! The only knob today is the statement log mode, read from `SQLSCOPE_LOG`
//! or set through [`SessionConfig::log_mode`].

use serde::{Deserialize, Serialize};
use sqlscope_core::Error;
use sqlscope_core::error::ConfigError;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Environment variable read by [`SessionConfig::from_env`].
pub const LOG_ENV: &str = "SQLSCOPE_LOG";

/// How executed statements are traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// No statement traces.
    Silent,
    /// Statement traces at `debug` level.
    #[default]
    Default,
    /// Statement traces at `info` level.
    Verbose,
}

impl LogMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            LogMode::Silent => "silent",
            LogMode::Default => "default",
            LogMode::Verbose => "verbose",
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silent" | "off" | "0" => Ok(LogMode::Silent),
            "default" | "" => Ok(LogMode::Default),
            "verbose" | "1" => Ok(LogMode::Verbose),
            other => Err(Error::Config(ConfigError {
                message: format!(
                    "invalid log mode '{other}' (expected silent, default or verbose)"
                ),
                source: None,
            })),
        }
    }
}

/// Settings applied to a root [`Session`](crate::Session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub log_mode: LogMode,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the statement log mode.
    #[must_use]
    pub fn log_mode(mut self, mode: LogMode) -> Self {
        self.log_mode = mode;
        self
    }

    /// Read settings from the process environment.
    ///
    /// An unset `SQLSCOPE_LOG` leaves the default; an unrecognized value is a
    /// configuration error.
    pub fn from_env() -> sqlscope_core::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> sqlscope_core::Result<Self> {
        let mut config = Self::default();
        if let Some(mode) = lookup(LOG_ENV) {
            config.log_mode = mode.parse()?;
        }
        Ok(config)
    }
}
