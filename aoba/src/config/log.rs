// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,

    Error,

    Warn,

    #[default]
    Info,

    Debug,

    Trace,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    /// Also log to console.
    #[serde(default = "Log::default_console_log")]
    console_log: bool,

    #[serde(default = "LogLevel::default")]
    log_level: LogLevel,

    /// Log file path. No file appender is installed when absent.
    #[serde(default)]
    log_file: Option<PathBuf>,
}

impl Log {
    const fn default_console_log() -> bool {
        true
    }

    #[must_use]
    pub const fn console_log(&self) -> bool {
        self.console_log
    }

    #[must_use]
    pub const fn log_level(&self) -> LogLevel {
        self.log_level
    }

    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    /// Validate log config.
    ///
    /// # Errors
    ///
    /// Returns error if the log file directory does not exist.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(log_file) = &self.log_file {
            if let Some(parent) = log_file.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    return Err(Error::from_string(
                        crate::error::ErrorKind::ConfigError,
                        format!("log.log_file directory does not exist: {parent:?}"),
                    ));
                }
            }
        }
        Ok(())
    }
}

impl Default for Log {
    fn default() -> Self {
        Self {
            console_log: Self::default_console_log(),
            log_level: LogLevel::default(),
            log_file: None,
        }
    }
}
