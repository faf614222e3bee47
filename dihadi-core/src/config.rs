//! Session window configuration
//!
//! The server signs tokens for the same windows the client tracks, so both
//! sides read them from here.

use crate::error::{DihadiError, DihadiResult};
use crate::{config_error, ErrorContext};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest regular session, in minutes
pub const MAX_SHORT_MINUTES: i64 = 24 * 60;
/// Longest remembered session, in days
pub const MAX_LONG_DAYS: i64 = 365;
/// Longest timer interval, in seconds
pub const MAX_INTERVAL_SECS: u64 = 60 * 60;

/// Session and token lifetimes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionWindows {
    /// Lifetime of a regular session, in minutes
    pub short_minutes: i64,
    /// Lifetime of a remembered session, in days
    pub long_days: i64,
    /// How long before expiry the warning is shown, in minutes
    pub warning_minutes: i64,
    /// Background validity poll, in seconds
    pub poll_interval_secs: u64,
    /// Countdown refresh while a warning is shown, in seconds
    pub countdown_tick_secs: u64,
}

impl Default for SessionWindows {
    fn default() -> Self {
        Self {
            short_minutes: 30,
            long_days: 7,
            warning_minutes: 5,
            poll_interval_secs: 10,
            countdown_tick_secs: 1,
        }
    }
}

impl SessionWindows {
    // Accessors clamp to the validated range so unchecked values never overflow
    pub fn short(&self) -> Duration {
        Duration::try_minutes(self.short_minutes.clamp(0, MAX_SHORT_MINUTES))
            .unwrap_or_else(Duration::zero)
    }

    pub fn long(&self) -> Duration {
        Duration::try_days(self.long_days.clamp(0, MAX_LONG_DAYS)).unwrap_or_else(Duration::zero)
    }

    pub fn warning(&self) -> Duration {
        Duration::try_minutes(self.warning_minutes.clamp(0, MAX_SHORT_MINUTES))
            .unwrap_or_else(Duration::zero)
    }

    /// Session length for the given "remember me" choice
    pub fn duration(&self, remember: bool) -> Duration {
        if remember {
            self.long()
        } else {
            self.short()
        }
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.poll_interval_secs)
    }

    pub fn countdown_tick(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.countdown_tick_secs)
    }

    /// The warning must fit inside the shortest session
    pub fn validate(&self) -> DihadiResult<()> {
        if self.short_minutes <= 0 || self.long_days <= 0 {
            return Err(config_error!(
                "session windows must be positive",
                "config"
            ));
        }
        if self.short_minutes > MAX_SHORT_MINUTES || self.long_days > MAX_LONG_DAYS {
            return Err(config_error!(
                format!(
                    "session windows are limited to {} minutes and {} days",
                    MAX_SHORT_MINUTES, MAX_LONG_DAYS
                ),
                "config"
            ));
        }
        if self.warning_minutes <= 0 || self.warning() >= self.short() {
            return Err(config_error!(
                "warning window must be positive and shorter than the short session",
                "config"
            ));
        }
        if self.poll_interval_secs == 0 || self.countdown_tick_secs == 0 {
            return Err(config_error!("timer intervals must be non-zero", "config"));
        }
        if self.poll_interval_secs > MAX_INTERVAL_SECS || self.countdown_tick_secs > MAX_INTERVAL_SECS
        {
            return Err(config_error!(
                format!("timer intervals are limited to {} seconds", MAX_INTERVAL_SECS),
                "config"
            ));
        }
        Ok(())
    }

    /// Load from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> DihadiResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let windows: SessionWindows = toml::from_str(&content).map_err(|e| DihadiError::Config {
            message: format!("Failed to parse session config: {}", e),
            context: ErrorContext::new("config")
                .with_metadata("path", &path.as_ref().display().to_string()),
        })?;
        windows.validate()?;
        Ok(windows)
    }

    /// Save to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> DihadiResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| DihadiError::Config {
            message: format!("Failed to serialize session config: {}", e),
            context: ErrorContext::new("config"),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
