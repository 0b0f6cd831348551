//! Configuration types for a directory monitor.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, Result};

/// Configuration for a monitored directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory whose direct children are monitored.
    pub base_dir: PathBuf,

    /// How change notifications are obtained.
    #[serde(default)]
    pub watch_mode: WatchMode,
}

impl MonitorConfig {
    /// Create a new monitor config using native notifications.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            watch_mode: WatchMode::Native,
        }
    }

    /// Set the watch mode.
    pub fn with_mode(mut self, mode: WatchMode) -> Self {
        self.watch_mode = mode;
        self
    }

    /// Poll the directory at `interval` instead of using native notifications.
    pub fn poll_every(self, interval: Duration) -> Self {
        self.with_mode(WatchMode::Poll {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        })
    }

    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the config can be used to start a monitor.
    pub fn validate(&self) -> Result<()> {
        if self.base_dir.as_os_str().is_empty() {
            return Err(MonitorError::Config("base_dir must not be empty".to_string()));
        }

        if let WatchMode::Poll { interval_ms: 0 } = self.watch_mode {
            return Err(MonitorError::Config(
                "poll interval must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

/// How to watch a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchMode {
    /// Use the platform's native notification mechanism.
    #[default]
    Native,

    /// Periodically rescan the directory.
    Poll {
        /// Milliseconds between scans.
        interval_ms: u64,
    },
}

impl WatchMode {
    /// Poll interval, if this mode polls.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self {
            Self::Native => None,
            Self::Poll { interval_ms } => Some(Duration::from_millis(*interval_ms)),
        }
    }
}
