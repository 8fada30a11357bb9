//! Construction-time configuration for [`crate::LogTools`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::file_manager::DEFAULT_MAX_FILE_SIZE;
use crate::retention::RetentionLimits;
use crate::scheduler::DEFAULT_SWEEP_PERIOD;
use crate::types::{Clock, SystemClock};

/// Configuration for a [`crate::LogTools`] instance.
///
/// Directory and file-size values act as defaults: values already present in
/// the [`crate::SettingsStore`] win.
#[derive(Debug, Clone)]
pub struct LogToolsConfig {
    /// Default main log directory.
    pub log_dir: PathBuf,
    /// Default filtered log directory.
    pub filter_dir: PathBuf,
    /// Default size cap of a single file, in bytes.
    pub max_file_size: u64,
    /// Retention caps applied to both directory trees.
    pub retention: RetentionLimits,
    /// Time between retention sweeps.
    pub sweep_period: Duration,
    /// Echo every entry through `tracing` on the calling thread.
    pub console_echo: bool,
    /// Source of "now" for file dates and line timestamps.
    pub clock: Arc<dyn Clock>,
}

impl Default for LogToolsConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            filter_dir: PathBuf::from("logs-filter"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            retention: RetentionLimits::default(),
            sweep_period: DEFAULT_SWEEP_PERIOD,
            console_echo: true,
            clock: Arc::new(SystemClock),
        }
    }
}

impl LogToolsConfig {
    /// Creates a config writing under `log_dir`, with filtered logs in
    /// `<log_dir>/filter`.
    #[must_use]
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let log_dir = log_dir.into();
        Self {
            filter_dir: log_dir.join("filter"),
            log_dir,
            ..Default::default()
        }
    }

    /// Sets the filtered log directory.
    #[must_use]
    pub fn with_filter_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.filter_dir = dir.into();
        self
    }

    /// Sets the default per-file size cap.
    #[must_use]
    pub const fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the retention caps.
    #[must_use]
    pub const fn with_retention(mut self, retention: RetentionLimits) -> Self {
        self.retention = retention;
        self
    }

    /// Sets the time between retention sweeps.
    #[must_use]
    pub const fn with_sweep_period(mut self, period: Duration) -> Self {
        self.sweep_period = period;
        self
    }

    /// Turns the `tracing` echo on or off.
    #[must_use]
    pub const fn with_console_echo(mut self, echo: bool) -> Self {
        self.console_echo = echo;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}
