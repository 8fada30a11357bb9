//! The public logging service.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, trace, warn};

use crate::config::LogToolsConfig;
use crate::error::{LogError, Result};
use crate::file_manager::{list_log_files, LogFileManager, FILTER_FILE_PREFIX, LOG_FILE_PREFIX};
use crate::keyword_filter::KeywordFilter;
use crate::retention::{
    ActiveFiles, RetentionLimits, RetentionManager, RetentionPolicy, SweepReport,
};
use crate::scheduler::{validate_period, RetentionScheduler};
use crate::settings::{SettingsStore, KEY_FILTER_DIR, KEY_LOG_DIR, KEY_MAX_FILE_SIZE};
use crate::types::{BufferType, CallerInfo, Clock, Level, LogEntry, WriteOptions};
use crate::writer::LogWriter;

static GLOBAL: OnceCell<LogTools> = OnceCell::new();

/// Initializes the process-wide instance.
///
/// Idempotent: only the first successful call builds an instance; later
/// calls return it and ignore their arguments.
///
/// # Errors
///
/// Returns an error if the first initialization fails.
pub fn init_global(
    config: LogToolsConfig,
    settings: Arc<dyn SettingsStore>,
) -> Result<&'static LogTools> {
    GLOBAL.get_or_try_init(|| LogTools::initialize(config, settings))
}

/// Returns the process-wide instance.
///
/// # Errors
///
/// Returns [`LogError::NotInitialized`] before [`init_global`].
pub fn global() -> Result<&'static LogTools> {
    GLOBAL.get().ok_or(LogError::NotInitialized)
}

/// A rotating file logger with keyword mirroring and retention.
///
/// Owns the writer thread, the keyword filter, and the retention workers for
/// the log and filter directories.
pub struct LogTools {
    settings: Arc<dyn SettingsStore>,
    console_echo: bool,
    sweep_period: Duration,
    clock: Arc<dyn Clock>,
    max_file_size: Arc<AtomicU64>,
    policy: Arc<RetentionPolicy>,
    filter: Arc<KeywordFilter>,
    writer: LogWriter,
    log_retention: RetentionScheduler,
    filter_retention: RetentionScheduler,
    log_dir: RwLock<PathBuf>,
    filter_dir: PathBuf,
    reconfigure: Mutex<()>,
}

impl LogTools {
    /// Builds the service and starts its workers.
    ///
    /// Directories and the file-size cap come from `settings` when present,
    /// otherwise from `config`; the resolved directories are written back.
    ///
    /// # Errors
    ///
    /// Returns an error if a limit in `config` is invalid or a worker thread
    /// cannot be spawned.
    pub fn initialize(config: LogToolsConfig, settings: Arc<dyn SettingsStore>) -> Result<Self> {
        validate_period(config.sweep_period)?;
        let policy = Arc::new(RetentionPolicy::new(config.retention)?);

        let log_dir = settings
            .get(KEY_LOG_DIR)
            .filter(|d| !d.trim().is_empty())
            .map_or_else(|| config.log_dir.clone(), PathBuf::from);
        let filter_dir = settings
            .get(KEY_FILTER_DIR)
            .filter(|d| !d.trim().is_empty())
            .map_or_else(|| config.filter_dir.clone(), PathBuf::from);
        let max_file_size = settings
            .get_u64(KEY_MAX_FILE_SIZE)
            .filter(|size| *size > 0)
            .unwrap_or(config.max_file_size);
        if max_file_size == 0 {
            return Err(LogError::InvalidConfig("max file size must be > 0".into()));
        }

        settings.put(KEY_LOG_DIR, &log_dir.to_string_lossy());
        settings.put(KEY_FILTER_DIR, &filter_dir.to_string_lossy());
        ensure_dir(&log_dir);
        ensure_dir(&filter_dir);

        let max_file_size = Arc::new(AtomicU64::new(max_file_size));
        let active = ActiveFiles::default();

        let filter = Arc::new(KeywordFilter::new(
            &filter_dir,
            Arc::clone(&max_file_size),
            Arc::clone(&config.clock),
            active.clone(),
        ));
        // The keyword list is tiny and rarely touched, so it would be the
        // first thing a sweep evicts.
        active.register(filter.keyword_file());

        let main = LogFileManager::new(
            &log_dir,
            LOG_FILE_PREFIX,
            Arc::clone(&max_file_size),
            Arc::clone(&config.clock),
            active.clone(),
        );
        let writer = LogWriter::new(main, Arc::clone(&filter))?;

        let manager = RetentionManager::new(Arc::clone(&policy), active);
        let log_retention = RetentionScheduler::new(manager.clone());
        let filter_retention = RetentionScheduler::new(manager);

        let tools = Self {
            settings,
            console_echo: config.console_echo,
            sweep_period: config.sweep_period,
            clock: config.clock,
            max_file_size,
            policy,
            filter,
            writer,
            log_retention,
            filter_retention,
            log_dir: RwLock::new(log_dir),
            filter_dir,
            reconfigure: Mutex::new(()),
        };
        tools.start_retention()?;

        info!(
            log_dir = %tools.log_directory().display(),
            filter_dir = %tools.filter_dir.display(),
            "logtools initialized"
        );
        debug!("{}", tools.config_summary());
        Ok(tools)
    }

    fn start_retention(&self) -> Result<()> {
        let log_dir = self.log_directory();
        self.log_retention.start(&log_dir, self.sweep_period)?;
        // A filter tree inside the log tree is already covered.
        if !self.filter_dir.starts_with(&log_dir) {
            self.filter_retention.start(&self.filter_dir, self.sweep_period)?;
        }
        Ok(())
    }

    /// Logs `message`.
    ///
    /// Echoes through `tracing` on the calling thread (when enabled), then
    /// queues the durable append and returns without waiting for disk I/O.
    ///
    /// Every entry occupies exactly one line on disk: a carriage return or
    /// line feed in `message` (or `tag`) is written as a backslash followed by
    /// `r` or `n`, so a message cannot start a `<seq>` line of its own.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after [`LogTools::shutdown`].
    pub fn write(
        &self,
        level: Level,
        buffer: BufferType,
        pid: u32,
        tag: Option<&str>,
        message: &str,
        options: WriteOptions,
    ) -> Result<()> {
        if self.console_echo {
            echo(level, tag, message, options.caller.as_ref());
        }

        let entry = LogEntry {
            level,
            buffer,
            pid,
            tag: tag.map(str::to_string),
            message: message.to_string(),
            timestamp: self.clock.now(),
            caller: options.caller,
        };
        self.writer.submit(entry, options.persist)
    }

    fn write_main(&self, level: Level, tag: &str, message: &str) -> Result<()> {
        self.write(
            level,
            BufferType::Main,
            std::process::id(),
            Some(tag),
            message,
            WriteOptions::default(),
        )
    }

    /// Logs at verbose level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn v(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::V, tag, message)
    }

    /// Logs at debug level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn d(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::D, tag, message)
    }

    /// Logs at info level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn i(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::I, tag, message)
    }

    /// Logs at warning level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn w(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::W, tag, message)
    }

    /// Logs at error level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn e(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::E, tag, message)
    }

    /// Logs at fatal level to the main buffer.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn f(&self, tag: &str, message: &str) -> Result<()> {
        self.write_main(Level::F, tag, message)
    }

    /// Adds a keyword to mirror into the filtered log.
    ///
    /// Returns false if the keyword was blank or already present.
    pub fn add_keyword(&self, keyword: &str) -> bool {
        self.filter.add_keyword(keyword)
    }

    /// Returns the configured keywords in insertion order.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        self.filter.keywords()
    }

    /// Lists the main log file names in the log directory.
    #[must_use]
    pub fn log_files(&self) -> Vec<String> {
        list_log_files(&self.log_directory(), LOG_FILE_PREFIX)
    }

    /// Lists the filtered log file names in the filter directory.
    #[must_use]
    pub fn filtered_files(&self) -> Vec<String> {
        list_log_files(&self.filter_dir, FILTER_FILE_PREFIX)
    }

    /// Sets the per-file size cap for both streams and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `bytes` is zero.
    pub fn set_max_file_size(&self, bytes: u64) -> Result<()> {
        if bytes == 0 {
            return Err(LogError::InvalidConfig("max file size must be > 0".into()));
        }
        self.max_file_size.store(bytes, Ordering::Relaxed);
        self.settings.put_u64(KEY_MAX_FILE_SIZE, bytes);
        Ok(())
    }

    /// Returns the per-file size cap.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size.load(Ordering::Relaxed)
    }

    /// Sets the total-bytes cap enforced by retention.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `bytes` is zero.
    pub fn set_max_folder_size(&self, bytes: u64) -> Result<()> {
        self.policy.set_max_total_bytes(bytes)
    }

    /// Sets the file-count cap enforced by retention.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `count` is zero.
    pub fn set_max_file_count(&self, count: usize) -> Result<()> {
        self.policy.set_max_file_count(count)
    }

    /// Sets the fraction of the caps retention cleans down to.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] unless `0 < ratio < 1`.
    pub fn set_clean_target_ratio(&self, ratio: f64) -> Result<()> {
        self.policy.set_target_ratio(ratio)
    }

    /// Returns the current retention caps.
    #[must_use]
    pub fn retention_limits(&self) -> RetentionLimits {
        self.policy.limits()
    }

    /// Returns the retention caps as one line, also logged at debug level.
    #[must_use]
    pub fn config_summary(&self) -> String {
        let limits = self.policy.limits();
        let summary = format!(
            "maxFolderSize={} maxFileCount={} cleanTarget={:.0}% maxFileSize={}",
            limits.max_total_bytes,
            limits.max_file_count,
            limits.target_ratio * 100.0,
            self.max_file_size()
        );
        debug!(%summary, "retention config");
        summary
    }

    /// Moves the main log to `dir`.
    ///
    /// Persists the directory, restarts retention against it, and makes the
    /// writer resolve a file there on its next append.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for an empty path, or an error if
    /// the retention worker cannot be restarted.
    pub fn set_log_directory(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        if dir.as_os_str().is_empty() {
            return Err(LogError::InvalidConfig("log directory must not be empty".into()));
        }

        let _guard = self.reconfigure.lock();
        self.settings.put(KEY_LOG_DIR, &dir.to_string_lossy());
        ensure_dir(dir);

        self.log_retention.stop();
        self.filter_retention.stop();
        *self.log_dir.write() = dir.to_path_buf();
        self.writer.set_directory(dir)?;
        self.start_retention()?;

        info!(log_dir = %dir.display(), "log directory changed");
        Ok(())
    }

    /// Returns the main log directory.
    #[must_use]
    pub fn log_directory(&self) -> PathBuf {
        self.log_dir.read().clone()
    }

    /// Returns the filtered log directory.
    #[must_use]
    pub fn filter_directory(&self) -> &Path {
        &self.filter_dir
    }

    /// Returns the file the main log is appending to, if resolved.
    #[must_use]
    pub fn current_log_file(&self) -> Option<PathBuf> {
        self.writer.current_path()
    }

    /// Returns true while the log-directory retention worker is active.
    #[must_use]
    pub fn retention_running(&self) -> bool {
        self.log_retention.is_running()
    }

    /// Runs a retention sweep over the log directory on the calling thread.
    pub fn sweep_now(&self) -> SweepReport {
        self.log_retention.sweep_now(&self.log_directory())
    }

    /// Blocks until every entry written so far is on disk.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub fn flush(&self) -> Result<()> {
        self.writer.flush()
    }

    /// Async form of [`LogTools::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after shutdown.
    pub async fn flush_async(&self) -> Result<()> {
        self.writer.flush_async().await
    }

    /// Stops retention, drains the writer, and closes all files.
    pub fn shutdown(&self) {
        self.log_retention.stop();
        self.filter_retention.stop();
        self.writer.shutdown();
    }
}

fn ensure_dir(dir: &Path) {
    if let Err(e) = fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "cannot create log directory");
    }
}

/// Mirrors an entry to `tracing` at the matching level.
fn echo(level: Level, tag: Option<&str>, message: &str, caller: Option<&CallerInfo>) {
    let tag = tag.unwrap_or_default();
    let text = match caller {
        Some(caller) => format!("[ {} ] {message}", caller.render()),
        None => message.to_string(),
    };
    match level {
        Level::V => trace!(target: "logtools::console", tag, "{text}"),
        Level::D => debug!(target: "logtools::console", tag, "{text}"),
        Level::I => info!(target: "logtools::console", tag, "{text}"),
        Level::W => warn!(target: "logtools::console", tag, "{text}"),
        Level::E | Level::F => error!(target: "logtools::console", tag, %level, "{text}"),
    }
}
