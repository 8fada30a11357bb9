//! # logtools
//!
//! Crash-tolerant rotating file logger.
//!
//! This crate provides:
//!
//! - [`LogTools`] — The logging service: ordered appends, rotation, keyword
//!   mirroring and retention
//! - [`LogWriter`] — The single-threaded append stream
//! - [`LogFileManager`] — Date/size rotation and sequence continuity for one stream
//! - [`KeywordFilter`] — Mirrors keyword matches into a separate filtered log
//! - [`RetentionManager`] — Size/count-capped, oldest-first directory sweeps
//! - [`RetentionScheduler`] — Periodic sweeps on a dedicated worker
//! - [`next_sequence`] — Sequence recovery from the tail of an existing file
//! - [`SettingsStore`] — Persisted directories and file-size cap
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use logtools::{LogTools, LogToolsConfig, MemorySettings};
//!
//! let tools = LogTools::initialize(
//!     LogToolsConfig::new("/var/log/myapp"),
//!     Arc::new(MemorySettings::new()),
//! )?;
//!
//! tools.add_keyword("timeout");
//! tools.i("net", "upstream timeout after 30s")?;
//! tools.flush()?;
//! # Ok::<(), logtools::LogError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod file_manager;
pub mod keyword_filter;
pub mod retention;
pub mod scheduler;
pub mod sequence;
pub mod settings;
pub mod tools;
pub mod types;
pub mod writer;

// Re-export main types
pub use config::LogToolsConfig;
pub use error::{LogError, Result};
pub use file_manager::{
    file_name, list_log_files, parse_index, LogFileManager, DEFAULT_MAX_FILE_SIZE,
    FILTER_FILE_PREFIX, LOG_FILE_EXTENSION, LOG_FILE_PREFIX,
};
pub use keyword_filter::{KeywordFilter, KEYWORD_FILE_NAME};
pub use retention::{
    ActiveFiles, RetentionLimits, RetentionManager, RetentionPolicy, SweepReport,
    DEFAULT_MAX_FILE_COUNT, DEFAULT_MAX_TOTAL_BYTES, DEFAULT_TARGET_RATIO,
};
pub use scheduler::{RetentionScheduler, DEFAULT_SWEEP_PERIOD};
pub use sequence::{next_sequence, parse_sequence};
pub use settings::{
    JsonFileSettings, MemorySettings, SettingsStore, KEY_FILTER_DIR, KEY_LOG_DIR,
    KEY_MAX_FILE_SIZE,
};
pub use tools::{global, init_global, LogTools};
pub use types::{
    BufferType, CallerInfo, Clock, Level, LogEntry, ManualClock, SystemClock, WriteOptions,
    FILE_DATE_FORMAT, LINE_TIMESTAMP_FORMAT,
};
pub use writer::LogWriter;
