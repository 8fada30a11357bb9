//! Core types for the logging engine.
//!
//! This module provides:
//! - [`Level`] — Severity letters (`V`, `D`, `I`, `W`, `E`, `F`)
//! - [`BufferType`] — Which log buffer an entry belongs to
//! - [`CallerInfo`] — Optional source location rendered in place of the tag
//! - [`LogEntry`] — A single logging call, rendered to one line on disk
//! - [`WriteOptions`] — Per-call persistence and caller-info switches
//! - [`Clock`] — Source of "now", injectable for date-rollover tests

use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Timestamp format used inside log lines.
pub const LINE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Date format embedded in log file names.
pub const FILE_DATE_FORMAT: &str = "%Y%m%d";

/// Log severity levels, ordered from most to least verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub enum Level {
    /// Verbose
    #[serde(rename = "V")]
    V,
    /// Debug
    #[serde(rename = "D")]
    D,
    /// Info
    #[serde(rename = "I")]
    I,
    /// Warning
    #[serde(rename = "W")]
    W,
    /// Error
    #[serde(rename = "E")]
    E,
    /// Fatal ("what a terrible failure")
    #[serde(rename = "F")]
    F,
}

impl Level {
    /// All levels, most verbose first.
    pub const ALL: [Self; 6] = [Self::V, Self::D, Self::I, Self::W, Self::E, Self::F];

    /// Returns the single-letter form written to log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::V => "V",
            Self::D => "D",
            Self::I => "I",
            Self::W => "W",
            Self::E => "E",
            Self::F => "F",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v" | "verbose" => Ok(Self::V),
            "d" | "debug" => Ok(Self::D),
            "i" | "info" => Ok(Self::I),
            "w" | "warn" | "warning" => Ok(Self::W),
            "e" | "error" => Ok(Self::E),
            "f" | "fatal" => Ok(Self::F),
            other => Err(LogError::InvalidConfig(format!("unknown level: {other}"))),
        }
    }
}

/// Log buffer an entry is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BufferType {
    /// Application buffer
    #[default]
    Main,
    /// System buffer
    System,
    /// Radio buffer
    Radio,
    /// Events buffer
    Events,
    /// Crash buffer
    Crash,
}

impl BufferType {
    /// Returns the upper-case name written to log lines.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::System => "SYSTEM",
            Self::Radio => "RADIO",
            Self::Events => "EVENTS",
            Self::Crash => "CRASH",
        }
    }
}

impl fmt::Display for BufferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BufferType {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MAIN" => Ok(Self::Main),
            "SYSTEM" => Ok(Self::System),
            "RADIO" => Ok(Self::Radio),
            "EVENTS" => Ok(Self::Events),
            "CRASH" => Ok(Self::Crash),
            other => Err(LogError::InvalidConfig(format!("unknown buffer: {other}"))),
        }
    }
}

/// Source location of a logging call.
///
/// Usually built with the [`caller_info!`](crate::caller_info) macro.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerInfo {
    /// Source file name (no directories)
    pub file: String,
    /// Line number in `file`
    pub line: u32,
    /// Name of the calling function
    pub method: String,
}

impl CallerInfo {
    /// Creates caller info from raw parts.
    ///
    /// `file` is reduced to its file name and `method` may be a full path
    /// such as `crate::module::function::{{closure}}`; only the last named
    /// segment is kept.
    #[must_use]
    pub fn new(file: &str, line: u32, method: &str) -> Self {
        let file = Path::new(file)
            .file_name()
            .map_or_else(|| file.to_string(), |n| n.to_string_lossy().into_owned());

        let mut method = method;
        while let Some(stripped) = method.strip_suffix("::{{closure}}") {
            method = stripped;
        }
        let method = method.rsplit("::").next().unwrap_or(method).to_string();

        Self { file, line, method }
    }

    /// Renders `(file:line)#Method` with the method's first character upper-cased.
    #[must_use]
    pub fn render(&self) -> String {
        let mut chars = self.method.chars();
        let method = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
            None => String::new(),
        };
        format!("({}:{})#{}", self.file, self.line, method)
    }
}

/// Captures the [`CallerInfo`] of the enclosing function.
///
/// ```rust
/// let caller = logtools::caller_info!();
/// assert!(caller.file.ends_with(".rs"));
/// assert!(caller.line > 0);
/// ```
#[macro_export]
macro_rules! caller_info {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__here);
        let name = name.strip_suffix("::__here").unwrap_or(name);
        $crate::CallerInfo::new(file!(), line!(), name)
    }};
}

/// Per-call switches for [`crate::LogTools::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Append the entry to the main log file.
    pub persist: bool,
    /// Render this location instead of the tag.
    pub caller: Option<CallerInfo>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            persist: true,
            caller: None,
        }
    }
}

impl WriteOptions {
    /// Persisted, tag-only options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether the entry is appended to the main log.
    #[must_use]
    pub const fn with_persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Renders the given caller location instead of the tag.
    #[must_use]
    pub fn with_caller(mut self, caller: CallerInfo) -> Self {
        self.caller = Some(caller);
        self
    }
}

/// A single logging call.
///
/// Entries are never stored as objects; only [`LogEntry::render`] output
/// reaches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Severity
    pub level: Level,
    /// Buffer the entry belongs to
    pub buffer: BufferType,
    /// Process id of the caller
    pub pid: u32,
    /// Free-form tag, rendered as `null` when absent
    pub tag: Option<String>,
    /// The message
    pub message: String,
    /// When `write` was called
    pub timestamp: DateTime<Local>,
    /// Source location rendered in place of the tag
    pub caller: Option<CallerInfo>,
}

impl LogEntry {
    /// Renders the on-disk line (without terminator) for `sequence`.
    ///
    /// `<seq> [pid] [buffer] [level] [timestamp] [tag-or-caller] message`
    ///
    /// Line terminators inside the origin or message are escaped.
    #[must_use]
    pub fn render(&self, sequence: u64) -> String {
        let origin = match &self.caller {
            Some(caller) => caller.render(),
            None => self.tag.clone().unwrap_or_else(|| "null".to_string()),
        };
        format!(
            "<{sequence}> [{}] [{}] [{}] [{}] [{}] {}",
            self.pid,
            self.buffer,
            self.level,
            self.timestamp.format(LINE_TIMESTAMP_FORMAT),
            single_line(&origin),
            single_line(&self.message)
        )
    }
}

/// Escapes `\r` and `\n` so `text` occupies one physical line.
///
/// Borrows when there is nothing to escape.
#[must_use]
pub fn single_line(text: &str) -> Cow<'_, str> {
    if !text.contains(['\r', '\n']) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Source of the current local time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current local time.
    fn now(&self) -> DateTime<Local>;

    /// Returns today's date as used in file names (`yyyyMMdd`).
    fn today(&self) -> String {
        self.now().format(FILE_DATE_FORMAT).to_string()
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Local>>,
}

impl ManualClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Jumps to `now`.
    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock() = now;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}
