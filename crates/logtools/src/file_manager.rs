//! Rotating log file sets.
//!
//! This module provides:
//! - [`LogFileManager`] — Owns the current file of one logical stream
//! - Daily file sets named `<prefix><yyyyMMdd>_<index><extension>`
//! - Rotation on date rollover, size cap, or external deletion
//! - Sequence continuity across rotations and restarts

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::retention::ActiveFiles;
use crate::sequence;
use crate::types::Clock;

/// Extension shared by log and filter files.
pub const LOG_FILE_EXTENSION: &str = ".txt";

/// Prefix of main log files.
pub const LOG_FILE_PREFIX: &str = "log_";

/// Prefix of keyword-filtered log files.
pub const FILTER_FILE_PREFIX: &str = "filter_";

/// Default size cap of a single file (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// The file a stream is currently appending to.
struct CurrentFile {
    path: PathBuf,
    date: String,
    index: u32,
    writer: Option<File>,
}

/// Owns the current file of one logical stream and decides when to rotate.
///
/// Not internally synchronized; callers wrap it in a lock.
pub struct LogFileManager {
    dir: PathBuf,
    prefix: &'static str,
    max_file_size: Arc<AtomicU64>,
    clock: Arc<dyn Clock>,
    active: ActiveFiles,
    current: Option<CurrentFile>,
    /// Sequence number the next persisted line will carry.
    next_seq: u64,
}

impl LogFileManager {
    /// Creates a manager for `<dir>/<prefix><date>_<index>.txt`.
    ///
    /// Nothing is touched on disk until the first append.
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: &'static str,
        max_file_size: Arc<AtomicU64>,
        clock: Arc<dyn Clock>,
        active: ActiveFiles,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix,
            max_file_size,
            clock,
            active,
            current: None,
            next_seq: 1,
        }
    }

    /// Returns the directory this stream writes into.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Returns the path of the current file, if one has been resolved.
    #[must_use]
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|c| c.path.as_path())
    }

    /// Returns the index of the current file, if one has been resolved.
    #[must_use]
    pub fn current_index(&self) -> Option<u32> {
        self.current.as_ref().map(|c| c.index)
    }

    /// Points the stream at a new directory.
    ///
    /// The current file is closed; the next append resolves a file in `dir`.
    pub fn set_directory(&mut self, dir: impl Into<PathBuf>) {
        self.close();
        self.dir = dir.into();
    }

    /// Returns the sequence number the next persisted line will carry.
    ///
    /// Resolves a current file (recovering its tail) if none is known yet,
    /// but performs no rotation and creates nothing on disk.
    pub fn peek_sequence(&mut self) -> u64 {
        if self.current.is_none() {
            self.resolve();
        }
        self.next_seq
    }

    /// Re-validates the current file and returns the sequence number of the
    /// next line.
    ///
    /// Rotates when the day changed, the file reached the size cap, or the
    /// file disappeared from disk.
    pub fn prepare(&mut self) -> u64 {
        if let Some(reason) = self.rotation_reason() {
            debug!(dir = %self.dir.display(), prefix = self.prefix, reason, "rotating log file");
            self.resolve();
        }
        self.next_seq
    }

    /// Appends `line` plus a terminator and flushes.
    ///
    /// On failure the handle is recreated once and the write retried. Returns
    /// false if the line was dropped.
    pub fn write_line(&mut self, line: &str) -> bool {
        if self.current.is_none() {
            self.resolve();
        }

        let first = match self.try_write(line) {
            Ok(()) => {
                self.next_seq += 1;
                return true;
            }
            Err(e) => e,
        };

        warn!(
            path = ?self.current_path(),
            error = %first,
            "log write failed, recreating file handle"
        );
        if let Some(current) = self.current.as_mut() {
            current.writer = None;
        }

        match self.try_write(line) {
            Ok(()) => {
                self.next_seq += 1;
                true
            }
            Err(e) => {
                error!(path = ?self.current_path(), error = %e, "log write failed twice, entry dropped");
                false
            }
        }
    }

    /// Closes the current file and forgets it.
    pub fn close(&mut self) {
        if let Some(current) = self.current.take() {
            self.active.unregister(&current.path);
        }
    }

    fn rotation_reason(&self) -> Option<&'static str> {
        let Some(current) = &self.current else {
            return Some("no current file");
        };
        if current.date != self.clock.today() {
            return Some("date changed");
        }
        match fs::metadata(&current.path) {
            // Not yet created: the first write will create it.
            Err(_) if current.writer.is_none() => None,
            Err(_) => Some("file missing"),
            Ok(meta) if meta.len() >= self.max_file_size.load(Ordering::Relaxed) => {
                Some("size cap reached")
            }
            Ok(_) => None,
        }
    }

    /// Picks today's file: the highest index if it is below the size cap,
    /// otherwise the next index.
    fn resolve(&mut self) {
        self.close();

        let today = self.clock.today();
        let max = self.max_file_size.load(Ordering::Relaxed);
        let existing = list_dated_files(&self.dir, self.prefix, &today);

        let (index, recovered) = match existing.last() {
            Some((index, path)) => {
                let len = fs::metadata(path).map(|m| m.len()).unwrap_or(0);
                let recovered = sequence::next_sequence(path);
                if len < max {
                    (*index, recovered)
                } else {
                    (index + 1, recovered)
                }
            }
            None => (1, 1),
        };

        let path = self.dir.join(file_name(self.prefix, &today, index));
        self.next_seq = self.next_seq.max(recovered);
        debug!(path = %path.display(), next_seq = self.next_seq, "resolved current log file");

        self.active.register(&path);
        self.current = Some(CurrentFile {
            path,
            date: today,
            index,
            writer: None,
        });
    }

    fn try_write(&mut self, line: &str) -> std::io::Result<()> {
        let Some(current) = self.current.as_mut() else {
            return Err(std::io::Error::other("no current log file"));
        };

        if current.writer.is_none() {
            if let Some(parent) = current.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut file = OpenOptions::new()
                .create(true)
                .read(true)
                .append(true)
                .open(&current.path)?;
            // A crash can leave a torn last line; never glue onto it.
            if ends_mid_line(&mut file)? {
                file.write_all(b"\n")?;
            }
            current.writer = Some(file);
        }

        // Unbuffered, one write per line: a failed attempt leaves nothing
        // behind to be replayed when the handle is dropped.
        if let Some(writer) = current.writer.as_mut() {
            let mut record = String::with_capacity(line.len() + 1);
            record.push_str(line);
            record.push('\n');
            writer.write_all(record.as_bytes())?;
        }
        Ok(())
    }
}

impl Drop for LogFileManager {
    fn drop(&mut self) {
        self.close();
    }
}

/// True if `file` is non-empty and does not end with a line terminator.
fn ends_mid_line(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// Builds `<prefix><date>_<index>.txt`.
#[must_use]
pub fn file_name(prefix: &str, date: &str, index: u32) -> String {
    format!("{prefix}{date}_{index}{LOG_FILE_EXTENSION}")
}

/// Extracts the index from `<prefix><date>_<index>.txt`.
///
/// Unparsable names count as index 1.
#[must_use]
pub fn parse_index(name: &str) -> u32 {
    name.strip_suffix(LOG_FILE_EXTENSION)
        .and_then(|stem| stem.rsplit('_').next())
        .and_then(|index| index.parse().ok())
        .unwrap_or(1)
}

/// Lists `(index, path)` of files for `date`, ordered by index.
fn list_dated_files(dir: &Path, prefix: &str, date: &str) -> Vec<(u32, PathBuf)> {
    let day_prefix = format!("{prefix}{date}_");
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<(u32, PathBuf)> = entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            (name.starts_with(&day_prefix) && name.ends_with(LOG_FILE_EXTENSION))
                .then(|| (parse_index(&name), e.path()))
        })
        .collect();
    files.sort_by_key(|(index, _)| *index);
    files
}

/// Lists the names of all files in `dir` matching `<prefix>*.txt`, sorted.
#[must_use]
pub fn list_log_files(dir: &Path, prefix: &str) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(prefix) && name.ends_with(LOG_FILE_EXTENSION))
        .collect();
    names.sort();
    names
}
