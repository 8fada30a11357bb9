//! Keyword mirroring into a separate filtered log.
//!
//! Messages containing a configured keyword are copied, tagged with that
//! keyword, into `filter_<yyyyMMdd>_<index>.txt` under the filter root. The
//! filtered files form their own logical stream with their own sequence
//! numbers.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::file_manager::{LogFileManager, FILTER_FILE_PREFIX};
use crate::retention::ActiveFiles;
use crate::types::{single_line, Clock};

/// Name of the keyword list under the filter root.
pub const KEYWORD_FILE_NAME: &str = "log_filter.config";

/// Mirrors matching messages into the filtered log.
pub struct KeywordFilter {
    keyword_file: PathBuf,
    keywords: OnceCell<RwLock<Vec<String>>>,
    stream: Mutex<LogFileManager>,
}

impl KeywordFilter {
    /// Creates a filter rooted at `dir`.
    ///
    /// The keyword list is read on first use.
    pub fn new(
        dir: impl Into<PathBuf>,
        max_file_size: Arc<AtomicU64>,
        clock: Arc<dyn Clock>,
        active: ActiveFiles,
    ) -> Self {
        let dir = dir.into();
        Self {
            keyword_file: dir.join(KEYWORD_FILE_NAME),
            keywords: OnceCell::new(),
            stream: Mutex::new(LogFileManager::new(
                dir,
                FILTER_FILE_PREFIX,
                max_file_size,
                clock,
                active,
            )),
        }
    }

    /// Returns the path of the persisted keyword list.
    #[must_use]
    pub fn keyword_file(&self) -> &Path {
        &self.keyword_file
    }

    /// Returns the current keywords in insertion order.
    #[must_use]
    pub fn keywords(&self) -> Vec<String> {
        self.keyword_set().read().clone()
    }

    /// Adds `keyword` and rewrites the keyword file.
    ///
    /// Blank keywords, keywords spanning lines, and duplicates are ignored.
    /// Returns true if the keyword was added.
    pub fn add_keyword(&self, keyword: &str) -> bool {
        if keyword.trim().is_empty() || keyword.contains(['\n', '\r']) {
            debug!(keyword, "ignoring blank or multi-line keyword");
            return false;
        }

        let mut keywords = self.keyword_set().write();
        if keywords.iter().any(|k| k == keyword) {
            return false;
        }
        keywords.push(keyword.to_string());

        let contents: String = keywords.iter().map(|k| format!("{k}\n")).collect();
        if let Err(e) = write_keyword_file(&self.keyword_file, &contents) {
            warn!(path = %self.keyword_file.display(), error = %e, "failed to persist keywords");
        }
        true
    }

    /// Mirrors `message` if it contains a keyword.
    ///
    /// Only the first matching keyword, in insertion order, is recorded.
    /// `main_sequence` is the sequence of the originating main-log entry.
    /// Returns true if a filtered line was written.
    pub fn record_if_matching(&self, main_sequence: u64, message: &str) -> bool {
        let keyword = {
            let keywords = self.keyword_set().read();
            if keywords.is_empty() {
                return false;
            }
            match keywords.iter().find(|k| message.contains(k.as_str())) {
                Some(keyword) => keyword.clone(),
                None => return false,
            }
        };

        let mut stream = self.stream.lock();
        let seq = stream.prepare();
        debug!(main_sequence, filter_sequence = seq, keyword = %keyword, "mirroring filtered entry");
        stream.write_line(&format!(
            "<{seq}> [{}] {}",
            single_line(&keyword),
            single_line(message)
        ))
    }

    /// Returns the directory filtered files are written to.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.stream.lock().directory().to_path_buf()
    }

    /// Closes the current filtered file.
    pub fn close(&self) {
        self.stream.lock().close();
    }

    fn keyword_set(&self) -> &RwLock<Vec<String>> {
        self.keywords
            .get_or_init(|| RwLock::new(load_keywords(&self.keyword_file)))
    }
}

/// Reads the keyword list, keeping only the text before a `+` on each line.
fn load_keywords(path: &Path) -> Vec<String> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot read keyword file");
            return Vec::new();
        }
    };

    let mut keywords: Vec<String> = Vec::new();
    for line in contents.lines().filter(|l| !l.is_empty()) {
        let keyword = line.split('+').next().unwrap_or(line);
        if !keyword.is_empty() && !keywords.iter().any(|k| k == keyword) {
            keywords.push(keyword.to_string());
        }
    }
    debug!(path = %path.display(), count = keywords.len(), "loaded keywords");
    keywords
}

fn write_keyword_file(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}
