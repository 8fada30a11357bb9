//! Key/value settings the logger remembers between runs.
//!
//! Only three keys are used: the log directory, the filter directory, and the
//! per-file size cap.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::Result;

/// Settings key for the main log directory.
pub const KEY_LOG_DIR: &str = "log_dir";

/// Settings key for the filtered log directory.
pub const KEY_FILTER_DIR: &str = "filter_dir";

/// Settings key for the per-file size cap, in bytes.
pub const KEY_MAX_FILE_SIZE: &str = "max_file_size";

/// A persisted string-to-string settings store.
pub trait SettingsStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` under `key`.
    fn put(&self, key: &str, value: &str);

    /// Returns the value under `key` parsed as `u64`.
    fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }

    /// Stores a `u64` under `key`.
    fn put_u64(&self, key: &str, value: u64) {
        self.put(key, &value.to_string());
    }
}

/// Settings held only in memory.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: RwLock<HashMap<String, String>>,
}

impl MemorySettings {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }
}

/// Settings stored as a flat JSON object on disk.
///
/// Loaded once on open and rewritten on every `put`.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl JsonFileSettings {
    /// Opens `path`, starting empty if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => HashMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), count = values.len(), "loaded settings");
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn snapshot(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.read().get(key).cloned()
    }

    fn put(&self, key: &str, value: &str) {
        let mut values = self.values.write();
        values.insert(key.to_string(), value.to_string());
        if let Err(e) = self.snapshot(&values) {
            warn!(path = %self.path.display(), error = %e, "failed to persist settings");
        }
    }
}
