//! Size and count bounded retention over a directory tree.
//!
//! This module provides:
//! - [`RetentionPolicy`] — Process-wide caps, adjustable at runtime
//! - [`RetentionManager`] — Oldest-first eviction sweep plus empty-dir pruning
//! - [`ActiveFiles`] — Files the writers hold open, never evicted
//! - [`SweepReport`] — What a sweep saw and did

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LogError, Result};

/// Default cap on the total bytes under a root (500 MiB).
pub const DEFAULT_MAX_TOTAL_BYTES: u64 = 500 * 1024 * 1024;

/// Default cap on the number of files under a root.
pub const DEFAULT_MAX_FILE_COUNT: usize = 10_000;

/// Default fraction of the caps a sweep cleans down to.
pub const DEFAULT_TARGET_RATIO: f64 = 0.8;

/// A point-in-time copy of the retention caps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetentionLimits {
    /// Maximum total bytes under the root
    pub max_total_bytes: u64,
    /// Maximum number of files under the root
    pub max_file_count: usize,
    /// Fraction of both caps to clean down to, in (0, 1)
    pub target_ratio: f64,
}

impl Default for RetentionLimits {
    fn default() -> Self {
        Self {
            max_total_bytes: DEFAULT_MAX_TOTAL_BYTES,
            max_file_count: DEFAULT_MAX_FILE_COUNT,
            target_ratio: DEFAULT_TARGET_RATIO,
        }
    }
}

impl RetentionLimits {
    /// Byte total a sweep cleans down to.
    #[must_use]
    pub fn target_bytes(&self) -> u64 {
        (self.max_total_bytes as f64 * self.target_ratio) as u64
    }

    /// File count a sweep cleans down to.
    #[must_use]
    pub fn target_count(&self) -> usize {
        (self.max_file_count as f64 * self.target_ratio) as usize
    }
}

/// Retention caps shared between the facade and the sweep worker.
///
/// Each value is an independent atomic: a sweep may observe a mix of old and
/// new values for one cycle, never a torn value.
#[derive(Debug)]
pub struct RetentionPolicy {
    max_total_bytes: AtomicU64,
    max_file_count: AtomicUsize,
    target_ratio_bits: AtomicU64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_limits(RetentionLimits::default())
    }
}

impl RetentionPolicy {
    /// Creates a policy from validated limits.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if any limit is out of range.
    pub fn new(limits: RetentionLimits) -> Result<Self> {
        validate_bytes(limits.max_total_bytes)?;
        validate_count(limits.max_file_count)?;
        validate_ratio(limits.target_ratio)?;
        Ok(Self::from_limits(limits))
    }

    fn from_limits(limits: RetentionLimits) -> Self {
        Self {
            max_total_bytes: AtomicU64::new(limits.max_total_bytes),
            max_file_count: AtomicUsize::new(limits.max_file_count),
            target_ratio_bits: AtomicU64::new(limits.target_ratio.to_bits()),
        }
    }

    /// Sets the byte cap.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `bytes` is zero.
    pub fn set_max_total_bytes(&self, bytes: u64) -> Result<()> {
        validate_bytes(bytes)?;
        self.max_total_bytes.store(bytes, Ordering::Relaxed);
        Ok(())
    }

    /// Sets the file-count cap.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] if `count` is zero.
    pub fn set_max_file_count(&self, count: usize) -> Result<()> {
        validate_count(count)?;
        self.max_file_count.store(count, Ordering::Relaxed);
        Ok(())
    }

    /// Sets the clean-down ratio.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] unless `0 < ratio < 1`.
    pub fn set_target_ratio(&self, ratio: f64) -> Result<()> {
        validate_ratio(ratio)?;
        self.target_ratio_bits.store(ratio.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    /// Returns the current caps.
    #[must_use]
    pub fn limits(&self) -> RetentionLimits {
        RetentionLimits {
            max_total_bytes: self.max_total_bytes.load(Ordering::Relaxed),
            max_file_count: self.max_file_count.load(Ordering::Relaxed),
            target_ratio: f64::from_bits(self.target_ratio_bits.load(Ordering::Relaxed)),
        }
    }
}

fn validate_bytes(bytes: u64) -> Result<()> {
    if bytes == 0 {
        return Err(LogError::InvalidConfig("max folder size must be > 0".into()));
    }
    Ok(())
}

fn validate_count(count: usize) -> Result<()> {
    if count == 0 {
        return Err(LogError::InvalidConfig("max file count must be > 0".into()));
    }
    Ok(())
}

fn validate_ratio(ratio: f64) -> Result<()> {
    if !(ratio > 0.0 && ratio < 1.0) {
        return Err(LogError::InvalidConfig(format!(
            "clean target ratio must be in (0, 1), got {ratio}"
        )));
    }
    Ok(())
}

/// Paths the writers currently append to.
///
/// Cloning shares the registry.
#[derive(Debug, Clone, Default)]
pub struct ActiveFiles {
    paths: Arc<RwLock<HashSet<PathBuf>>>,
}

impl ActiveFiles {
    /// Marks `path` as open for append.
    pub fn register(&self, path: &Path) {
        self.paths.write().insert(path.to_path_buf());
    }

    /// Clears the mark on `path`.
    pub fn unregister(&self, path: &Path) {
        self.paths.write().remove(path);
    }

    /// Returns true if `path` is open for append.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.read().contains(path)
    }

    /// Returns true if no file is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}

/// Outcome of one [`RetentionManager::sweep`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Regular files found under the root
    pub scanned_files: usize,
    /// Bytes found under the root
    pub scanned_bytes: u64,
    /// Files deleted
    pub deleted_files: usize,
    /// Bytes freed
    pub deleted_bytes: u64,
    /// Deletes that failed and were skipped
    pub failed_deletes: usize,
    /// Candidates left alone because a writer holds them open
    pub skipped_active: usize,
    /// Empty directories removed
    pub removed_dirs: usize,
}

impl SweepReport {
    /// Returns true if the caps were exceeded and eviction ran.
    #[must_use]
    pub fn cleaned(&self) -> bool {
        self.deleted_files > 0 || self.failed_deletes > 0 || self.skipped_active > 0
    }
}

struct Candidate {
    path: PathBuf,
    size: u64,
    modified: SystemTime,
}

/// Enforces a [`RetentionPolicy`] over a directory tree.
#[derive(Debug, Clone)]
pub struct RetentionManager {
    policy: Arc<RetentionPolicy>,
    active: ActiveFiles,
}

impl RetentionManager {
    /// Creates a manager that reads caps from `policy` and never evicts
    /// files registered in `active`.
    #[must_use]
    pub fn new(policy: Arc<RetentionPolicy>, active: ActiveFiles) -> Self {
        Self { policy, active }
    }

    /// Returns the shared policy.
    #[must_use]
    pub fn policy(&self) -> &Arc<RetentionPolicy> {
        &self.policy
    }

    /// Runs one sweep over `root`.
    ///
    /// When the tree exceeds either cap, deletes files oldest first until
    /// both the byte total and file count are at or below `cap * ratio`,
    /// then removes directories left empty. `root` itself is never removed.
    /// Failures are logged and skipped; this never errors.
    pub fn sweep(&self, root: &Path) -> SweepReport {
        let mut report = SweepReport::default();
        if !root.is_dir() {
            debug!(root = %root.display(), "retention root missing, nothing to sweep");
            return report;
        }

        let limits = self.policy.limits();
        let (mut files, dirs) = scan(root);
        report.scanned_files = files.len();
        report.scanned_bytes = files.iter().map(|f| f.size).sum();

        if report.scanned_bytes <= limits.max_total_bytes
            && report.scanned_files <= limits.max_file_count
        {
            debug!(
                root = %root.display(),
                bytes = report.scanned_bytes,
                files = report.scanned_files,
                "retention caps respected"
            );
            return report;
        }

        files.sort_by_key(|f| f.modified);

        let target_bytes = limits.target_bytes();
        let target_count = limits.target_count();
        let mut cur_bytes = report.scanned_bytes;
        let mut cur_count = report.scanned_files;

        for file in &files {
            if cur_bytes <= target_bytes && cur_count <= target_count {
                break;
            }
            if self.active.contains(&file.path) {
                report.skipped_active += 1;
                continue;
            }

            let size = fs::metadata(&file.path).map_or(file.size, |m| m.len());
            match fs::remove_file(&file.path) {
                Ok(()) => {
                    cur_bytes = cur_bytes.saturating_sub(size);
                    cur_count -= 1;
                    report.deleted_files += 1;
                    report.deleted_bytes += size;
                }
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "retention delete failed");
                    report.failed_deletes += 1;
                }
            }
        }

        report.removed_dirs = prune_empty_dirs(root, &dirs);

        info!(
            root = %root.display(),
            deleted_files = report.deleted_files,
            deleted_bytes = report.deleted_bytes,
            failed = report.failed_deletes,
            removed_dirs = report.removed_dirs,
            remaining_bytes = cur_bytes,
            remaining_files = cur_count,
            "retention sweep finished"
        );
        report
    }
}

/// Walks the tree with an explicit stack.
///
/// Returns every regular file and every directory below `root`, the latter
/// in discovery order (parents before children). Symlinks are not followed.
fn scan(root: &Path) -> (Vec<Candidate>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "cannot list directory");
                continue;
            }
        };

        for entry in entries.filter_map(std::result::Result::ok) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            if file_type.is_dir() {
                let path = entry.path();
                dirs.push(path.clone());
                pending.push(path);
            } else if file_type.is_file() {
                let Ok(meta) = entry.metadata() else {
                    continue;
                };
                files.push(Candidate {
                    path: entry.path(),
                    size: meta.len(),
                    modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                });
            }
        }
    }

    (files, dirs)
}

/// Removes empty directories among `dirs`, children before parents.
fn prune_empty_dirs(root: &Path, dirs: &[PathBuf]) -> usize {
    let mut removed = 0;
    for dir in dirs.iter().rev() {
        if dir == root {
            continue;
        }
        let is_empty = fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_none());
        if !is_empty {
            continue;
        }
        match fs::remove_dir(dir) {
            Ok(()) => removed += 1,
            Err(e) => warn!(dir = %dir.display(), error = %e, "failed to delete empty dir"),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;
    use tempfile::TempDir;
    use test_case::test_case;

    fn write_aged(path: &Path, size: usize, age_secs: u64) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, vec![b'x'; size]).expect("write file");
        let modified = SystemTime::now() - Duration::from_secs(age_secs);
        File::options()
            .write(true)
            .open(path)
            .and_then(|f| f.set_modified(modified))
            .expect("set mtime");
    }

    fn manager(limits: RetentionLimits) -> RetentionManager {
        let policy = RetentionPolicy::new(limits).expect("valid limits");
        RetentionManager::new(Arc::new(policy), ActiveFiles::default())
    }

    fn limits(bytes: u64, count: usize, ratio: f64) -> RetentionLimits {
        RetentionLimits {
            max_total_bytes: bytes,
            max_file_count: count,
            target_ratio: ratio,
        }
    }

    #[test]
    fn policy_defaults() {
        let limits = RetentionPolicy::default().limits();
        assert_eq!(limits.max_total_bytes, 500 * 1024 * 1024);
        assert_eq!(limits.max_file_count, 10_000);
        assert!((limits.target_ratio - 0.8).abs() < f64::EPSILON);
        assert_eq!(limits.target_count(), 8_000);
    }

    #[test_case(0.0 ; "zero")]
    #[test_case(1.0 ; "one")]
    #[test_case(-0.5 ; "negative")]
    #[test_case(1.5 ; "above one")]
    #[test_case(f64::NAN ; "nan")]
    fn policy_rejects_bad_ratio(ratio: f64) {
        let policy = RetentionPolicy::default();
        assert!(policy.set_target_ratio(ratio).is_err());
        assert!((policy.limits().target_ratio - 0.8).abs() < f64::EPSILON);
    }

    #[test]
    fn policy_rejects_zero_caps() {
        let policy = RetentionPolicy::default();
        assert!(policy.set_max_total_bytes(0).is_err());
        assert!(policy.set_max_file_count(0).is_err());
        assert!(RetentionPolicy::new(limits(0, 1, 0.5)).is_err());
    }

    #[test]
    fn policy_setters_apply() {
        let policy = RetentionPolicy::default();
        policy.set_max_total_bytes(1000).expect("bytes");
        policy.set_max_file_count(7).expect("count");
        policy.set_target_ratio(0.5).expect("ratio");
        assert_eq!(policy.limits(), limits(1000, 7, 0.5));
    }

    #[test]
    fn sweep_missing_root_is_noop() {
        let dir = TempDir::new().expect("temp dir");
        let report = manager(RetentionLimits::default()).sweep(&dir.path().join("absent"));
        assert_eq!(report, SweepReport::default());
    }

    #[test]
    fn sweep_under_caps_deletes_nothing() {
        let dir = TempDir::new().expect("temp dir");
        for i in 0..5 {
            write_aged(&dir.path().join(format!("f{i}.txt")), 100, 100 - i);
        }
        fs::create_dir(dir.path().join("empty")).expect("mkdir");

        let report = manager(limits(500, 5, 0.8)).sweep(dir.path());

        assert_eq!(report.scanned_files, 5);
        assert_eq!(report.scanned_bytes, 500);
        assert_eq!(report.deleted_files, 0);
        assert!(!report.cleaned());
        // No pruning when nothing needed cleaning.
        assert!(dir.path().join("empty").exists());
    }

    #[test]
    fn sweep_over_byte_cap_deletes_oldest_first() {
        let dir = TempDir::new().expect("temp dir");
        // t1 is the oldest.
        for i in 1..=5u64 {
            write_aged(&dir.path().join(format!("t{i}.txt")), 300, 1000 - i * 100);
        }

        let report = manager(limits(1000, 10_000, 0.8)).sweep(dir.path());

        assert_eq!(report.deleted_files, 3);
        assert_eq!(report.deleted_bytes, 900);
        for i in 1..=3 {
            assert!(!dir.path().join(format!("t{i}.txt")).exists());
        }
        for i in 4..=5 {
            assert!(dir.path().join(format!("t{i}.txt")).exists());
        }
    }

    #[test]
    fn sweep_over_count_cap_deletes_down_to_ratio() {
        let dir = TempDir::new().expect("temp dir");
        for i in 0..10u64 {
            write_aged(&dir.path().join(format!("c{i}.txt")), 1, 1000 - i * 10);
        }

        let report = manager(limits(1024 * 1024, 5, 0.8)).sweep(dir.path());

        assert_eq!(report.deleted_files, 6);
        let remaining: usize = fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(remaining, 4);
        assert!(dir.path().join("c9.txt").exists());
        assert!(!dir.path().join("c0.txt").exists());
    }

    #[test]
    fn sweep_walks_subdirectories_and_prunes_emptied_ones() {
        let dir = TempDir::new().expect("temp dir");
        write_aged(&dir.path().join("old/deeper/a.txt"), 400, 900);
        write_aged(&dir.path().join("old/b.txt"), 400, 800);
        write_aged(&dir.path().join("new/c.txt"), 400, 10);

        let report = manager(limits(1000, 100, 0.5)).sweep(dir.path());

        assert_eq!(report.deleted_files, 2);
        assert!(!dir.path().join("old").exists());
        assert!(dir.path().join("new/c.txt").exists());
        assert_eq!(report.removed_dirs, 2);
        assert!(dir.path().exists());
    }

    #[test]
    fn sweep_never_removes_root() {
        let dir = TempDir::new().expect("temp dir");
        write_aged(&dir.path().join("only.txt"), 100, 10);

        let report = manager(limits(10, 100, 0.5)).sweep(dir.path());

        assert_eq!(report.deleted_files, 1);
        assert!(dir.path().is_dir());
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
    }

    #[test]
    fn sweep_skips_active_files() {
        let dir = TempDir::new().expect("temp dir");
        let active = ActiveFiles::default();
        let oldest = dir.path().join("active.txt");
        write_aged(&oldest, 300, 900);
        write_aged(&dir.path().join("b.txt"), 300, 500);
        write_aged(&dir.path().join("c.txt"), 300, 100);
        active.register(&oldest);

        let policy = RetentionPolicy::new(limits(800, 100, 0.5)).expect("limits");
        let report = RetentionManager::new(Arc::new(policy), active).sweep(dir.path());

        assert!(oldest.exists());
        assert_eq!(report.skipped_active, 1);
        assert_eq!(report.deleted_files, 2);
        assert!(report.cleaned());
    }

    #[test]
    fn prune_handles_nested_empty_chain() {
        let dir = TempDir::new().expect("temp dir");
        write_aged(&dir.path().join("a/b/c/d/file.txt"), 50, 100);
        write_aged(&dir.path().join("keep.txt"), 10, 1);

        let report = manager(limits(40, 100, 0.5)).sweep(dir.path());

        assert_eq!(report.deleted_files, 1);
        assert_eq!(report.removed_dirs, 4);
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().join("keep.txt").exists());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(24))]

            #[test]
            fn sweep_deletes_minimal_oldest_prefix(
                sizes in prop::collection::vec(1usize..200, 1..16),
                cap in 50u64..1500,
            ) {
                let dir = TempDir::new().expect("temp dir");
                let count = sizes.len() as u64;
                for (i, size) in sizes.iter().enumerate() {
                    let age = (count - i as u64) * 60;
                    write_aged(&dir.path().join(format!("f{i:02}.txt")), *size, age);
                }

                let limits = limits(cap, 10_000, 0.8);
                let report = manager(limits).sweep(dir.path());

                let total: u64 = sizes.iter().map(|s| *s as u64).sum();
                if total <= cap {
                    prop_assert_eq!(report.deleted_files, 0);
                } else {
                    // Exactly the shortest oldest-first prefix that reaches the target.
                    let target = limits.target_bytes();
                    let mut remaining = total;
                    let mut expected = 0;
                    for size in &sizes {
                        if remaining <= target {
                            break;
                        }
                        remaining -= *size as u64;
                        expected += 1;
                    }
                    prop_assert_eq!(report.deleted_files, expected);
                    for i in 0..sizes.len() {
                        let exists = dir.path().join(format!("f{i:02}.txt")).exists();
                        prop_assert_eq!(exists, i >= expected);
                    }
                }
            }
        }
    }
}
