//! Periodic retention sweeps on a dedicated worker.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::{LogError, Result};
use crate::retention::{RetentionManager, SweepReport};

/// Default time between sweeps.
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(60 * 60);

struct Running {
    root: PathBuf,
    cancel: CancellationToken,
    worker: thread::JoinHandle<()>,
}

/// Runs [`RetentionManager::sweep`] immediately and then every period.
///
/// Sweeps run on their own thread, independent of the log writer.
pub struct RetentionScheduler {
    manager: RetentionManager,
    running: Mutex<Option<Running>>,
    runs: Arc<AtomicU64>,
}

impl RetentionScheduler {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(manager: RetentionManager) -> Self {
        Self {
            manager,
            running: Mutex::new(None),
            runs: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Starts sweeping `root` now and every `period` after that.
    ///
    /// A no-op if already running.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidConfig`] for a zero `period`, or an error if
    /// the worker thread cannot be spawned.
    pub fn start(&self, root: impl Into<PathBuf>, period: Duration) -> Result<()> {
        validate_period(period)?;
        let mut running = self.running.lock();
        if running.as_ref().is_some_and(|r| !r.worker.is_finished()) {
            debug!("retention scheduler already running");
            return Ok(());
        }

        let root = root.into();
        let cancel = CancellationToken::new();
        let worker = {
            let root = root.clone();
            let cancel = cancel.clone();
            let manager = self.manager.clone();
            let runs = Arc::clone(&self.runs);
            thread::Builder::new()
                .name("logtools-retention".to_string())
                .spawn(move || run_loop(&manager, &root, period, &cancel, &runs))?
        };

        info!(root = %root.display(), ?period, "retention scheduler started");
        *running = Some(Running {
            root,
            cancel,
            worker,
        });
        Ok(())
    }

    /// Cancels future sweeps.
    ///
    /// A sweep already in progress runs to completion.
    pub fn stop(&self) {
        if let Some(running) = self.running.lock().take() {
            running.cancel.cancel();
            info!(root = %running.root.display(), "retention scheduler stopped");
        }
    }

    /// Returns true while the worker is alive and not cancelled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|r| !r.cancel.is_cancelled() && !r.worker.is_finished())
    }

    /// Returns the root being swept, if running.
    #[must_use]
    pub fn root(&self) -> Option<PathBuf> {
        self.running.lock().as_ref().map(|r| r.root.clone())
    }

    /// Returns how many scheduled sweeps have completed.
    #[must_use]
    pub fn run_count(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    /// Runs one sweep on the calling thread.
    pub fn sweep_now(&self, root: &Path) -> SweepReport {
        self.manager.sweep(root)
    }
}

impl Drop for RetentionScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Rejects a sweep period the timer cannot tick at.
///
/// # Errors
///
/// Returns [`LogError::InvalidConfig`] if `period` is zero.
pub fn validate_period(period: Duration) -> Result<()> {
    if period.is_zero() {
        return Err(LogError::InvalidConfig("sweep period must be > 0".into()));
    }
    Ok(())
}

fn run_loop(
    manager: &RetentionManager,
    root: &Path,
    period: Duration,
    cancel: &CancellationToken,
    runs: &AtomicU64,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "cannot build retention runtime, sweeps disabled");
            return;
        }
    };

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    manager.sweep(root);
                    runs.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    });
    debug!(root = %root.display(), "retention worker exited");
}
