//! The ordered append stream.
//!
//! Every durable append runs on one dedicated thread in submission order, so
//! sequence numbers and on-disk line order always match the order of
//! [`LogWriter::submit`] calls.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{LogError, Result};
use crate::file_manager::LogFileManager;
use crate::keyword_filter::KeywordFilter;
use crate::types::LogEntry;

enum Command {
    Append { entry: LogEntry, persist: bool },
    SetDirectory(PathBuf),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Serializes appends to the main log and forwards entries to the
/// [`KeywordFilter`].
pub struct LogWriter {
    tx: mpsc::UnboundedSender<Command>,
    main: Arc<Mutex<LogFileManager>>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
}

impl LogWriter {
    /// Starts the writer thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn new(main: LogFileManager, filter: Arc<KeywordFilter>) -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let main = Arc::new(Mutex::new(main));

        let worker = {
            let main = Arc::clone(&main);
            thread::Builder::new()
                .name("logtools-writer".to_string())
                .spawn(move || run(rx, &main, &filter))?
        };

        Ok(Self {
            tx,
            main,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Enqueues `entry`; returns as soon as it is queued.
    ///
    /// With `persist` false the entry is only offered to the keyword filter.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after [`LogWriter::shutdown`].
    pub fn submit(&self, entry: LogEntry, persist: bool) -> Result<()> {
        self.tx
            .send(Command::Append { entry, persist })
            .map_err(|_| LogError::WriterClosed)
    }

    /// Blocks until everything submitted before this call is on disk.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`LogWriter::flush_async`] there.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] if the writer has shut down.
    pub fn flush(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(Command::Flush(done))
            .map_err(|_| LogError::WriterClosed)?;
        wait.blocking_recv().map_err(|_| LogError::WriterClosed)
    }

    /// Async form of [`LogWriter::flush`].
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] if the writer has shut down.
    pub async fn flush_async(&self) -> Result<()> {
        let (done, wait) = oneshot::channel();
        self.tx
            .send(Command::Flush(done))
            .map_err(|_| LogError::WriterClosed)?;
        wait.await.map_err(|_| LogError::WriterClosed)
    }

    /// Moves the main log to `dir`.
    ///
    /// Queued like an append: entries submitted earlier still go to the old
    /// directory, later ones resolve a file in `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::WriterClosed`] after [`LogWriter::shutdown`].
    pub fn set_directory(&self, dir: &Path) -> Result<()> {
        self.tx
            .send(Command::SetDirectory(dir.to_path_buf()))
            .map_err(|_| LogError::WriterClosed)
    }

    /// Returns the main log directory.
    #[must_use]
    pub fn directory(&self) -> PathBuf {
        self.main.lock().directory().to_path_buf()
    }

    /// Returns the file the main log is appending to, if resolved.
    #[must_use]
    pub fn current_path(&self) -> Option<PathBuf> {
        self.main.lock().current_path().map(Path::to_path_buf)
    }

    /// Drains the queue and stops the writer thread.
    ///
    /// Later submissions fail with [`LogError::WriterClosed`].
    pub fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(worker) = self.worker.lock().take() {
            if worker.join().is_err() {
                warn!("log writer thread panicked");
            }
        }
    }
}

impl Drop for LogWriter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(
    mut rx: mpsc::UnboundedReceiver<Command>,
    main: &Mutex<LogFileManager>,
    filter: &KeywordFilter,
) {
    while let Some(command) = rx.blocking_recv() {
        match command {
            Command::Append { entry, persist } => append(main, filter, &entry, persist),
            Command::SetDirectory(dir) => {
                debug!(dir = %dir.display(), "main log directory changed");
                main.lock().set_directory(dir);
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
            Command::Shutdown => break,
        }
    }

    rx.close();
    // Entries queued behind the shutdown request are still written.
    while let Ok(command) = rx.try_recv() {
        match command {
            Command::Append { entry, persist } => append(main, filter, &entry, persist),
            Command::SetDirectory(dir) => main.lock().set_directory(dir),
            Command::Flush(_) | Command::Shutdown => {}
        }
    }

    main.lock().close();
    filter.close();
    debug!("log writer exited");
}

fn append(main: &Mutex<LogFileManager>, filter: &KeywordFilter, entry: &LogEntry, persist: bool) {
    let mut main = main.lock();
    let seq = if persist {
        main.prepare()
    } else {
        main.peek_sequence()
    };

    filter.record_if_matching(seq, &entry.message);

    if persist {
        main.write_line(&entry.render(seq));
    }
}
