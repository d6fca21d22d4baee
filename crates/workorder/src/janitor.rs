//! Periodic removal of expired generated files.
//!
//! Every registry row older than the retention window is swept: the file is
//! deleted from the output directory and the row from the registry. A sweep
//! never fails as a whole; per-file problems are logged and counted.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::storage::{is_plain_file_name, Storage};

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Expired files deleted from disk.
    pub files_removed: usize,
    /// Expired rows whose file was already gone.
    pub files_missing: usize,
    /// Registry rows deleted.
    pub rows_removed: usize,
    /// Files or rows that could not be removed.
    pub failures: usize,
}

impl SweepReport {
    /// Whether the sweep touched anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for SweepReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} file(s) removed, {} already missing, {} row(s) removed, {} failure(s)",
            self.files_removed, self.files_missing, self.rows_removed, self.failures
        )
    }
}

/// Remove every registered file at least `max_age` old.
pub fn sweep(storage: &Storage, output_dir: &Path, max_age: Duration) -> SweepReport {
    let mut report = SweepReport::default();

    let expired = match storage.files_older_than(max_age) {
        Ok(files) => files,
        Err(e) => {
            error!(error = %e, "Failed to query expired files");
            report.failures += 1;
            return report;
        }
    };

    for filename in expired {
        if is_plain_file_name(&filename) {
            let path = output_dir.join(&filename);
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    info!("Removed expired file {}", path.display());
                    report.files_removed += 1;
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    warn!("Expired file {} was already gone", path.display());
                    report.files_missing += 1;
                }
                Err(e) => {
                    error!(error = %e, "Failed to remove {}", path.display());
                    report.failures += 1;
                }
            }
        } else {
            warn!(filename = %filename, "Registry row does not name a plain file; dropping row only");
        }

        match storage.delete_file(&filename) {
            Ok(rows) => report.rows_removed += rows,
            Err(e) => {
                error!(error = %e, filename = %filename, "Failed to delete registry row");
                report.failures += 1;
            }
        }
    }

    if report.is_empty() {
        debug!("Sweep found nothing to remove");
    } else {
        info!(%report, "Sweep finished");
    }
    report
}

/// Background task running [`sweep`] on a fixed interval.
#[derive(Debug)]
pub struct Janitor;

impl Janitor {
    /// Spawn the janitor on the current tokio runtime.
    ///
    /// The first sweep runs immediately.
    #[must_use]
    pub fn spawn(
        storage: Arc<Mutex<Storage>>,
        output_dir: PathBuf,
        interval: Duration,
        max_age: Duration,
    ) -> JanitorHandle {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            info!(
                interval_secs = interval.as_secs(),
                max_age_secs = max_age.as_secs(),
                "Janitor started"
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                    _ = ticker.tick() => {
                        let storage = Arc::clone(&storage).lock_owned().await;
                        let dir = output_dir.clone();
                        let pass = tokio::task::spawn_blocking(move || sweep(&storage, &dir, max_age));
                        if let Err(e) = pass.await {
                            error!(error = %e, "Cleanup pass panicked");
                        }
                    }
                }
            }
            info!("Janitor stopped");
        });

        JanitorHandle { stop_tx, task }
    }
}

/// Handle to a running [`Janitor`].
#[derive(Debug)]
pub struct JanitorHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl JanitorHandle {
    /// Check whether the task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task to stop and wait for it.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Janitor task ended abnormally");
        }
    }
}
