//! Restore coordination: one synchronization task per record.
//!
//! In parallel mode every record gets its own tokio task, started
//! [`RestoreOptions::stagger`] apart. Results travel back over an unbounded
//! channel, all tasks are awaited, and failures are aggregated into a single
//! [`GdmError::RestoreFailed`] sorted by import path. Nothing is cancelled
//! when one dependency fails: the others still converge.
//!
//! Serial mode walks the records in manifest order and stops at the first
//! failure, returning that error as is.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::{SyncOutcome, Synchronizer};
use crate::constants::DEFAULT_STAGGER;
use crate::core::{GdmError, SyncFailure};
use crate::manifest::DependencyRecord;
use crate::vcs::VcsDriver;

/// How a restore is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Run one task per record instead of walking them in order
    pub parallel: bool,
    /// Delay between two task starts in parallel mode
    pub stagger: Duration,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            stagger: DEFAULT_STAGGER,
        }
    }
}

/// Progress notification emitted while restoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreProgress {
    /// Synchronization of a record began
    Started {
        /// Package location of the record
        import_path: String,
    },
    /// Synchronization of a record ended
    Finished {
        /// Package location of the record
        import_path: String,
        /// Outcome, or the rendered error
        outcome: std::result::Result<SyncOutcome, String>,
        /// Records finished so far, this one included
        completed: usize,
        /// Records in this restore
        total: usize,
    },
}

/// Successful outcome of a restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Per-record outcome; manifest order when serial, sorted when parallel
    pub outcomes: Vec<(String, SyncOutcome)>,
}

impl RestoreReport {
    /// Number of records that needed no work.
    pub fn unchanged(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == SyncOutcome::AlreadyPresent).count()
    }
}

/// Runs a [`Synchronizer`] over a list of records.
pub struct RestoreCoordinator<D> {
    synchronizer: Arc<Synchronizer<D>>,
    progress: Option<mpsc::UnboundedSender<RestoreProgress>>,
}

impl<D: VcsDriver> RestoreCoordinator<D> {
    /// Creates a coordinator around `synchronizer`.
    pub fn new(synchronizer: Synchronizer<D>) -> Self {
        Self {
            synchronizer: Arc::new(synchronizer),
            progress: None,
        }
    }

    /// Sends [`RestoreProgress`] notifications to `sender`.
    pub fn with_progress(mut self, sender: mpsc::UnboundedSender<RestoreProgress>) -> Self {
        self.progress = Some(sender);
        self
    }

    /// The wrapped synchronizer.
    pub fn synchronizer(&self) -> &Synchronizer<D> {
        &self.synchronizer
    }

    /// Restores every record.
    ///
    /// # Errors
    ///
    /// Serial mode returns the first failure. Parallel mode returns
    /// [`GdmError::RestoreFailed`] listing every failed record once all tasks
    /// have finished.
    pub async fn restore_all(
        &self,
        records: Vec<DependencyRecord>,
        options: RestoreOptions,
    ) -> Result<RestoreReport> {
        tracing::info!(
            target: "sync",
            "Restoring {} dependencies ({})",
            records.len(),
            if options.parallel { "parallel" } else { "serial" }
        );
        if options.parallel {
            self.restore_parallel(records, options.stagger).await
        } else {
            self.restore_serial(records).await
        }
    }

    async fn restore_serial(&self, records: Vec<DependencyRecord>) -> Result<RestoreReport> {
        let total = records.len();
        let mut report = RestoreReport::default();

        for (index, record) in records.iter().enumerate() {
            notify(&self.progress, RestoreProgress::Started {
                import_path: record.import_path.clone(),
            });
            let result = self.synchronizer.synchronize(record).await;
            notify(&self.progress, RestoreProgress::Finished {
                import_path: record.import_path.clone(),
                outcome: render(&result),
                completed: index + 1,
                total,
            });
            report.outcomes.push((record.import_path.clone(), result?));
        }

        Ok(report)
    }

    async fn restore_parallel(
        &self,
        records: Vec<DependencyRecord>,
        stagger: Duration,
    ) -> Result<RestoreReport> {
        let total = records.len();
        let expected: Vec<String> = records.iter().map(|r| r.import_path.clone()).collect();
        let completed = Arc::new(AtomicUsize::new(0));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut tasks = JoinSet::new();

        for (index, record) in records.into_iter().enumerate() {
            if index > 0 && !stagger.is_zero() {
                tokio::time::sleep(stagger).await;
            }
            let synchronizer = Arc::clone(&self.synchronizer);
            let progress = self.progress.clone();
            let completed = Arc::clone(&completed);
            let tx = tx.clone();

            tasks.spawn(async move {
                notify(&progress, RestoreProgress::Started {
                    import_path: record.import_path.clone(),
                });
                let result = synchronizer.synchronize(&record).await;
                notify(&progress, RestoreProgress::Finished {
                    import_path: record.import_path.clone(),
                    outcome: render(&result),
                    completed: completed.fetch_add(1, Ordering::SeqCst) + 1,
                    total,
                });
                let _ = tx.send((record.import_path, result));
            });
        }
        drop(tx);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(target: "sync", "Restore task did not complete: {}", e);
            }
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut reported = HashSet::with_capacity(total);
        while let Some((import_path, result)) = rx.recv().await {
            reported.insert(import_path.clone());
            match result {
                Ok(outcome) => outcomes.push((import_path, outcome)),
                Err(e) => failures.push(SyncFailure {
                    import_path,
                    reason: format!("{e:#}"),
                }),
            }
        }
        for import_path in expected {
            if !reported.contains(&import_path) {
                failures.push(SyncFailure {
                    import_path,
                    reason: "synchronization task panicked".to_string(),
                });
            }
        }

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.import_path.cmp(&b.import_path));
            return Err(GdmError::RestoreFailed {
                failures,
            }
            .into());
        }

        outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(RestoreReport {
            outcomes,
        })
    }
}

fn notify(progress: &Option<mpsc::UnboundedSender<RestoreProgress>>, event: RestoreProgress) {
    if let Some(tx) = progress {
        let _ = tx.send(event);
    }
}

fn render(result: &Result<SyncOutcome>) -> std::result::Result<SyncOutcome, String> {
    match result {
        Ok(outcome) => Ok(*outcome),
        Err(e) => Err(format!("{e:#}")),
    }
}
