//! Revision synchronization engine.
//!
//! [`Synchronizer`] brings one checkout to the revision pinned by a
//! [`DependencyRecord`]. The checkout lives at `<workspace>/src/<root>`.
//!
//! # State machine
//!
//! ```text
//!   Absent ──create (at revision, or create + checkout)──► Synced (Created)
//!      │ failure: Failed, not retried
//!
//!   CheckedOutAtOther ──checkout──► Synced (AlreadyPresent)
//!      │ checkout failed
//!      ▼
//!   sync default branch (failure only logged)
//!      ▼
//!   download remote history ── failure ──► Failed
//!      ▼
//!   checkout once more ── failure ──► Failed
//!      ▼
//!   Synced (Fetched)
//! ```
//!
//! The local checkout is always attempted first, so a workspace that already
//! holds the pinned history never touches the network. Synchronizing an
//! already-correct checkout is a cheap no-op, which makes an interrupted
//! restore safe to re-run.

pub mod coordinator;

pub use coordinator::{RestoreCoordinator, RestoreOptions, RestoreProgress, RestoreReport};

use anyhow::Result;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::GdmError;
use crate::manifest::DependencyRecord;
use crate::vcs::VcsDriver;

/// On-disk state of a checkout before synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Nothing exists at the checkout path
    Absent,
    /// A directory exists; its revision may differ from the pin
    CheckedOutAtOther,
    /// Something that is not a directory occupies the checkout path
    Blocked,
}

/// How a successful synchronization reached the pinned revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fresh checkout created
    Created,
    /// Pinned revision was already in local history
    AlreadyPresent,
    /// Remote history had to be downloaded
    Fetched,
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Created => "created",
            Self::AlreadyPresent => "up to date",
            Self::Fetched => "fetched",
        };
        f.write_str(text)
    }
}

/// Drives a [`VcsDriver`] to reconcile checkouts with pinned revisions.
#[derive(Debug)]
pub struct Synchronizer<D> {
    driver: Arc<D>,
    workspace: PathBuf,
}

impl<D: VcsDriver> Synchronizer<D> {
    /// Creates a synchronizer for the `GOPATH` entry `workspace`.
    pub fn new(driver: Arc<D>, workspace: impl Into<PathBuf>) -> Self {
        Self {
            driver,
            workspace: workspace.into(),
        }
    }

    /// The VCS driver.
    pub const fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    /// Checkout directory of a record: `<workspace>/src/<root>`.
    pub fn checkout_dir(&self, record: &DependencyRecord) -> PathBuf {
        self.workspace.join("src").join(&record.repo.root)
    }

    /// Inspects the checkout path of `record`.
    pub fn state(&self, record: &DependencyRecord) -> CheckoutState {
        classify(&self.checkout_dir(record))
    }

    /// Brings the checkout of `record` to its pinned revision.
    ///
    /// # Errors
    ///
    /// Returns [`GdmError::SyncFailed`] carrying the failing command's error,
    /// or [`GdmError::VcsNotFound`] when the tool is not installed.
    pub async fn synchronize(&self, record: &DependencyRecord) -> Result<SyncOutcome> {
        let dir = self.checkout_dir(record);
        let kind = record.repo.kind;
        let rev = record.revision.as_str();

        match classify(&dir) {
            CheckoutState::Blocked => Err(failed(record, &dir, "path exists but is not a directory")),

            CheckoutState::Absent => {
                tracing::debug!(target: "sync", "{}: creating checkout at {}", record.import_path, dir.display());
                if let Some(parent) = dir.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| failed(record, &dir, e))?;
                }
                let created = if kind.supports_create_at_revision() {
                    self.driver.create(&record.repo, &dir, Some(rev)).await
                } else {
                    match self.driver.create(&record.repo, &dir, None).await {
                        Ok(()) => self.driver.checkout_revision(kind, &dir, rev).await,
                        Err(e) => Err(e),
                    }
                };
                created.map_err(|e| wrap(record, &dir, e))?;
                Ok(SyncOutcome::Created)
            }

            CheckoutState::CheckedOutAtOther => {
                match self.driver.checkout_revision(kind, &dir, rev).await {
                    Ok(()) => {
                        tracing::debug!(target: "sync", "{}: {} found locally", record.import_path, rev);
                        return Ok(SyncOutcome::AlreadyPresent);
                    }
                    Err(e) => {
                        tracing::debug!(
                            target: "sync",
                            "{}: local checkout of {} failed ({:#}), fetching",
                            record.import_path,
                            rev,
                            e
                        );
                    }
                }

                if let Err(e) = self.driver.sync_default(kind, &dir).await {
                    tracing::warn!(
                        target: "sync",
                        "{}: could not sync default branch: {:#}",
                        record.import_path,
                        e
                    );
                }

                self.driver.download(kind, &dir).await.map_err(|e| wrap(record, &dir, e))?;
                self.driver
                    .checkout_revision(kind, &dir, rev)
                    .await
                    .map_err(|e| wrap(record, &dir, e))?;
                Ok(SyncOutcome::Fetched)
            }
        }
    }

    /// Whether the checkout of `record` currently sits at its pinned revision.
    ///
    /// A missing checkout is reported as `false` rather than an error.
    pub async fn verify(&self, record: &DependencyRecord) -> Result<bool> {
        let dir = self.checkout_dir(record);
        if classify(&dir) != CheckoutState::CheckedOutAtOther {
            return Ok(false);
        }
        let current = self.driver.current_revision(record.repo.kind, &dir).await?;
        Ok(revision_matches(&current, &record.revision))
    }
}

/// Compares a reported revision with a pin. Mercurial reports abbreviated
/// hashes, so either side may be a prefix of the other.
pub fn revision_matches(current: &str, pinned: &str) -> bool {
    let current = current.trim().trim_end_matches('+');
    !current.is_empty() && (current == pinned || pinned.starts_with(current) || current.starts_with(pinned))
}

fn classify(dir: &Path) -> CheckoutState {
    match std::fs::symlink_metadata(dir) {
        Err(_) => CheckoutState::Absent,
        Ok(_) if dir.is_dir() => CheckoutState::CheckedOutAtOther,
        Ok(_) => CheckoutState::Blocked,
    }
}

fn failed(record: &DependencyRecord, dir: &Path, reason: impl fmt::Display) -> anyhow::Error {
    GdmError::SyncFailed {
        import_path: record.import_path.clone(),
        dir: dir.display().to_string(),
        reason: reason.to_string(),
    }
    .into()
}

/// Wraps a driver error, letting a missing tool surface as itself.
fn wrap(record: &DependencyRecord, dir: &Path, error: anyhow::Error) -> anyhow::Error {
    if matches!(error.downcast_ref::<GdmError>(), Some(GdmError::VcsNotFound { .. })) {
        return error;
    }
    failed(record, dir, format!("{error:#}"))
}
