//! In-memory [`VcsDriver`] for exercising synchronization without VCS tools.
//!
//! [`RecordingDriver`] models remotes as ordered revision lists and local
//! checkouts as a set of known revisions plus a current one. Every call is
//! appended to an operation log that tests can assert on. Clones share state,
//! so a test can keep one handle while the code under test owns another.

use anyhow::Result;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::core::GdmError;
use crate::vcs::{RepoRoot, VcsDriver, VcsKind};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOp {
    /// Operation name, matching the [`VcsDriver`] method
    pub name: &'static str,
    /// Kind passed to the call
    pub kind: VcsKind,
    /// Checkout directory the call targeted
    pub dir: PathBuf,
    /// Revision argument, when the call takes one
    pub revision: Option<String>,
}

#[derive(Debug, Default)]
struct Checkout {
    remote: Option<String>,
    known: HashSet<String>,
    current: String,
}

#[derive(Debug, Default)]
struct State {
    remotes: HashMap<String, Vec<String>>,
    checkouts: HashMap<PathBuf, Checkout>,
    failing: HashSet<(&'static str, PathBuf)>,
    panicking: HashSet<PathBuf>,
    ops: Vec<RecordedOp>,
}

/// Scriptable, recording VCS driver.
#[derive(Debug, Clone, Default)]
pub struct RecordingDriver {
    state: Arc<Mutex<State>>,
}

impl RecordingDriver {
    /// Creates a driver with no remotes and no checkouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a remote; the last revision is the default-branch head.
    pub fn add_remote(&self, url: &str, revisions: &[&str]) {
        let revisions = revisions.iter().map(|r| (*r).to_string()).collect();
        self.state.lock().unwrap().remotes.insert(url.to_string(), revisions);
    }

    /// Adds a checkout at `dir` that only knows `revision`, and creates the
    /// directory on disk.
    pub fn add_checkout(&self, dir: PathBuf, revision: &str) {
        std::fs::create_dir_all(&dir).unwrap();
        self.state.lock().unwrap().checkouts.insert(
            dir,
            Checkout {
                remote: None,
                known: HashSet::from([revision.to_string()]),
                current: revision.to_string(),
            },
        );
    }

    /// Adds a checkout of `url` currently at `revision`, knowing only the
    /// remote history up to and including it.
    pub fn add_checkout_of(&self, dir: PathBuf, url: &str, revision: &str) {
        std::fs::create_dir_all(&dir).unwrap();
        let mut state = self.state.lock().unwrap();
        let mut known: HashSet<String> = state
            .remotes
            .get(url)
            .map(|revs| revs.iter().take_while(|r| *r != revision).cloned().collect())
            .unwrap_or_default();
        known.insert(revision.to_string());
        state.checkouts.insert(
            dir,
            Checkout {
                remote: Some(url.to_string()),
                known,
                current: revision.to_string(),
            },
        );
    }

    /// Makes operation `name` fail for `dir`.
    pub fn fail_on(&self, name: &'static str, dir: PathBuf) {
        self.state.lock().unwrap().failing.insert((name, dir));
    }

    /// Makes any operation targeting `dir` panic.
    pub fn panic_on(&self, dir: PathBuf) {
        self.state.lock().unwrap().panicking.insert(dir);
    }

    /// All recorded calls in order.
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.state.lock().unwrap().ops.clone()
    }

    /// Names of all recorded calls in order.
    pub fn op_names(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().ops.iter().map(|op| op.name).collect()
    }

    /// Number of recorded calls named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.state.lock().unwrap().ops.iter().filter(|op| op.name == name).count()
    }

    /// Current revision of the checkout at `dir`, if any.
    pub fn current(&self, dir: &Path) -> Option<String> {
        self.state.lock().unwrap().checkouts.get(dir).map(|c| c.current.clone())
    }

    /// Records a call and applies scripted failures.
    fn record(
        &self,
        name: &'static str,
        kind: VcsKind,
        dir: &Path,
        revision: Option<&str>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.ops.push(RecordedOp {
            name,
            kind,
            dir: dir.to_path_buf(),
            revision: revision.map(str::to_string),
        });
        if state.panicking.contains(dir) {
            drop(state);
            panic!("scripted panic in {name} for {}", dir.display());
        }
        if state.failing.contains(&(name, dir.to_path_buf())) {
            return Err(command_failed(kind, name, dir, "scripted failure"));
        }
        Ok(())
    }
}

fn command_failed(kind: VcsKind, operation: &str, dir: &Path, stderr: &str) -> anyhow::Error {
    GdmError::VcsCommandFailed {
        command: kind.command().to_string(),
        operation: operation.to_string(),
        dir: dir.display().to_string(),
        stderr: stderr.to_string(),
    }
    .into()
}

impl VcsDriver for RecordingDriver {
    async fn create(&self, repo: &RepoRoot, dest: &Path, revision: Option<&str>) -> Result<()> {
        tokio::task::yield_now().await;
        self.record("create", repo.kind, dest, revision)?;

        let mut state = self.state.lock().unwrap();
        let Some(revisions) = state.remotes.get(&repo.repo).cloned() else {
            return Err(command_failed(
                repo.kind,
                "create",
                dest,
                &format!("repository '{}' not found", repo.repo),
            ));
        };
        let current = match revision {
            Some(rev) if revisions.iter().any(|r| r == rev) => rev.to_string(),
            Some(rev) => {
                return Err(command_failed(repo.kind, "create", dest, &format!("unknown revision {rev}")));
            }
            None => revisions.last().cloned().unwrap_or_default(),
        };
        std::fs::create_dir_all(dest)?;
        state.checkouts.insert(
            dest.to_path_buf(),
            Checkout {
                remote: Some(repo.repo.clone()),
                known: revisions.into_iter().collect(),
                current,
            },
        );
        Ok(())
    }

    async fn sync_default(&self, kind: VcsKind, dir: &Path) -> Result<()> {
        tokio::task::yield_now().await;
        self.record("sync_default", kind, dir, None)?;

        let mut state = self.state.lock().unwrap();
        let head = state
            .checkouts
            .get(dir)
            .and_then(|c| c.remote.as_ref())
            .and_then(|url| state.remotes.get(url))
            .and_then(|revs| revs.last().cloned());
        let checkout = state
            .checkouts
            .get_mut(dir)
            .ok_or_else(|| command_failed(kind, "sync_default", dir, "not a checkout"))?;
        if let Some(head) = head {
            if checkout.known.contains(&head) {
                checkout.current = head;
            }
        }
        Ok(())
    }

    async fn checkout_revision(&self, kind: VcsKind, dir: &Path, revision: &str) -> Result<()> {
        tokio::task::yield_now().await;
        self.record("checkout_revision", kind, dir, Some(revision))?;

        let mut state = self.state.lock().unwrap();
        let checkout = state
            .checkouts
            .get_mut(dir)
            .ok_or_else(|| command_failed(kind, "checkout_revision", dir, "not a checkout"))?;
        if !checkout.known.contains(revision) {
            return Err(command_failed(
                kind,
                "checkout_revision",
                dir,
                &format!("unknown revision '{revision}'"),
            ));
        }
        checkout.current = revision.to_string();
        Ok(())
    }

    async fn download(&self, kind: VcsKind, dir: &Path) -> Result<()> {
        tokio::task::yield_now().await;
        self.record("download", kind, dir, None)?;

        let mut state = self.state.lock().unwrap();
        let remote = state
            .checkouts
            .get(dir)
            .and_then(|c| c.remote.as_ref())
            .and_then(|url| state.remotes.get(url))
            .cloned()
            .ok_or_else(|| command_failed(kind, "download", dir, "no remote configured"))?;
        if let Some(checkout) = state.checkouts.get_mut(dir) {
            checkout.known.extend(remote);
        }
        Ok(())
    }

    async fn current_revision(&self, kind: VcsKind, dir: &Path) -> Result<String> {
        tokio::task::yield_now().await;
        self.record("current_revision", kind, dir, None)?;

        self.state
            .lock()
            .unwrap()
            .checkouts
            .get(dir)
            .map(|c| c.current.clone())
            .ok_or_else(|| command_failed(kind, "current_revision", dir, "not a checkout"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_makes_remote_revisions_known() {
        let temp = tempfile::TempDir::new().unwrap();
        let dir = temp.path().join("repo");
        let driver = RecordingDriver::new();
        driver.add_remote("https://x", &["a", "b", "c"]);
        driver.add_checkout_of(dir.clone(), "https://x", "b");

        assert!(driver.checkout_revision(VcsKind::Git, &dir, "a").await.is_ok());
        assert!(driver.checkout_revision(VcsKind::Git, &dir, "c").await.is_err());
        driver.download(VcsKind::Git, &dir).await.unwrap();
        driver.checkout_revision(VcsKind::Git, &dir, "c").await.unwrap();
        assert_eq!(driver.current(&dir).as_deref(), Some("c"));
        assert_eq!(driver.count("checkout_revision"), 3);
    }
}
