//! Dependency record store: manifest text and crawl results to records.

use anyhow::{Context, Result};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::GoEnv;
use crate::core::GdmError;
use crate::crawler::Package;
use crate::utils::fs::safe_write;
use crate::vcs::{RepoRoot, RepoRootResolver, VcsDriver};

use super::{DependencyRecord, parse_manifest_named, serialize};

/// Builds [`DependencyRecord`]s, deduplicated by repository root.
///
/// # Examples
///
/// ```rust,no_run
/// use gdm_cli::manifest::DependencyStore;
/// use gdm_cli::vcs::{RepoRootResolver, SystemVcs};
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let store = DependencyStore::new(RepoRootResolver::new(), Arc::new(SystemVcs::new()));
/// let records = store.load_file(Path::new("Godeps")).await?;
/// println!("{} pinned repositories", records.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DependencyStore<D> {
    resolver: RepoRootResolver,
    driver: Arc<D>,
}

impl<D: VcsDriver> DependencyStore<D> {
    /// Creates a store resolving roots with `resolver` and reading revisions
    /// through `driver`.
    pub const fn new(resolver: RepoRootResolver, driver: Arc<D>) -> Self {
        Self {
            resolver,
            driver,
        }
    }

    /// The repository-root resolver.
    pub const fn resolver(&self) -> &RepoRootResolver {
        &self.resolver
    }

    /// Parses manifest text and resolves every entry's repository.
    ///
    /// Entries sharing a repository root collapse to the first one, which
    /// keeps its location as written.
    pub async fn load(&self, text: &str) -> Result<Vec<DependencyRecord>> {
        self.load_named(text, "<input>").await
    }

    /// Reads and loads a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`GdmError::ManifestNotFound`] when the file is missing.
    pub async fn load_file(&self, path: &Path) -> Result<Vec<DependencyRecord>> {
        if !path.is_file() {
            return Err(GdmError::ManifestNotFound {
                path: path.display().to_string(),
            }
            .into());
        }
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let name = path.file_name().map_or_else(
            || path.display().to_string(),
            |n| n.to_string_lossy().into_owned(),
        );
        self.load_named(&text, &name).await
    }

    async fn load_named(&self, text: &str, file: &str) -> Result<Vec<DependencyRecord>> {
        let entries = parse_manifest_named(text, file)?;
        let mut records: Vec<DependencyRecord> = Vec::with_capacity(entries.len());

        for entry in entries {
            let repo = self.resolver.resolve(&entry.import_path).await?;
            if let Some(first) = records.iter().find(|r| r.repo.root == repo.root) {
                tracing::debug!(
                    "Ignoring {} (line {}): repository {} already pinned by {}",
                    entry.import_path,
                    entry.line,
                    repo.root,
                    first.import_path
                );
                continue;
            }
            records.push(DependencyRecord {
                import_path: entry.import_path,
                revision: entry.revision,
                repo,
            });
        }

        Ok(records)
    }

    /// Turns crawled packages into records pinned at their current revisions.
    ///
    /// Standard packages, packages outside `GOPATH` and the repository of the
    /// project being saved are ignored. Each record uses the repository root
    /// as its location. Revisions are read concurrently; the output is sorted
    /// by location.
    pub async fn resolve(&self, packages: &[Package], env: &GoEnv) -> Result<Vec<DependencyRecord>> {
        let project = env.project_import_path();
        let project_root = match &project {
            Some(path) => self.resolver.resolve(path).await.ok(),
            None => None,
        };

        let mut roots: BTreeMap<String, (RepoRoot, PathBuf)> = BTreeMap::new();
        for package in packages {
            if package.is_standard || package.import_path.starts_with('_') {
                continue;
            }
            if project.as_deref().is_some_and(|p| within(&package.import_path, p)) {
                continue;
            }
            let repo = self.resolver.resolve(&package.import_path).await?;
            if project_root.as_ref().is_some_and(|p| p.root == repo.root) {
                continue;
            }
            if roots.contains_key(&repo.root) {
                continue;
            }
            let dir = checkout_dir_of(package, &repo).unwrap_or_else(|| env.checkout_dir(&repo.root));
            roots.insert(repo.root.clone(), (repo, dir));
        }

        let reads = roots.into_values().map(|(repo, dir)| {
            let driver = Arc::clone(&self.driver);
            async move {
                let revision = driver.current_revision(repo.kind, &dir).await.with_context(|| {
                    format!("Failed to read the revision of {} at {}", repo.root, dir.display())
                })?;
                tracing::debug!("{} is at {}", repo.root, revision);
                Ok::<_, anyhow::Error>(DependencyRecord {
                    import_path: repo.root.clone(),
                    revision,
                    repo,
                })
            }
        });

        // BTreeMap iteration order keeps the output sorted by location.
        join_all(reads).await.into_iter().collect()
    }

    /// Writes `records` to `path` atomically.
    pub fn save_file(&self, path: &Path, records: &[DependencyRecord]) -> Result<()> {
        safe_write(path, &serialize(records))
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn within(import_path: &str, prefix: &str) -> bool {
    import_path == prefix
        || import_path.strip_prefix(prefix).is_some_and(|rest| rest.starts_with('/'))
}

/// Directory of the repository root, derived from where the crawl found the
/// package: strip the sub-path below the root from the package directory.
fn checkout_dir_of(package: &Package, repo: &RepoRoot) -> Option<PathBuf> {
    if package.dir.as_os_str().is_empty() {
        return None;
    }
    let rest = package.import_path.strip_prefix(&repo.root)?.trim_start_matches('/');
    let depth = if rest.is_empty() { 0 } else { rest.split('/').count() };
    let mut dir = package.dir.clone();
    for _ in 0..depth {
        if !dir.pop() {
            return None;
        }
    }
    dir.ends_with(Path::new(&repo.root)).then_some(dir)
}
