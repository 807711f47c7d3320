//! Transitive import-graph crawler.
//!
//! The crawler statically discovers which packages a source tree depends on,
//! without compiling or executing anything. It is a worklist walk over an
//! explicit frontier rather than a recursive tree walk, so diamonds are
//! expanded once and import cycles terminate.
//!
//! # Algorithm
//!
//! 1. Expand the roots (`dir/...` means the directory and every descendant,
//!    skipping hidden directories and `vendor`).
//! 2. Each root directory with Go files becomes a visited, internal package;
//!    its imports, test files included, enter the frontier tagged with the
//!    importing directory.
//! 3. Frontier entries are resolved relative to their importing directory.
//!    Imports of the root tree ignore `vendor` directories; imports of
//!    external packages see the vendored copies of their enclosing trees.
//!    Builtins and directories without non-test sources are skipped; any other
//!    resolution failure aborts the crawl. A resolved `(import path, dir)`
//!    already visited is dropped. New external packages are recorded and
//!    their non-test imports pushed; standard packages are recorded with
//!    [`Package::is_standard`] set and not expanded.
//!
//! All mutable state lives in a [`CrawlContext`] owned by one crawl, so
//! separate crawls in the same process never interfere.
//!
//! # Example
//!
//! ```rust,no_run
//! use gdm_cli::config::GoEnv;
//! use gdm_cli::crawler::{Crawler, GopathResolver};
//!
//! # fn example() -> anyhow::Result<()> {
//! let env = GoEnv::from_env()?;
//! let crawler = Crawler::new(GopathResolver::from_env(&env));
//! for package in crawler.crawl(&[env.wd.join("...")])? {
//!     if !package.is_standard {
//!         println!("{} ({})", package.import_path, package.dir.display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod constraint;
pub mod parser;
pub mod resolver;

pub use constraint::BuildTarget;
pub use resolver::{GopathResolver, ImportMode, PackageResolver, ResolveError, ResolvedPackage};

use anyhow::Result;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::constants::VENDOR_DIR;
use crate::core::GdmError;

/// A package discovered by the crawl.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Package {
    /// Resolved import path
    pub import_path: String,
    /// Directory the package resolved to
    pub dir: PathBuf,
    /// Part of the standard library
    pub is_standard: bool,
}

/// An unresolved import waiting in the frontier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PendingImport {
    import: String,
    from_dir: PathBuf,
    mode: ImportMode,
}

/// Mutable state of a single crawl.
#[derive(Debug, Default)]
pub struct CrawlContext {
    frontier: VecDeque<PendingImport>,
    queued: HashSet<PendingImport>,
    visited: HashSet<(String, PathBuf)>,
    found: BTreeSet<Package>,
}

impl CrawlContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the `(import path, dir)` pair has been expanded.
    pub fn is_visited(&self, import_path: &str, dir: &Path) -> bool {
        self.visited.contains(&(import_path.to_string(), dir.to_path_buf()))
    }

    /// Number of expanded packages, internal ones included.
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn push_imports<'a>(
        &mut self,
        imports: impl IntoIterator<Item = &'a String>,
        from_dir: &Path,
        mode: ImportMode,
    ) {
        for import in imports {
            let pending = PendingImport {
                import: import.clone(),
                from_dir: from_dir.to_path_buf(),
                mode,
            };
            if self.queued.insert(pending.clone()) {
                self.frontier.push_back(pending);
            }
        }
    }

    fn mark_visited(&mut self, import_path: &str, dir: &Path) -> bool {
        self.visited.insert((import_path.to_string(), dir.to_path_buf()))
    }
}

/// Import-graph crawler over a [`PackageResolver`].
#[derive(Debug)]
pub struct Crawler<R> {
    resolver: R,
    include_root_tests: bool,
}

impl<R: PackageResolver> Crawler<R> {
    /// Creates a crawler that follows test imports of the root tree.
    pub const fn new(resolver: R) -> Self {
        Self {
            resolver,
            include_root_tests: true,
        }
    }

    /// Whether imports of `_test.go` files in the root tree are followed.
    /// Test files of external packages are never followed.
    pub const fn include_root_tests(mut self, include: bool) -> Self {
        self.include_root_tests = include;
        self
    }

    /// Crawls `roots` with a fresh context.
    ///
    /// The result is sorted by import path and directory.
    pub fn crawl<P: AsRef<Path>>(&self, roots: &[P]) -> Result<Vec<Package>> {
        let mut ctx = CrawlContext::new();
        self.crawl_with(&mut ctx, roots)
    }

    /// Crawls `roots` using a caller-provided context.
    pub fn crawl_with<P: AsRef<Path>>(&self, ctx: &mut CrawlContext, roots: &[P]) -> Result<Vec<Package>> {
        for dir in expand_paths(roots)? {
            match self.resolver.import_dir(&dir) {
                Ok(pkg) => {
                    tracing::debug!(target: "crawler", "Root package {} ({})", pkg.import_path, pkg.dir.display());
                    if ctx.mark_visited(&pkg.import_path, &pkg.dir) {
                        let imports = pkg.scan.all_imports(self.include_root_tests);
                        ctx.push_imports(&imports, &pkg.dir, ImportMode::IgnoreVendor);
                    }
                }
                Err(ResolveError::NoGoFiles(dir)) => {
                    tracing::trace!(target: "crawler", "Skipping {} (no Go files)", dir.display());
                }
                Err(ResolveError::Other(e)) => return Err(e),
                Err(e) => {
                    return Err(GdmError::ImportResolutionFailed {
                        import_path: dir.display().to_string(),
                        dir: dir.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            }
        }

        while let Some(pending) = ctx.frontier.pop_front() {
            let pkg = match self.resolver.resolve(&pending.import, &pending.from_dir, pending.mode) {
                Ok(pkg) => pkg,
                Err(ResolveError::Builtin(name)) => {
                    tracing::debug!(target: "crawler", "Skipping builtin package {}", name);
                    continue;
                }
                Err(ResolveError::NoGoFiles(dir)) => {
                    tracing::debug!(
                        target: "crawler",
                        "Skipping {} imported from {}: no non-test Go files in {}",
                        pending.import,
                        pending.from_dir.display(),
                        dir.display()
                    );
                    continue;
                }
                Err(ResolveError::Other(e)) => return Err(e),
                Err(e) => {
                    return Err(GdmError::ImportResolutionFailed {
                        import_path: pending.import,
                        dir: pending.from_dir.display().to_string(),
                        reason: e.to_string(),
                    }
                    .into());
                }
            };

            if !ctx.mark_visited(&pkg.import_path, &pkg.dir) {
                continue;
            }

            tracing::trace!(target: "crawler", "Found {} in {}", pkg.import_path, pkg.dir.display());
            if !pkg.is_standard {
                ctx.push_imports(&pkg.scan.imports, &pkg.dir, ImportMode::Default);
            }
            ctx.found.insert(Package {
                import_path: pkg.import_path,
                dir: pkg.dir,
                is_standard: pkg.is_standard,
            });
        }

        Ok(ctx.found.iter().cloned().collect())
    }
}

/// Expands crawl roots into package directories.
///
/// A root whose last component is `...` stands for its parent directory and
/// every descendant, in depth-first order sorted by name. Hidden directories
/// and directories named `vendor` are skipped. Duplicates are removed, keeping
/// the first occurrence.
pub fn expand_paths<P: AsRef<Path>>(roots: &[P]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();

    for root in roots {
        let root = root.as_ref();
        let recursive = root.file_name().is_some_and(|name| name == "...");
        if !recursive {
            if seen.insert(root.to_path_buf()) {
                dirs.push(root.to_path_buf());
            }
            continue;
        }

        let base = match root.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let walker = WalkDir::new(&base)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_skipped_dir(entry.file_name()));
        for entry in walker {
            let entry = entry.map_err(|e| GdmError::FileSystemError {
                operation: "walking".to_string(),
                path: e.path().map_or_else(|| base.display().to_string(), |p| p.display().to_string()),
            })?;
            if entry.file_type().is_dir() && seen.insert(entry.path().to_path_buf()) {
                dirs.push(entry.path().to_path_buf());
            }
        }
    }

    Ok(dirs)
}

fn is_skipped_dir(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name == VENDOR_DIR
}
