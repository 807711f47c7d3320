//! Package location resolution for a `GOPATH` workspace.
//!
//! [`PackageResolver`] is the seam between the crawler and the Go toolchain
//! conventions. [`GopathResolver`] implements the classic `GOPATH` rules:
//!
//! | Import | Directory |
//! |---|---|
//! | `C` | none (cgo pseudo-package) |
//! | `./x`, `../x` | relative to the importing directory |
//! | `fmt`, `net/http` (no dot in first element) | `$GOROOT/src/<path>`, then `GOPATH` |
//! | `github.com/x/y` | first `$GOPATH/src/<path>` that exists |
//!
//! Unless [`ImportMode::IgnoreVendor`] is given, a non-local import is first
//! looked up in the `vendor` directories of the importing directory and its
//! ancestors inside a `GOPATH` `src` tree, innermost first. A vendored package
//! keeps its full import path, e.g. `github.com/x/dep/vendor/github.com/y/z`.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::config::GoEnv;
use crate::config::go_env::import_path_under;
use crate::constants::VENDOR_DIR;

use super::constraint::BuildTarget;
use super::parser::{DirScan, scan_dir};

/// Whether `vendor` directories take part in a lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ImportMode {
    /// Search enclosing `vendor` directories before `GOROOT` and `GOPATH`
    #[default]
    Default,
    /// Skip `vendor` directories
    IgnoreVendor,
}

/// A package directory with its parsed imports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    /// Canonical import path
    pub import_path: String,
    /// Absolute directory (empty for a standard package without a known `GOROOT`)
    pub dir: PathBuf,
    /// Part of the standard library
    pub is_standard: bool,
    /// Imports of the package files
    pub scan: DirScan,
}

/// Why an import did not produce a package.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The import names a pseudo-package that has no directory
    #[error("\"{0}\" is a builtin pseudo-package")]
    Builtin(String),

    /// The directory exists but holds no buildable source files
    #[error("no buildable Go source files in {}", .0.display())]
    NoGoFiles(PathBuf),

    /// No directory matches the import
    #[error("cannot find package \"{import_path}\" in any of:\n{searched}")]
    NotFound {
        /// The raw import
        import_path: String,
        /// Searched directories, one per line
        searched: String,
    },

    /// Reading or parsing the package failed
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Maps import strings and directories to packages.
pub trait PackageResolver {
    /// Resolves `import`, using `from_dir` (the importing directory) as
    /// search context.
    fn resolve(&self, import: &str, from_dir: &Path, mode: ImportMode) -> Result<ResolvedPackage, ResolveError>;

    /// Reads the package in `dir`, which is part of the tree being crawled.
    ///
    /// Fails with [`ResolveError::NoGoFiles`] only when the directory holds no
    /// Go file at all, test files included.
    fn import_dir(&self, dir: &Path) -> Result<ResolvedPackage, ResolveError>;
}

/// [`PackageResolver`] following `GOPATH` and `GOROOT` layout rules.
#[derive(Debug, Clone)]
pub struct GopathResolver {
    gopath: Vec<PathBuf>,
    goroot: Option<PathBuf>,
    target: BuildTarget,
}

impl GopathResolver {
    /// Creates a resolver searching the given entries, selecting files for
    /// the host platform.
    pub fn new(gopath: Vec<PathBuf>, goroot: Option<PathBuf>) -> Self {
        Self {
            gopath,
            goroot,
            target: BuildTarget::host(),
        }
    }

    /// Creates a resolver for a discovered Go environment.
    pub fn from_env(env: &GoEnv) -> Self {
        Self::new(env.gopath.clone(), env.goroot.clone()).with_target(env.target.clone())
    }

    /// Selects source files for `target` instead of the host.
    pub fn with_target(mut self, target: BuildTarget) -> Self {
        self.target = target;
        self
    }

    fn goroot_src(&self) -> Option<PathBuf> {
        self.goroot.as_ref().map(|g| g.join("src"))
    }

    /// Import path of a directory: relative to a `src` tree, or `_` plus the
    /// absolute path when it is outside every tree.
    fn import_path_of(&self, dir: &Path) -> (String, bool) {
        if let Some(path) = self.goroot_src().and_then(|src| import_path_under(&src, dir)) {
            return (path, true);
        }
        for entry in &self.gopath {
            if let Some(path) = import_path_under(&entry.join("src"), dir) {
                return (path, false);
            }
        }
        (format!("_{}", dir.display()), false)
    }

    /// First `<ancestor>/vendor/<import>` holding Go files, walking from
    /// `from_dir` up to (not including) the `src` root of its `GOPATH` entry.
    fn find_vendored(&self, import: &str, from_dir: &Path) -> Option<(String, PathBuf)> {
        for entry in &self.gopath {
            let src = entry.join("src");
            let Some(sub) = import_path_under(&src, from_dir) else {
                continue;
            };
            let parts: Vec<&str> = sub.split('/').collect();
            for depth in (1..=parts.len()).rev() {
                let parent = parts[..depth].join("/");
                let dir = src.join(&parent).join(VENDOR_DIR).join(import);
                if dir.is_dir() && has_go_file(&dir) {
                    return Some((format!("{parent}/{VENDOR_DIR}/{import}"), dir));
                }
            }
        }
        None
    }

    fn load(&self, import_path: String, dir: PathBuf, is_standard: bool) -> Result<ResolvedPackage, ResolveError> {
        let scan = scan_dir(&dir, &self.target)?;
        if scan.go_files == 0 {
            return Err(ResolveError::NoGoFiles(dir));
        }
        Ok(ResolvedPackage {
            import_path,
            dir,
            is_standard,
            scan,
        })
    }
}

impl PackageResolver for GopathResolver {
    fn resolve(&self, import: &str, from_dir: &Path, mode: ImportMode) -> Result<ResolvedPackage, ResolveError> {
        if import == "C" {
            return Err(ResolveError::Builtin(import.to_string()));
        }

        if is_local_import(import) {
            let dir = normalize(&from_dir.join(import));
            if !dir.is_dir() {
                return Err(ResolveError::NotFound {
                    import_path: import.to_string(),
                    searched: format!("\t{}", dir.display()),
                });
            }
            let (import_path, is_standard) = self.import_path_of(&dir);
            return self.load(import_path, dir, is_standard);
        }

        if mode == ImportMode::Default {
            if let Some((import_path, dir)) = self.find_vendored(import, from_dir) {
                tracing::trace!(target: "crawler", "{} is vendored at {}", import, dir.display());
                return self.load(import_path, dir, false);
            }
        }

        let mut searched = Vec::new();
        let standard = is_standard_import(import);

        if standard {
            match self.goroot_src() {
                Some(src) => {
                    let dir = src.join(import);
                    if dir.is_dir() {
                        return self.load(import.to_string(), dir, true);
                    }
                    searched.push(format!("\t{} (from $GOROOT)", dir.display()));
                }
                None => {
                    // Without a GOROOT the standard library cannot be inspected;
                    // it is never expanded, so only the flag matters.
                    return Ok(ResolvedPackage {
                        import_path: import.to_string(),
                        dir: PathBuf::new(),
                        is_standard: true,
                        scan: DirScan::default(),
                    });
                }
            }
        }

        for entry in &self.gopath {
            let dir = entry.join("src").join(import);
            if dir.is_dir() {
                return self.load(import.to_string(), dir, false);
            }
            searched.push(format!("\t{} (from $GOPATH)", dir.display()));
        }

        Err(ResolveError::NotFound {
            import_path: import.to_string(),
            searched: searched.join("\n"),
        })
    }

    fn import_dir(&self, dir: &Path) -> Result<ResolvedPackage, ResolveError> {
        let dir = std::fs::canonicalize(dir).map_err(anyhow::Error::from)?;
        let scan = scan_dir(&dir, &self.target)?;
        if !scan.has_go_files() {
            return Err(ResolveError::NoGoFiles(dir));
        }
        let (import_path, is_standard) = self.import_path_of(&dir);
        Ok(ResolvedPackage {
            import_path,
            dir,
            is_standard,
            scan,
        })
    }
}

fn has_go_file(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(std::result::Result::ok)
            .any(|e| e.file_name().to_string_lossy().ends_with(".go") && e.file_type().is_ok_and(|t| t.is_file()))
    })
}

fn is_local_import(import: &str) -> bool {
    import == "." || import == ".." || import.starts_with("./") || import.starts_with("../")
}

/// Standard-library paths have no dot in their first element.
pub fn is_standard_import(import: &str) -> bool {
    let first = import.split('/').next().unwrap_or(import);
    !first.contains('.')
}

fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
