//! Go workspace discovery.
//!
//! gdm works inside a `GOPATH` workspace: dependency checkouts live at
//! `<workspace>/src/<repository root>`. `GOPATH` may list several entries; the
//! workspace is the entry that contains the working directory.

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::core::GdmError;
use crate::crawler::constraint::BuildTarget;

/// The Go environment of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    /// Every `GOPATH` entry, in search order
    pub gopath: Vec<PathBuf>,
    /// The `GOPATH` entry containing the working directory
    pub workspace: PathBuf,
    /// Standard library root, when known
    pub goroot: Option<PathBuf>,
    /// Working directory
    pub wd: PathBuf,
    /// Platform source files are selected for
    pub target: BuildTarget,
}

impl GoEnv {
    /// Reads `GOPATH`, `GOROOT` and the current directory from the process.
    ///
    /// When `GOROOT` is unset it is derived from the location of the `go`
    /// executable, if one is installed. `GOOS` and `GOARCH` override the host
    /// platform.
    pub fn from_env() -> Result<Self> {
        let gopath = std::env::var("GOPATH").ok();
        let goroot = std::env::var("GOROOT").ok().or_else(detect_goroot);
        let wd = std::env::current_dir()?;
        let mut env = Self::from_vars(gopath.as_deref(), goroot.as_deref(), &wd)?;
        env.target = BuildTarget::from_vars(
            std::env::var("GOOS").ok().as_deref(),
            std::env::var("GOARCH").ok().as_deref(),
        );
        Ok(env)
    }

    /// Builds the environment from explicit values.
    ///
    /// # Errors
    ///
    /// - [`GdmError::GopathNotSet`] when `gopath` is missing or empty
    /// - [`GdmError::NotInGopath`] when `wd` is outside every entry
    pub fn from_vars(gopath: Option<&str>, goroot: Option<&str>, wd: &Path) -> Result<Self> {
        let raw = gopath.unwrap_or_default();
        let entries: Vec<PathBuf> = std::env::split_paths(raw)
            .filter(|p| !p.as_os_str().is_empty())
            .map(|p| canonical(&expand(&p)))
            .collect();
        if entries.is_empty() {
            return Err(GdmError::GopathNotSet.into());
        }

        let wd = canonical(wd);
        let workspace = entries.iter().find(|entry| wd.starts_with(entry)).cloned().ok_or_else(|| {
            GdmError::NotInGopath {
                wd: wd.display().to_string(),
            }
        })?;

        let goroot = goroot.filter(|g| !g.is_empty()).map(|g| canonical(&expand(Path::new(g))));

        tracing::debug!(
            "Workspace {} (GOPATH entries: {}, GOROOT: {:?})",
            workspace.display(),
            entries.len(),
            goroot
        );

        Ok(Self {
            gopath: entries,
            workspace,
            goroot,
            wd,
            target: BuildTarget::host(),
        })
    }

    /// `<workspace>/src`
    pub fn src_dir(&self) -> PathBuf {
        self.workspace.join("src")
    }

    /// Checkout directory of a repository root inside the workspace.
    pub fn checkout_dir(&self, root: &str) -> PathBuf {
        self.src_dir().join(root)
    }

    /// Import path of the working directory, if it lies under `<workspace>/src`.
    pub fn project_import_path(&self) -> Option<String> {
        import_path_under(&self.src_dir(), &self.wd)
    }
}

/// Import path of `dir` relative to a `src` directory.
pub fn import_path_under(src: &Path, dir: &Path) -> Option<String> {
    let rel = dir.strip_prefix(src).ok()?;
    let parts: Vec<String> =
        rel.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn expand(path: &Path) -> PathBuf {
    let text = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&text).into_owned())
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn detect_goroot() -> Option<String> {
    let go = which::which("go").ok()?;
    let go = std::fs::canonicalize(&go).unwrap_or(go);
    let root = go.parent()?.parent()?;
    root.join("src").is_dir().then(|| root.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_gopath_unset() {
        let temp = TempDir::new().unwrap();
        let err = GoEnv::from_vars(None, None, temp.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<GdmError>(), Some(GdmError::GopathNotSet)));

        let err = GoEnv::from_vars(Some(""), None, temp.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<GdmError>(), Some(GdmError::GopathNotSet)));
    }

    #[test]
    fn test_wd_outside_gopath() {
        let gopath = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let err = GoEnv::from_vars(Some(&gopath.path().display().to_string()), None, elsewhere.path())
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<GdmError>(), Some(GdmError::NotInGopath { .. })));
    }

    #[test]
    fn test_multi_entry_picks_containing_entry() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let project = second.path().join("src/example.com/app");
        std::fs::create_dir_all(&project).unwrap();

        let joined = std::env::join_paths([first.path(), second.path()]).unwrap();
        let env = GoEnv::from_vars(Some(&joined.to_string_lossy()), None, &project).unwrap();

        assert_eq!(env.gopath.len(), 2);
        assert_eq!(env.workspace, std::fs::canonicalize(second.path()).unwrap());
        assert_eq!(env.project_import_path().as_deref(), Some("example.com/app"));
        assert_eq!(
            env.checkout_dir("github.com/x/y"),
            env.workspace.join("src").join("github.com/x/y")
        );
    }

    #[test]
    fn test_sibling_prefix_is_not_containment() {
        let temp = TempDir::new().unwrap();
        let gopath = temp.path().join("go");
        let sibling = temp.path().join("go2/src/app");
        std::fs::create_dir_all(&gopath).unwrap();
        std::fs::create_dir_all(&sibling).unwrap();

        let err = GoEnv::from_vars(Some(&gopath.display().to_string()), None, &sibling).unwrap_err();
        assert!(matches!(err.downcast_ref::<GdmError>(), Some(GdmError::NotInGopath { .. })));
    }

    #[test]
    fn test_import_path_under() {
        let src = Path::new("/go/src");
        assert_eq!(
            import_path_under(src, Path::new("/go/src/github.com/x/y")).as_deref(),
            Some("github.com/x/y")
        );
        assert_eq!(import_path_under(src, Path::new("/go/src")), None);
        assert_eq!(import_path_under(src, Path::new("/elsewhere")), None);
    }
}
