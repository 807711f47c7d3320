//! Version-control adapter layer.
//!
//! Every interaction with `git`, `hg`, `bzr` and `svn` goes through this module.
//! The supported tools form a closed set ([`VcsKind`]); each kind maps to a
//! static [`VcsSpec`] table of argument templates, so adding behavior for a tool
//! means editing a table row rather than scattering string comparisons.
//!
//! # Components
//!
//! - [`VcsCommand`] - async process builder with timeouts and logging
//! - [`VcsKind`] / [`VcsSpec`] - the tool table
//! - [`RepoRoot`] - repository identity for an import path
//! - [`RepoRootResolver`] - maps import paths to [`RepoRoot`]s
//! - [`VcsDriver`] - the operations the synchronization engine needs
//! - [`SystemVcs`] - driver that runs the real executables
//!
//! # Templates
//!
//! Template arguments may contain `{repo}` (fetch URL), `{dir}` (checkout
//! directory) and `{rev}` (pinned revision). Create commands run in the parent
//! of the checkout directory; all other commands run inside it.

pub mod command_builder;
pub mod repo_root;

pub use command_builder::{VcsCommand, VcsCommandOutput};
pub use repo_root::RepoRootResolver;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;

use crate::core::GdmError;

/// One command line, as a list of argument templates.
pub type CommandTemplate = &'static [&'static str];

/// The closed set of supported version-control tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VcsKind {
    /// Git
    Git,
    /// Mercurial (`hg`)
    Mercurial,
    /// Bazaar (`bzr`)
    Bazaar,
    /// Subversion (`svn`)
    Subversion,
}

/// Static description of how to drive one VCS tool.
#[derive(Debug)]
pub struct VcsSpec {
    /// Human-readable name
    pub name: &'static str,
    /// Executable looked up on `PATH`
    pub command: &'static str,
    /// Clone a repository into `{dir}`
    pub create: &'static [CommandTemplate],
    /// Clone a repository directly at `{rev}`, when the tool supports it
    pub create_at_revision: Option<&'static [CommandTemplate]>,
    /// Bring a checkout back to its default branch head
    pub sync_default: &'static [CommandTemplate],
    /// Switch a checkout to `{rev}` using only local history
    pub checkout_revision: &'static [CommandTemplate],
    /// Fetch new history from the remote without touching the working tree
    pub download: &'static [CommandTemplate],
    /// Print the revision the working tree is at
    pub current_revision: CommandTemplate,
}

static GIT: VcsSpec = VcsSpec {
    name: "Git",
    command: "git",
    create: &[&["clone", "{repo}", "{dir}"]],
    create_at_revision: None,
    sync_default: &[&["checkout", "-q", "--detach", "origin/HEAD"]],
    checkout_revision: &[&["checkout", "-q", "{rev}"]],
    download: &[&["fetch", "--all", "--tags", "-q"]],
    current_revision: &["rev-parse", "HEAD"],
};

static MERCURIAL: VcsSpec = VcsSpec {
    name: "Mercurial",
    command: "hg",
    create: &[&["clone", "-U", "{repo}", "{dir}"]],
    create_at_revision: Some(&[&["clone", "-u", "{rev}", "{repo}", "{dir}"]]),
    sync_default: &[&["update", "default"]],
    checkout_revision: &[&["update", "-r", "{rev}"]],
    download: &[&["pull"]],
    current_revision: &["id", "-i"],
};

static BAZAAR: VcsSpec = VcsSpec {
    name: "Bazaar",
    command: "bzr",
    create: &[&["branch", "{repo}", "{dir}"]],
    create_at_revision: Some(&[&["branch", "-r", "{rev}", "{repo}", "{dir}"]]),
    sync_default: &[&["update", "-r", "revno:-1"]],
    checkout_revision: &[&["update", "-r", "{rev}"]],
    download: &[&["pull", "--overwrite"]],
    current_revision: &["revno"],
};

// Subversion history lives on the server, so a checkout at a revision already
// fetches what it needs and `download` has nothing to do.
static SUBVERSION: VcsSpec = VcsSpec {
    name: "Subversion",
    command: "svn",
    create: &[&["checkout", "{repo}", "{dir}"]],
    create_at_revision: Some(&[&["checkout", "-r", "{rev}", "{repo}", "{dir}"]]),
    sync_default: &[&["update"]],
    checkout_revision: &[&["update", "-r", "{rev}"]],
    download: &[],
    current_revision: &["info", "--show-item", "revision"],
};

impl VcsKind {
    /// All supported kinds.
    pub const ALL: [Self; 4] = [Self::Git, Self::Mercurial, Self::Bazaar, Self::Subversion];

    /// Returns the command table for this kind.
    pub const fn spec(self) -> &'static VcsSpec {
        match self {
            Self::Git => &GIT,
            Self::Mercurial => &MERCURIAL,
            Self::Bazaar => &BAZAAR,
            Self::Subversion => &SUBVERSION,
        }
    }

    /// Executable name.
    pub const fn command(self) -> &'static str {
        self.spec().command
    }

    /// Whether the tool can clone straight to a revision.
    pub const fn supports_create_at_revision(self) -> bool {
        self.spec().create_at_revision.is_some()
    }

    /// Parses the short name used in go-get meta tags and path suffixes.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "git" => Some(Self::Git),
            "hg" => Some(Self::Mercurial),
            "bzr" => Some(Self::Bazaar),
            "svn" => Some(Self::Subversion),
            _ => None,
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Repository identity of an import path.
///
/// Two import paths with the same `root` belong to the same dependency and are
/// pinned by a single revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRoot {
    /// Tool that manages the repository
    pub kind: VcsKind,
    /// Fetch URL
    pub repo: String,
    /// Import-path prefix of the repository
    pub root: String,
}

impl RepoRoot {
    /// Creates a repository root. Normally produced by [`RepoRootResolver`];
    /// custom resolvers and tests build them directly.
    pub fn new(kind: VcsKind, repo: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            kind,
            repo: repo.into(),
            root: root.into(),
        }
    }

    /// Whether `import_path` lies inside this repository.
    pub fn contains(&self, import_path: &str) -> bool {
        import_path == self.root
            || import_path.strip_prefix(&self.root).is_some_and(|rest| rest.starts_with('/'))
    }
}

/// Operations the synchronization engine performs on a checkout.
///
/// [`SystemVcs`] runs the real tools; tests substitute an in-memory driver.
/// Methods return `Send` futures so the restore coordinator can run them on
/// spawned tasks.
pub trait VcsDriver: Send + Sync + 'static {
    /// Clones `repo` into `dest`. With `revision`, the kind must support
    /// create-at-revision.
    fn create(
        &self,
        repo: &RepoRoot,
        dest: &Path,
        revision: Option<&str>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns the checkout at `dir` to its default branch head.
    fn sync_default(&self, kind: VcsKind, dir: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Switches the checkout at `dir` to `revision` using local history only.
    fn checkout_revision(
        &self,
        kind: VcsKind,
        dir: &Path,
        revision: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Fetches remote history into the checkout at `dir`.
    fn download(&self, kind: VcsKind, dir: &Path) -> impl Future<Output = Result<()>> + Send;

    /// Reads the revision the checkout at `dir` is at.
    fn current_revision(
        &self,
        kind: VcsKind,
        dir: &Path,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// Driver that shells out to the installed VCS executables.
#[derive(Debug, Clone)]
pub struct SystemVcs {
    timeout: Option<Duration>,
}

impl Default for SystemVcs {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemVcs {
    /// Creates a driver using the default command timeout.
    pub const fn new() -> Self {
        Self {
            timeout: Some(crate::constants::DEFAULT_COMMAND_TIMEOUT),
        }
    }

    /// Overrides the per-command timeout (`None` disables it).
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fails with [`GdmError::VcsNotFound`] unless the executable for `kind` is on `PATH`.
    pub fn ensure_available(kind: VcsKind) -> Result<()> {
        which::which(kind.command()).map(|_| ()).map_err(|_| {
            GdmError::VcsNotFound {
                vcs: kind.spec().name.to_string(),
                command: kind.command().to_string(),
            }
            .into()
        })
    }

    async fn run(
        &self,
        kind: VcsKind,
        templates: &[CommandTemplate],
        cwd: &Path,
        vars: &TemplateVars<'_>,
    ) -> Result<()> {
        Self::ensure_available(kind)?;
        for template in templates {
            VcsCommand::for_kind(kind)
                .args(expand_template(template, vars))
                .current_dir(cwd)
                .with_timeout(self.timeout)
                .with_context(vars.dir.display().to_string())
                .execute_success()
                .await?;
        }
        Ok(())
    }
}

impl VcsDriver for SystemVcs {
    async fn create(&self, repo: &RepoRoot, dest: &Path, revision: Option<&str>) -> Result<()> {
        let spec = repo.kind.spec();
        let templates = match revision {
            Some(_) => spec.create_at_revision.ok_or_else(|| GdmError::Other {
                message: format!("{} cannot clone at a revision", spec.name),
            })?,
            None => spec.create,
        };
        let parent = dest.parent().unwrap_or(dest);
        let vars = TemplateVars {
            repo: &repo.repo,
            dir: dest,
            rev: revision.unwrap_or_default(),
        };
        self.run(repo.kind, templates, parent, &vars).await
    }

    async fn sync_default(&self, kind: VcsKind, dir: &Path) -> Result<()> {
        let vars = TemplateVars::in_dir(dir);
        self.run(kind, kind.spec().sync_default, dir, &vars).await
    }

    async fn checkout_revision(&self, kind: VcsKind, dir: &Path, revision: &str) -> Result<()> {
        let vars = TemplateVars {
            rev: revision,
            ..TemplateVars::in_dir(dir)
        };
        self.run(kind, kind.spec().checkout_revision, dir, &vars).await
    }

    async fn download(&self, kind: VcsKind, dir: &Path) -> Result<()> {
        let vars = TemplateVars::in_dir(dir);
        self.run(kind, kind.spec().download, dir, &vars).await
    }

    async fn current_revision(&self, kind: VcsKind, dir: &Path) -> Result<String> {
        Self::ensure_available(kind)?;
        let vars = TemplateVars::in_dir(dir);
        let revision = VcsCommand::for_kind(kind)
            .args(expand_template(kind.spec().current_revision, &vars))
            .current_dir(dir)
            .with_timeout(self.timeout)
            .with_context(dir.display().to_string())
            .execute_stdout()
            .await?;
        if revision.is_empty() {
            return Err(GdmError::VcsCommandFailed {
                command: kind.command().to_string(),
                operation: kind.spec().current_revision.join(" "),
                dir: dir.display().to_string(),
                stderr: "no revision reported".to_string(),
            }
            .into());
        }
        Ok(revision)
    }
}

/// Values substituted into command templates.
#[derive(Debug, Clone, Copy)]
pub struct TemplateVars<'a> {
    /// `{repo}`
    pub repo: &'a str,
    /// `{dir}`
    pub dir: &'a Path,
    /// `{rev}`
    pub rev: &'a str,
}

impl<'a> TemplateVars<'a> {
    fn in_dir(dir: &'a Path) -> Self {
        Self {
            repo: "",
            dir,
            rev: "",
        }
    }
}

/// Expands `{repo}`, `{dir}` and `{rev}` in every argument of `template`.
pub fn expand_template(template: CommandTemplate, vars: &TemplateVars<'_>) -> Vec<String> {
    let dir = vars.dir.display().to_string();
    template
        .iter()
        .map(|arg| arg.replace("{repo}", vars.repo).replace("{dir}", &dir).replace("{rev}", vars.rev))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_kind_table() {
        assert_eq!(VcsKind::Git.command(), "git");
        assert_eq!(VcsKind::Mercurial.command(), "hg");
        assert_eq!(VcsKind::Bazaar.command(), "bzr");
        assert_eq!(VcsKind::Subversion.command(), "svn");
        assert!(!VcsKind::Git.supports_create_at_revision());
        assert!(VcsKind::Mercurial.supports_create_at_revision());
        assert!(VcsKind::Bazaar.supports_create_at_revision());
    }

    #[test]
    fn test_from_name() {
        for kind in VcsKind::ALL {
            assert_eq!(VcsKind::from_name(kind.command()), Some(kind));
        }
        assert_eq!(VcsKind::from_name("fossil"), None);
    }

    #[test]
    fn test_expand_template() {
        let dir = PathBuf::from("/go/src/github.com/x/y");
        let vars = TemplateVars {
            repo: "https://github.com/x/y",
            dir: &dir,
            rev: "abc123",
        };
        assert_eq!(
            expand_template(&["clone", "{repo}", "{dir}"], &vars),
            vec!["clone", "https://github.com/x/y", "/go/src/github.com/x/y"]
        );
        assert_eq!(
            expand_template(MERCURIAL.create_at_revision.unwrap()[0], &vars),
            vec!["clone", "-u", "abc123", "https://github.com/x/y", "/go/src/github.com/x/y"]
        );
    }

    #[test]
    fn test_repo_root_contains() {
        let root = RepoRoot::new(VcsKind::Git, "https://github.com/x/y", "github.com/x/y");
        assert!(root.contains("github.com/x/y"));
        assert!(root.contains("github.com/x/y/sub/pkg"));
        assert!(!root.contains("github.com/x/yz"));
        assert!(!root.contains("github.com/x"));
    }

    #[tokio::test]
    async fn test_system_vcs_git_roundtrip() {
        let temp = TempDir::new().unwrap();
        let origin = temp.path().join("origin");
        std::fs::create_dir_all(&origin).unwrap();
        let git = |args: &[&str]| {
            let status = std::process::Command::new("git")
                .args(args)
                .current_dir(&origin)
                .output()
                .unwrap();
            assert!(status.status.success(), "git {args:?} failed");
            String::from_utf8_lossy(&status.stdout).trim().to_string()
        };
        git(&["init", "-q"]);
        git(&["config", "user.email", "test@example.com"]);
        git(&["config", "user.name", "Test"]);
        std::fs::write(origin.join("a.go"), "package a\n").unwrap();
        git(&["add", "."]);
        git(&["commit", "-q", "-m", "first"]);
        let first = git(&["rev-parse", "HEAD"]);
        std::fs::write(origin.join("b.go"), "package a\n").unwrap();
        git(&["add", "."]);
        git(&["commit", "-q", "-m", "second"]);

        let driver = SystemVcs::new();
        let repo = RepoRoot::new(VcsKind::Git, origin.display().to_string(), "example.com/a");
        let dest = temp.path().join("gopath/src/example.com/a");
        std::fs::create_dir_all(dest.parent().unwrap()).unwrap();

        driver.create(&repo, &dest, None).await.unwrap();
        driver.checkout_revision(VcsKind::Git, &dest, &first).await.unwrap();
        assert_eq!(driver.current_revision(VcsKind::Git, &dest).await.unwrap(), first);
        assert!(!dest.join("b.go").exists());
    }

    #[tokio::test]
    async fn test_git_create_at_revision_is_rejected() {
        let temp = TempDir::new().unwrap();
        let repo = RepoRoot::new(VcsKind::Git, "https://example.invalid/x", "example.invalid/x");
        let result = SystemVcs::new().create(&repo, &temp.path().join("x"), Some("abc")).await;
        assert!(result.is_err());
    }
}
