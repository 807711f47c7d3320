//! Git test helper utilities
//!
//! Builds small local git repositories that stand in for upstream
//! dependencies, so synchronization can be exercised without a network.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git command wrapper for test repositories.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    /// Wraps an existing directory.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_path: repo_path.into(),
        }
    }

    /// Creates `repo_path` and initializes a repository with a test identity
    /// on branch `main`.
    pub fn init(repo_path: impl Into<PathBuf>) -> Result<Self> {
        let git = Self::new(repo_path);
        std::fs::create_dir_all(&git.repo_path)
            .with_context(|| format!("Failed to create {}", git.repo_path.display()))?;
        git.run(&["init", "-q"], "Failed to initialize git repository")?;
        git.run(&["symbolic-ref", "HEAD", "refs/heads/main"], "Failed to set default branch")?;
        git.run(&["config", "user.email", "test@gdm.example"], "Failed to configure email")?;
        git.run(&["config", "user.name", "Test User"], "Failed to configure name")?;
        git.run(&["config", "commit.gpgsign", "false"], "Failed to disable signing")?;
        Ok(git)
    }

    /// Writes `contents` to `relative` inside the repository.
    pub fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.repo_path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Stages everything and commits, returning the new revision.
    pub fn commit_all(&self, message: &str) -> Result<String> {
        self.run(&["add", "-A"], "Failed to stage files")?;
        self.run(&["commit", "-q", "-m", message], "Failed to create commit")?;
        self.head()
    }

    /// Writes one file and commits it.
    pub fn commit_file(&self, relative: &str, contents: &str, message: &str) -> Result<String> {
        self.write_file(relative, contents)?;
        self.commit_all(message)
    }

    /// Creates a lightweight tag at `HEAD`.
    pub fn tag(&self, name: &str) -> Result<()> {
        self.run(&["tag", name], &format!("Failed to create tag {name}"))?;
        Ok(())
    }

    /// Checks out a branch or revision.
    pub fn checkout(&self, target: &str) -> Result<()> {
        self.run(&["checkout", "-q", target], &format!("Failed to checkout {target}"))?;
        Ok(())
    }

    /// Clones this repository into `dest`, with the same test identity so the
    /// clone can commit too.
    pub fn clone_to(&self, dest: &Path) -> Result<TestGit> {
        let output = Command::new("git")
            .arg("clone")
            .arg("-q")
            .arg(&self.repo_path)
            .arg(dest)
            .output()
            .context("Failed to run git clone")?;
        if !output.status.success() {
            bail!("git clone failed: {}", String::from_utf8_lossy(&output.stderr));
        }
        let clone = TestGit::new(dest);
        clone.run(&["config", "user.email", "test@gdm.example"], "Failed to configure email")?;
        clone.run(&["config", "user.name", "Test User"], "Failed to configure name")?;
        clone.run(&["config", "commit.gpgsign", "false"], "Failed to disable signing")?;
        Ok(clone)
    }

    /// Current revision of `HEAD`.
    pub fn head(&self) -> Result<String> {
        let output = self.run(&["rev-parse", "HEAD"], "Failed to read HEAD")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Repository location.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Repository location as a clone URL.
    pub fn url(&self) -> String {
        self.repo_path.display().to_string()
    }
}
