//! Common test utilities and fixtures for GDM integration tests
//!
//! [`GoWorkspace`] lays out a throwaway `GOPATH` with a project at
//! `src/github.com/me/app`, a minimal `GOROOT` holding `fmt`, and a directory
//! of upstream git repositories. Dependencies are "downloaded" by cloning
//! those upstreams into `GOPATH/src`, so no test touches the network.

// Allow dead code because these utilities are used across different test files
// and not all utilities are used in every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub use gdm_cli::test_utils::TestGit;

/// Import path of the project under test.
pub const PROJECT: &str = "github.com/me/app";

/// A temporary Go workspace.
pub struct GoWorkspace {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    pub gopath: PathBuf,
    pub goroot: PathBuf,
    pub upstreams: PathBuf,
    pub config_home: PathBuf,
    pub project: PathBuf,
}

impl GoWorkspace {
    /// Creates the directory layout.
    pub fn new() -> Result<Self> {
        gdm_cli::test_utils::init_test_logging(None);
        let temp_dir = TempDir::new()?;
        let root = fs::canonicalize(temp_dir.path())?;
        let gopath = root.join("gopath");
        let goroot = root.join("goroot");
        let upstreams = root.join("upstreams");
        let config_home = root.join("config");
        let project = gopath.join("src").join(PROJECT);

        fs::create_dir_all(&project)?;
        fs::create_dir_all(&upstreams)?;
        fs::create_dir_all(&config_home)?;
        fs::create_dir_all(goroot.join("src/fmt"))?;
        fs::write(goroot.join("src/fmt/print.go"), "package fmt\n")?;

        Ok(Self {
            _temp_dir: temp_dir,
            gopath,
            goroot,
            upstreams,
            config_home,
            project,
        })
    }

    /// Writes a file relative to the project directory.
    pub fn write_project_file(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.project.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Creates an upstream repository with one initial commit of `files`.
    pub fn create_upstream(&self, name: &str, files: &[(&str, &str)]) -> Result<(TestGit, String)> {
        let git = TestGit::init(self.upstreams.join(name))?;
        for (path, contents) in files {
            git.write_file(path, contents)?;
        }
        let rev = git.commit_all("initial")?;
        Ok((git, rev))
    }

    /// Clones `upstream` to `GOPATH/src/<import_root>`.
    pub fn install(&self, upstream: &TestGit, import_root: &str) -> Result<TestGit> {
        let dest = self.src_dir(import_root);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        upstream.clone_to(&dest)
    }

    /// `GOPATH/src/<import_path>`
    pub fn src_dir(&self, import_path: &str) -> PathBuf {
        self.gopath.join("src").join(import_path)
    }

    /// Writes the project's `Godeps`.
    pub fn write_godeps(&self, contents: &str) -> Result<()> {
        self.write_project_file("Godeps", contents)
    }

    /// Reads the project's `Godeps`.
    pub fn read_godeps(&self) -> Result<String> {
        fs::read_to_string(self.project.join("Godeps")).context("Failed to read Godeps")
    }

    /// `gdm` invocation inside the project with an isolated environment.
    pub fn gdm(&self) -> Command {
        self.gdm_in(&self.project)
    }

    /// `gdm` invocation inside `dir` with an isolated environment.
    pub fn gdm_in(&self, dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("gdm").expect("gdm binary is built");
        cmd.current_dir(dir)
            .env("GOPATH", &self.gopath)
            .env("GOROOT", &self.goroot)
            .env("XDG_CONFIG_HOME", &self.config_home)
            .env("HOME", &self.config_home)
            .env("GDM_NO_PROGRESS", "1")
            .env("NO_COLOR", "1")
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .env_remove("GDM_CONFIG")
            .env_remove("GOOS")
            .env_remove("GOARCH")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Asserts that the checkout at `dir` sits at `rev`.
pub fn assert_head(dir: &Path, rev: &str) {
    let head = TestGit::new(dir).head().expect("read HEAD");
    assert_eq!(head, rev, "unexpected revision in {}", dir.display());
}
