//! Type-safe VCS command builder for consistent command execution
//!
//! This module provides a fluent API for building and executing commands of any
//! supported version-control tool (`git`, `hg`, `bzr`, `svn`), so every call site
//! gets the same timeout handling, logging and error mapping.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::DEFAULT_COMMAND_TIMEOUT;
use crate::core::GdmError;

use super::VcsKind;

/// Builder for constructing and executing VCS commands with consistent error handling.
///
/// # Examples
///
/// ```rust,no_run
/// use gdm_cli::vcs::{VcsCommand, VcsKind};
///
/// # async fn example() -> anyhow::Result<()> {
/// let head = VcsCommand::for_kind(VcsKind::Git)
///     .args(["rev-parse", "HEAD"])
///     .current_dir("/path/to/repo")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// # Default Configuration
///
/// - **Timeout**: 5 minutes
/// - **Working directory**: Current process directory
/// - **Environment**: Inherits from parent process, plus tool-specific
///   variables that disable interactive prompts
pub struct VcsCommand {
    /// Executable to run (e.g. `git`)
    program: String,

    /// Command arguments
    args: Vec<String>,

    /// Working directory for command execution (defaults to current directory)
    current_dir: Option<PathBuf>,

    /// Environment variables to set for the process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for command completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Optional context string for log messages (usually the import path)
    context: Option<String>,
}

impl VcsCommand {
    /// Creates a command for an arbitrary executable.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: Some(DEFAULT_COMMAND_TIMEOUT),
            context: None,
        }
    }

    /// Creates a command for the executable of `kind`.
    ///
    /// Git is told never to prompt for credentials: a restore runs many
    /// commands concurrently and a prompt would hang one of them until the
    /// timeout fires.
    pub fn for_kind(kind: VcsKind) -> Self {
        let cmd = Self::new(kind.command());
        match kind {
            VcsKind::Git => cmd.env("GIT_TERMINAL_PROMPT", "0"),
            VcsKind::Mercurial => cmd.env("HGPLAIN", "1"),
            VcsKind::Bazaar | VcsKind::Subversion => cmd,
        }
    }

    /// Sets the working directory for command execution.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for the process.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (e.g., the import path being restored)
    ///
    /// With context, log messages look like:
    /// ```text
    /// (github.com/x/y) Executing command: git checkout -q abc123
    /// ```
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Renders the command line for logs and error messages.
    pub fn describe(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    fn dir_display(&self) -> String {
        self.current_dir
            .as_ref()
            .map_or_else(|| ".".to_string(), |d| d.display().to_string())
    }

    /// Execute the command and return the output
    pub async fn execute(self) -> Result<VcsCommandOutput> {
        let start = Instant::now();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "vcs", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let ctx = self.context.as_deref().unwrap_or("-");
        tracing::debug!(
            target: "vcs",
            "({}) Executing command in {}: {}",
            ctx,
            self.dir_display(),
            self.describe()
        );

        let spawned = cmd.spawn();
        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GdmError::VcsNotFound {
                    vcs: self.program.clone(),
                    command: self.program.clone(),
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to execute {}", self.describe()));
            }
        };

        let output = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, child.wait_with_output()).await {
                result.with_context(|| format!("Failed to execute {}", self.describe()))?
            } else {
                tracing::warn!(
                    target: "vcs",
                    "({}) Command timed out after {} seconds: {}",
                    ctx,
                    duration.as_secs(),
                    self.describe()
                );
                return Err(GdmError::VcsCommandFailed {
                    command: self.program.clone(),
                    operation: self.args.join(" "),
                    dir: self.dir_display(),
                    stderr: format!(
                        "timed out after {} seconds (network problem or credential prompt?)",
                        duration.as_secs()
                    ),
                }
                .into());
            }
        } else {
            child
                .wait_with_output()
                .await
                .with_context(|| format!("Failed to execute {}", self.describe()))?
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "vcs",
                "({}) Command failed with exit code {:?}: {}",
                ctx,
                output.status.code(),
                stderr.trim()
            );
            let message = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(GdmError::VcsCommandFailed {
                command: self.program.clone(),
                operation: self.args.join(" "),
                dir: self.dir_display(),
                stderr: message,
            }
            .into());
        }

        if !stdout.trim().is_empty() {
            tracing::trace!(target: "vcs", "({}) {}", ctx, stdout.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "vcs::perf",
                "({}) {} took {:.2}s",
                ctx,
                self.describe(),
                elapsed.as_secs_f64()
            );
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(
                target: "vcs::perf",
                "({}) {} took {}ms",
                ctx,
                self.describe(),
                elapsed.as_millis()
            );
        }

        Ok(VcsCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and check for success, discarding output
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a VCS command
pub struct VcsCommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error output
    pub stderr: String,
}
