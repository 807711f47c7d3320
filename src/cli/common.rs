//! Common utilities and traits for CLI commands

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;

use super::CliConfig;
use crate::config::{GoEnv, Settings};
use crate::constants::CONFIG_ENV;
use crate::utils::progress::ProgressBar;
use crate::vcs::{RepoRootResolver, SystemVcs};

/// Common trait for CLI command execution pattern
pub trait CommandExecutor: Sized {
    /// Execute the command inside a prepared context
    fn execute_with_context(
        self,
        ctx: CommandContext,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Everything a command needs: the Go environment, the effective settings
/// and the output preferences.
#[derive(Debug, Clone)]
pub struct CommandContext {
    /// Go workspace of this invocation
    pub env: GoEnv,
    /// Settings file merged with command-line overrides
    pub settings: Settings,
    /// Suppress everything but errors
    pub quiet: bool,
    /// Hide progress bars
    pub no_progress: bool,
}

impl CommandContext {
    /// Discovers the Go environment and loads settings.
    ///
    /// # Errors
    ///
    /// Fails when `GOPATH` is unset, the working directory lies outside of
    /// it, or the settings file cannot be read.
    pub fn load(config: &CliConfig) -> Result<Self> {
        let env = GoEnv::from_env()?;
        let env_path = std::env::var(CONFIG_ENV).ok();
        let settings =
            Settings::load_with_optional(config.config_path.as_deref(), env_path.as_deref(), &env.wd)?;
        Ok(Self::new(env, settings, config))
    }

    /// Builds a context from explicit parts, applying `config` overrides.
    pub fn new(env: GoEnv, mut settings: Settings, config: &CliConfig) -> Self {
        settings.offline |= config.offline;
        settings.insecure |= config.insecure;
        Self {
            env,
            settings,
            quiet: config.quiet,
            no_progress: config.no_progress || config.quiet,
        }
    }

    /// Location of the manifest file.
    pub fn deps_path(&self) -> PathBuf {
        self.env.wd.join(&self.settings.deps_file)
    }

    /// Repository-root resolver honoring `offline`/`insecure`.
    pub fn repo_resolver(&self) -> RepoRootResolver {
        RepoRootResolver::new().offline(self.settings.offline).insecure(self.settings.insecure)
    }

    /// VCS driver honoring the command timeout.
    pub fn driver(&self) -> Arc<SystemVcs> {
        Arc::new(SystemVcs::new().with_timeout(self.settings.command_timeout()))
    }

    /// Spinner for work of unknown size.
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner(self.no_progress);
        spinner.set_message(message);
        spinner
    }

    /// Prints a status line unless quiet.
    pub fn say(&self, line: impl AsRef<str>) {
        if !self.quiet {
            println!("{}", line.as_ref());
        }
    }

    /// Prints the working directory and workspace header.
    pub fn print_banner(&self) {
        if self.quiet {
            return;
        }
        println!("{}", "======= Go Dependency Manager =======".bold());
        println!("= working dir: {}", self.env.wd.display());
        println!("= GOPATH:      {}", self.env.workspace.display());
        println!("{}", "=====================================".bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn env(temp: &TempDir) -> GoEnv {
        let gopath = std::fs::canonicalize(temp.path()).unwrap();
        let wd = gopath.join("src/github.com/me/app");
        std::fs::create_dir_all(&wd).unwrap();
        GoEnv::from_vars(Some(&gopath.display().to_string()), None, &wd).unwrap()
    }

    #[test]
    fn test_flags_override_settings() {
        let temp = TempDir::new().unwrap();
        let config = CliConfig {
            offline: true,
            quiet: true,
            ..CliConfig::default()
        };
        let ctx = CommandContext::new(env(&temp), Settings::default(), &config);
        assert!(ctx.settings.offline);
        assert!(!ctx.settings.insecure);
        assert!(ctx.no_progress);
    }

    #[test]
    fn test_deps_path_uses_configured_name() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            deps_file: "deps.txt".to_string(),
            ..Settings::default()
        };
        let ctx = CommandContext::new(env(&temp), settings, &CliConfig::default());
        assert_eq!(ctx.deps_path(), ctx.env.wd.join("deps.txt"));
    }
}
