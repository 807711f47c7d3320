//! Command-line interface for GDM (Go Dependency Manager).
//!
//! Each command lives in its own module with its own argument struct and an
//! implementation of [`CommandExecutor`]. Global flags are collected into a
//! [`CliConfig`] so tests can drive commands without touching process state.
//!
//! # Available Commands
//!
//! - `save` (alias `bootstrap`) - crawl the working tree and write `Godeps`
//! - `restore` (aliases `get`, `sync`, `checkout`) - check out every pinned revision
//! - `vendor` - copy the imported dependency packages into `./vendor`
//!
//! # Basic Workflow
//!
//! ```bash
//! cd $GOPATH/src/github.com/me/app
//! gdm save            # pin what is currently checked out
//! git add Godeps
//!
//! # later, on another machine
//! gdm restore         # reproduce the pinned revisions
//! gdm restore --serial --verbose
//! ```
//!
//! # Logging
//!
//! `--verbose` enables `debug` logging, `--quiet` limits output to errors,
//! otherwise warnings are shown. `RUST_LOG` takes precedence over both, e.g.
//! `RUST_LOG=vcs=debug,sync=trace gdm restore`.

mod common;
pub mod restore;
pub mod save;
pub mod vendor;

pub use common::{CommandContext, CommandExecutor};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Runtime configuration derived from the global flags.
///
/// Holding these values in a struct instead of exporting them as environment
/// variables lets tests inject a configuration directly.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: Option<String>,
    /// Only print errors
    pub quiet: bool,
    /// Disable progress bars and spinners
    pub no_progress: bool,
    /// Explicit settings file
    pub config_path: Option<PathBuf>,
    /// Never contact remote servers for repository discovery
    pub offline: bool,
    /// Allow plain HTTP for repository discovery
    pub insecure: bool,
}

impl CliConfig {
    /// Create a new CLI configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the global tracing subscriber.
    ///
    /// Logs go to stderr so they never mix with command output. Calling this
    /// more than once is harmless; later calls are ignored.
    pub fn init_logging(&self) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(self.log_level.as_deref().unwrap_or("warn"))
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.log_level.as_deref() == Some("debug"))
            .without_time()
            .try_init();
    }
}

/// Main CLI application structure for GDM
#[derive(Parser)]
#[command(
    name = "gdm",
    about = "Go Dependency Manager - pin and restore GOPATH dependencies",
    version,
    long_about = "gdm records the exact VCS revision of every repository a Go source tree \
                  imports into a Godeps file, and checks those revisions back out on demand."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    ///
    /// Shows every VCS command, import resolution step and timing. Equivalent
    /// to `RUST_LOG=debug`.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a settings file
    ///
    /// Overrides `GDM_CONFIG`, `./.gdm.toml` and the user-level
    /// `gdm/config.toml`.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable progress bars and spinners
    #[arg(long, global = true)]
    no_progress: bool,

    /// Never fetch go-get meta tags; only well-known hosts and VCS suffixes resolve
    #[arg(long, global = true)]
    offline: bool,

    /// Allow meta tag discovery over plain HTTP
    #[arg(long, global = true)]
    insecure: bool,
}

/// Available subcommands for the GDM CLI.
#[derive(Subcommand)]
enum Commands {
    /// Save the currently checked-out revisions of all dependencies to Godeps.
    ///
    /// See [`save::SaveCommand`].
    #[command(visible_alias = "bootstrap")]
    Save(save::SaveCommand),

    /// Check out the revisions listed in Godeps inside GOPATH.
    ///
    /// See [`restore::RestoreCommand`].
    #[command(visible_aliases = ["get", "sync", "checkout"])]
    Restore(restore::RestoreCommand),

    /// Copy imported dependency packages into ./vendor at their pinned revisions.
    ///
    /// See [`vendor::VendorCommand`].
    Vendor(vendor::VendorCommand),
}

impl Cli {
    /// Execute the CLI with configuration built from the parsed flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Build a [`CliConfig`] from the parsed CLI arguments.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            quiet: self.quiet,
            no_progress: self.no_progress,
            config_path: self.config.clone(),
            offline: self.offline,
            insecure: self.insecure,
        }
    }

    /// Execute the CLI with a specific configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        let ctx = CommandContext::load(&config)?;
        ctx.print_banner();

        match self.command {
            Commands::Save(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Restore(cmd) => cmd.execute_with_context(ctx).await,
            Commands::Vendor(cmd) => cmd.execute_with_context(ctx).await,
        }
    }
}
