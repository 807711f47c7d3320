//! `gdm restore`: check out every revision pinned in the manifest.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::{CommandContext, CommandExecutor};
use crate::manifest::DependencyStore;
use crate::sync::{RestoreCoordinator, RestoreOptions, RestoreProgress, Synchronizer};
use crate::utils::progress::ProgressBar;

/// Arguments of `gdm restore`.
#[derive(Args, Debug, Default)]
pub struct RestoreCommand {
    /// Restore one dependency at a time, in manifest order, and stop at the
    /// first failure
    #[arg(long)]
    serial: bool,

    /// Milliseconds between the starts of two parallel restores
    #[arg(long, value_name = "MS")]
    stagger_ms: Option<u64>,
}

impl RestoreCommand {
    fn options(&self, ctx: &CommandContext) -> RestoreOptions {
        RestoreOptions {
            parallel: ctx.settings.parallel && !self.serial,
            stagger: self.stagger_ms.map_or_else(|| ctx.settings.stagger(), Duration::from_millis),
        }
    }
}

impl CommandExecutor for RestoreCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let driver = ctx.driver();
        let store = DependencyStore::new(ctx.repo_resolver(), Arc::clone(&driver));
        let records = store.load_file(&ctx.deps_path()).await?;
        if records.is_empty() {
            ctx.say("No dependencies to restore");
            return Ok(());
        }

        let options = self.options(&ctx);
        let revisions: HashMap<String, String> =
            records.iter().map(|r| (r.import_path.clone(), r.revision.clone())).collect();

        let (tx, rx) = mpsc::unbounded_channel();
        let coordinator =
            RestoreCoordinator::new(Synchronizer::new(driver, &ctx.env.workspace)).with_progress(tx);

        let bar = ProgressBar::new(records.len() as u64, ctx.no_progress);
        bar.set_prefix("Restoring");
        let printer = tokio::spawn(print_progress(rx, bar, revisions, ctx.quiet));

        let result = coordinator.restore_all(records, options).await;
        // Dropping the coordinator closes the progress channel.
        drop(coordinator);
        let _ = printer.await;

        let report = result?;
        ctx.say(format!(
            "{} Restored {} dependencies ({} already up to date)",
            "✓".green(),
            report.outcomes.len(),
            report.unchanged()
        ));
        Ok(())
    }
}

async fn print_progress(
    mut rx: mpsc::UnboundedReceiver<RestoreProgress>,
    bar: ProgressBar,
    revisions: HashMap<String, String>,
    quiet: bool,
) {
    while let Some(event) = rx.recv().await {
        match event {
            RestoreProgress::Started {
                import_path,
            } => bar.set_message(import_path),
            RestoreProgress::Finished {
                import_path,
                outcome,
                ..
            } => {
                bar.inc(1);
                let revision = revisions.get(&import_path).map_or("", String::as_str);
                let line = match outcome {
                    Ok(outcome) => format!(
                        "> Restored Import [{}] Revision [{}] ({})",
                        import_path,
                        revision,
                        outcome
                    ),
                    Err(_) => format!(
                        "> {} Import [{}] Revision [{}]",
                        "Failed".red(),
                        import_path,
                        revision
                    ),
                };
                if !quiet {
                    bar.println(line);
                }
            }
        }
    }
    bar.finish_and_clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CliConfig;
    use crate::config::{GoEnv, Settings};
    use tempfile::TempDir;

    fn ctx(temp: &TempDir, settings: Settings) -> CommandContext {
        let gopath = std::fs::canonicalize(temp.path()).unwrap();
        let wd = gopath.join("src/app");
        std::fs::create_dir_all(&wd).unwrap();
        let env = GoEnv::from_vars(Some(&gopath.display().to_string()), None, &wd).unwrap();
        CommandContext::new(env, settings, &CliConfig::default())
    }

    #[test]
    fn test_serial_flag_and_stagger_override() {
        let temp = TempDir::new().unwrap();
        let ctx = ctx(&temp, Settings::default());

        let options = RestoreCommand::default().options(&ctx);
        assert!(options.parallel);
        assert_eq!(options.stagger, Duration::from_millis(20));

        let cmd = RestoreCommand {
            serial: true,
            stagger_ms: Some(5),
        };
        let options = cmd.options(&ctx);
        assert!(!options.parallel);
        assert_eq!(options.stagger, Duration::from_millis(5));
    }

    #[test]
    fn test_settings_can_disable_parallelism() {
        let temp = TempDir::new().unwrap();
        let settings = Settings {
            parallel: false,
            ..Settings::default()
        };
        assert!(!RestoreCommand::default().options(&ctx(&temp, settings)).parallel);
    }
}
