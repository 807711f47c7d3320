//! `gdm vendor`: copy imported dependency packages into `./vendor`.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::sync::Arc;

use super::{CommandContext, CommandExecutor};
use crate::manifest::DependencyStore;
use crate::sync::Synchronizer;
use crate::vendor::vendor;

/// Arguments of `gdm vendor`.
#[derive(Args, Debug, Default)]
pub struct VendorCommand {}

impl CommandExecutor for VendorCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let driver = ctx.driver();
        let store = DependencyStore::new(ctx.repo_resolver(), Arc::clone(&driver));
        let records = store.load_file(&ctx.deps_path()).await?;

        let spinner = ctx.spinner("Vendoring dependencies");
        let synchronizer = Synchronizer::new(driver, &ctx.env.workspace);
        let report = vendor(&ctx.env, &records, &synchronizer).await?;
        spinner.finish_and_clear();

        for import_path in &report.restored {
            ctx.say(format!("> Restored {import_path} to its pinned revision"));
        }
        for package in &report.packages {
            ctx.say(format!(
                "> Vendoring {} to {}",
                package.source.display(),
                package.target.display()
            ));
        }
        ctx.say(format!("{} Vendored {} packages", "✓".green(), report.packages.len()));
        Ok(())
    }
}
