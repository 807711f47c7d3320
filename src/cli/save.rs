//! `gdm save`: pin the currently checked-out revision of every dependency.
//!
//! The working tree (or the `--root` directories) is crawled for imports,
//! every external package is mapped to its repository root, and the current
//! revision of each root's checkout is written to the manifest. The project's
//! own repository and the standard library are never pinned.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::Path;

use super::{CommandContext, CommandExecutor};
use crate::constants::RECURSIVE_SUFFIX;
use crate::crawler::{Crawler, GopathResolver};
use crate::manifest::DependencyStore;

/// Arguments of `gdm save`.
#[derive(Args, Debug, Default)]
pub struct SaveCommand {
    /// Directory to crawl instead of `./...`; repeatable
    ///
    /// A trailing `/...` includes every subdirectory.
    #[arg(long = "root", value_name = "PATH")]
    roots: Vec<String>,

    /// Do not follow imports of `_test.go` files in the crawled tree
    #[arg(long)]
    no_tests: bool,
}

impl SaveCommand {
    fn crawl_roots(&self, wd: &Path) -> Vec<String> {
        if self.roots.is_empty() {
            return vec![format!("{}{}", wd.display(), RECURSIVE_SUFFIX)];
        }
        self.roots
            .iter()
            .map(|root| {
                if Path::new(root).is_absolute() {
                    root.clone()
                } else {
                    wd.join(root).display().to_string()
                }
            })
            .collect()
    }
}

impl CommandExecutor for SaveCommand {
    async fn execute_with_context(self, ctx: CommandContext) -> Result<()> {
        let roots = self.crawl_roots(&ctx.env.wd);
        let spinner = ctx.spinner("Crawling imports");

        let crawler = Crawler::new(GopathResolver::from_env(&ctx.env)).include_root_tests(!self.no_tests);
        let packages = crawler.crawl(&roots)?;
        tracing::debug!("Crawl found {} packages", packages.len());

        spinner.set_message("Reading revisions");
        let store = DependencyStore::new(ctx.repo_resolver(), ctx.driver());
        let records = store.resolve(&packages, &ctx.env).await?;
        spinner.finish_and_clear();

        let path = ctx.deps_path();
        store.save_file(&path, &records)?;

        for record in &records {
            ctx.say(format!("> Saving Import [{}] Revision [{}]", record.import_path, record.revision));
        }
        ctx.say(format!(
            "{} Saved {} dependencies to {}",
            "✓".green(),
            records.len(),
            path.display()
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_root_is_recursive_working_dir() {
        let cmd = SaveCommand::default();
        assert_eq!(cmd.crawl_roots(Path::new("/go/src/app")), vec!["/go/src/app/...".to_string()]);
    }

    #[test]
    fn test_relative_roots_resolve_against_working_dir() {
        let cmd = SaveCommand {
            roots: vec!["cmd/...".to_string(), "/abs/pkg".to_string()],
            no_tests: false,
        };
        assert_eq!(
            cmd.crawl_roots(Path::new("/go/src/app")),
            vec!["/go/src/app/cmd/...".to_string(), "/abs/pkg".to_string()]
        );
    }
}
