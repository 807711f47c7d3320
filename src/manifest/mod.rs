//! The `Godeps` dependency manifest.
//!
//! The manifest pins one revision per repository:
//!
//! ```text
//! # comments and blank lines are ignored
//! github.com/user/project 3f1e2c9b0a...
//! gopkg.in/yaml.v2 a5b47d31c556af34a302ce5d659e6fea44d90de0  # trailing comment
//! ```
//!
//! Every data line has exactly two whitespace-separated tokens. A single bad
//! line rejects the whole file: acting on a partially understood manifest
//! could leave a workspace silently pinned to the wrong set of revisions.
//!
//! - [`parse_manifest`] / [`serialize`] - text format
//! - [`DependencyStore`] - turns entries and crawl results into [`DependencyRecord`]s

pub mod store;

pub use store::DependencyStore;

use anyhow::Result;

use crate::core::GdmError;
use crate::vcs::RepoRoot;

/// One parsed manifest line, before repository resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Package location as written
    pub import_path: String,
    /// Pinned revision
    pub revision: String,
    /// 1-based line number
    pub line: usize,
}

/// A pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRecord {
    /// Package location (the repository root for records produced by a save)
    pub import_path: String,
    /// Exact revision identifier
    pub revision: String,
    /// Repository owning the location
    pub repo: RepoRoot,
}

/// Parses manifest text; errors name the file as `<input>`.
pub fn parse_manifest(text: &str) -> Result<Vec<ManifestEntry>> {
    parse_manifest_named(text, "<input>")
}

/// Parses manifest text read from `file`.
///
/// # Errors
///
/// Returns [`GdmError::ManifestFormat`] for the first data line that does not
/// have exactly two tokens. No entries are returned in that case.
pub fn parse_manifest_named(text: &str, file: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let data = raw.split_once('#').map_or(raw, |(before, _)| before).trim();
        if data.is_empty() {
            continue;
        }

        let tokens: Vec<&str> = data.split_whitespace().collect();
        let [import_path, revision] = tokens.as_slice() else {
            return Err(GdmError::ManifestFormat {
                file: file.to_string(),
                line: index + 1,
                content: data.to_string(),
            }
            .into());
        };

        entries.push(ManifestEntry {
            import_path: (*import_path).to_string(),
            revision: (*revision).to_string(),
            line: index + 1,
        });
    }

    Ok(entries)
}

/// Renders records as manifest text, one `<location> <revision>` line each,
/// in the given order.
pub fn serialize(records: &[DependencyRecord]) -> String {
    records.iter().map(|r| format!("{} {}\n", r.import_path, r.revision)).collect()
}
