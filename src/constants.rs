//! Global constants used throughout the GDM codebase.
//!
//! Timeouts, file names and scheduling parameters shared by several
//! modules live here so magic numbers stay discoverable.

use std::time::Duration;

/// Name of the dependency manifest written by `save` and read by `restore`.
pub const DEPS_FILE: &str = "Godeps";

/// Directory that `vendor` copies packages into, relative to the working dir.
///
/// Directories with this name are also skipped when expanding `./...` roots.
pub const VENDOR_DIR: &str = "vendor";

/// Suffix marking a root path as "this directory and every descendant".
pub const RECURSIVE_SUFFIX: &str = "/...";

/// Delay between the starts of two parallel synchronization tasks (20ms).
///
/// Staggering keeps a restore of many repositories hosted on one server from
/// opening all connections at the same instant.
pub const DEFAULT_STAGGER: Duration = Duration::from_millis(20);

/// Default timeout for a single VCS command (5 minutes).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for a go-get meta tag lookup (15 seconds).
pub const META_LOOKUP_TIMEOUT: Duration = Duration::from_secs(15);

/// Number of retries for a failed go-get meta tag lookup.
pub const META_LOOKUP_RETRIES: usize = 2;

/// Starting delay for exponential backoff of meta tag lookups (100ms).
pub const META_LOOKUP_BACKOFF_MS: u64 = 100;

/// VCS metadata directories excluded when vendoring a package tree.
pub const VCS_METADATA_DIRS: &[&str] = &[".git", ".hg", ".bzr", ".svn"];

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV: &str = "GDM_NO_PROGRESS";

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_ENV: &str = "GDM_CONFIG";
