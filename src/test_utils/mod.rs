//! Test utilities for GDM
//!
//! Helpers shared by unit and integration tests:
//! - [`RecordingDriver`] - scriptable in-memory VCS driver with an operation log
//! - [`TestGit`] - builds local git repositories that act as upstream dependencies
//! - [`init_test_logging`] - opt-in tracing output for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use gdm_cli::test_utils::{RecordingDriver, TestGit};
//!
//! # fn example() -> anyhow::Result<()> {
//! let upstream = TestGit::init("/tmp/upstream")?;
//! let first = upstream.commit_file("lib.go", "package lib\n", "initial")?;
//!
//! let driver = RecordingDriver::new();
//! driver.add_remote(&upstream.url(), &[first.as_str()]);
//! # Ok(())
//! # }
//! ```

pub mod git_helper;
pub mod recording_driver;

pub use git_helper::TestGit;
pub use recording_driver::{RecordedOp, RecordingDriver};

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests stay silent.
///
/// ```bash
/// RUST_LOG=sync=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
