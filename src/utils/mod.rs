//! Utility helpers shared by the commands.
//!
//! # Modules
//!
//! - [`fs`] - atomic writes and filtered directory copies
//! - [`progress`] - progress bars and spinners that respect `--no-progress`
//!
//! # Example
//!
//! ```rust,no_run
//! use gdm_cli::utils::{ensure_dir, safe_write, ProgressBar};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("vendor"))?;
//! safe_write(Path::new("Godeps"), "github.com/x/y abc123\n")?;
//!
//! let progress = ProgressBar::new(1, false);
//! progress.inc(1);
//! # Ok(())
//! # }
//! ```

pub mod fs;
pub mod progress;

pub use fs::{atomic_write, copy_dir_filtered, ensure_dir, remove_dir_all, safe_write};
pub use progress::ProgressBar;
