//! File system utilities
//!
//! - [`atomic`] - temp-and-rename writes, so a manifest is never left half written
//! - [`dirs`] - directory creation and filtered recursive copies
//!
//! # Examples
//!
//! ```rust,no_run
//! use gdm_cli::utils::fs::{ensure_dir, safe_write};
//! use std::path::Path;
//!
//! # fn example() -> anyhow::Result<()> {
//! ensure_dir(Path::new("vendor"))?;
//! safe_write(Path::new("Godeps"), "github.com/x/y abc123\n")?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod dirs;

pub use atomic::{atomic_write, safe_write};
pub use dirs::{copy_dir_filtered, ensure_dir, remove_dir_all};
