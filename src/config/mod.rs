//! Configuration management for GDM
//!
//! Two kinds of configuration feed a run:
//!
//! 1. **Tool settings** ([`Settings`]) - optional TOML file tuning how gdm behaves
//!    (manifest name, parallelism, timeouts, network policy)
//! 2. **Go environment** ([`GoEnv`]) - `GOPATH`/`GOROOT` and the workspace the
//!    current directory belongs to
//!
//! # Settings File
//!
//! The first existing file wins:
//!
//! 1. `--config <path>`
//! 2. `$GDM_CONFIG`
//! 3. `./.gdm.toml`
//! 4. `<config dir>/gdm/config.toml` (`~/.config/gdm/config.toml` on Linux)
//!
//! ```toml
//! deps_file = "Godeps"
//! parallel = true
//! stagger_ms = 20
//! command_timeout_secs = 300
//! offline = false
//! insecure = false
//! ```
//!
//! Every field is optional. Command-line flags override file values.

pub mod go_env;
pub mod settings;

pub use go_env::GoEnv;
pub use settings::Settings;

use anyhow::{Context, Result};
use std::path::Path;

/// Reads and deserializes a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not match `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: T = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    Ok(config)
}
