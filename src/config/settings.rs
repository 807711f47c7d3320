//! Tool settings loaded from an optional TOML file.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{DEFAULT_COMMAND_TIMEOUT, DEFAULT_STAGGER, DEPS_FILE};
use crate::core::GdmError;

use super::parse_config;

/// File name of the per-project settings file.
pub const PROJECT_CONFIG_FILE: &str = ".gdm.toml";

/// Behavior settings for a gdm run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Manifest file name, relative to the working directory.
    pub deps_file: String,

    /// Restore dependencies concurrently (`false` restores one at a time and
    /// stops at the first failure).
    pub parallel: bool,

    /// Delay between the starts of parallel restore tasks, in milliseconds.
    pub stagger_ms: u64,

    /// Timeout for a single VCS command in seconds. `0` disables the timeout.
    pub command_timeout_secs: u64,

    /// Never contact remote servers for repository discovery.
    pub offline: bool,

    /// Allow plain HTTP for repository discovery.
    pub insecure: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            deps_file: DEPS_FILE.to_string(),
            parallel: true,
            stagger_ms: DEFAULT_STAGGER.as_millis() as u64,
            command_timeout_secs: DEFAULT_COMMAND_TIMEOUT.as_secs(),
            offline: false,
            insecure: false,
        }
    }
}

impl Settings {
    /// Loads settings from the first existing candidate file, or defaults.
    ///
    /// `explicit` is the `--config` flag and `env_path` the value of
    /// `GDM_CONFIG`; both must point at an existing file when given.
    ///
    /// # Errors
    ///
    /// Returns [`GdmError::ConfigError`] for a missing explicit file and a
    /// parse error for malformed TOML.
    pub fn load_with_optional(
        explicit: Option<&Path>,
        env_path: Option<&str>,
        wd: &Path,
    ) -> Result<Self> {
        match Self::locate(explicit, env_path, wd)? {
            Some(path) => {
                tracing::debug!("Loading settings from {}", path.display());
                Self::load_from(&path)
            }
            None => Ok(Self::default()),
        }
    }

    /// Loads settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Self> {
        parse_config(path)
    }

    /// Default user-level settings path (`<config dir>/gdm/config.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("gdm").join("config.toml"))
    }

    fn locate(explicit: Option<&Path>, env_path: Option<&str>, wd: &Path) -> Result<Option<PathBuf>> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| {
                env_path
                    .filter(|p| !p.is_empty())
                    .map(|p| PathBuf::from(shellexpand::tilde(p).into_owned()))
            });
        if let Some(path) = requested {
            if !path.is_file() {
                return Err(GdmError::ConfigError {
                    message: format!("config file {} does not exist", path.display()),
                }
                .into());
            }
            return Ok(Some(path));
        }

        let project = wd.join(PROJECT_CONFIG_FILE);
        if project.is_file() {
            return Ok(Some(project));
        }

        Ok(Self::default_path().filter(|p| p.is_file()))
    }

    /// Per-command timeout; `None` when disabled.
    pub const fn command_timeout(&self) -> Option<Duration> {
        if self.command_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.command_timeout_secs))
        }
    }

    /// Delay between parallel restore task starts.
    pub const fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.deps_file, "Godeps");
        assert!(settings.parallel);
        assert_eq!(settings.stagger(), Duration::from_millis(20));
        assert_eq!(settings.command_timeout(), Some(Duration::from_secs(300)));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "parallel = false\ncommand_timeout_secs = 0\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(!settings.parallel);
        assert_eq!(settings.command_timeout(), None);
        assert_eq!(settings.deps_file, "Godeps");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "paralel = false\n").unwrap();
        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    fn test_project_file_is_found() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(PROJECT_CONFIG_FILE), "deps_file = \"deps.txt\"\n").unwrap();

        let settings = Settings::load_with_optional(None, None, temp.path()).unwrap();
        assert_eq!(settings.deps_file, "deps.txt");
    }

    #[test]
    fn test_explicit_path_wins_and_must_exist() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(PROJECT_CONFIG_FILE), "stagger_ms = 1\n").unwrap();
        let explicit = temp.path().join("explicit.toml");
        std::fs::write(&explicit, "stagger_ms = 99\n").unwrap();

        let settings = Settings::load_with_optional(Some(&explicit), None, temp.path()).unwrap();
        assert_eq!(settings.stagger_ms, 99);

        let env = explicit.display().to_string();
        let settings = Settings::load_with_optional(None, Some(&env), temp.path()).unwrap();
        assert_eq!(settings.stagger_ms, 99);

        let missing = temp.path().join("missing.toml");
        let err = Settings::load_with_optional(Some(&missing), None, temp.path()).unwrap_err();
        assert!(matches!(err.downcast_ref::<GdmError>(), Some(GdmError::ConfigError { .. })));
    }
}
