//! Error handling for GDM
//!
//! This module provides the error taxonomy and user-friendly error reporting for the
//! Go dependency manager. Like the rest of the crate it follows two principles:
//! 1. **Strongly-typed errors** for precise error handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`GdmError`] - Enumerated error types for all failure cases in GDM
//! - [`ErrorContext`] - Wrapper that adds user-friendly messages and suggestions
//!
//! # Error Categories
//!
//! - **Resolution**: [`GdmError::ImportResolutionFailed`], [`GdmError::ImportParseFailed`],
//!   [`GdmError::UnknownRepository`]. Fatal: an incomplete dependency set is worse than none.
//! - **Manifest**: [`GdmError::ManifestFormat`], [`GdmError::ManifestNotFound`]. Fatal before
//!   any synchronization starts.
//! - **Synchronization**: [`GdmError::SyncFailed`] for one dependency and
//!   [`GdmError::RestoreFailed`] for the aggregate of a parallel restore.
//! - **Tooling**: [`GdmError::VcsNotFound`], [`GdmError::VcsCommandFailed`].
//! - **Environment**: [`GdmError::GopathNotSet`], [`GdmError::NotInGopath`].
//!
//! Internal components never terminate the process. Errors travel as
//! [`anyhow::Error`] up to `main`, which converts them with [`user_friendly_error`]
//! and picks the exit status.
//!
//! # Examples
//!
//! ```rust,no_run
//! use gdm_cli::core::{GdmError, user_friendly_error};
//!
//! let err = GdmError::ManifestFormat {
//!     file: "Godeps".to_string(),
//!     line: 4,
//!     content: "foo".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(err));
//! ctx.display(); // Shows colored error with suggestions
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// One failed dependency inside an aggregated restore error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Package location of the failing record
    pub import_path: String,
    /// Rendered underlying error
    pub reason: String,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.import_path, self.reason)
    }
}

/// The main error type for GDM operations
///
/// Each variant represents a specific failure mode and carries the paths,
/// import paths or command output needed to explain it to a user.
#[derive(Error, Debug)]
pub enum GdmError {
    /// An import could not be mapped to a package directory.
    ///
    /// This aborts the whole crawl: saving a manifest from a partial import
    /// graph would silently drop dependencies.
    #[error("Cannot resolve import \"{import_path}\" from {dir}: {reason}")]
    ImportResolutionFailed {
        /// The raw import string
        import_path: String,
        /// The importing directory used as search context
        dir: String,
        /// Why resolution failed
        reason: String,
    },

    /// The import declarations of a Go source file could not be parsed
    #[error("Cannot parse imports of {file}: {reason}")]
    ImportParseFailed {
        /// The offending source file
        file: String,
        /// Parser message
        reason: String,
    },

    /// No repository root could be determined for an import path
    #[error("Cannot determine repository for \"{import_path}\": {reason}")]
    UnknownRepository {
        /// The import path being resolved
        import_path: String,
        /// Why the lookup failed
        reason: String,
    },

    /// A manifest line is not of the form `<location> <revision>`
    #[error("Invalid line {line} in {file}: \"{content}\"")]
    ManifestFormat {
        /// Manifest file name (or `<input>` for in-memory text)
        file: String,
        /// 1-based line number
        line: usize,
        /// The offending line with comments stripped
        content: String,
    },

    /// The manifest file does not exist
    #[error("Dependency file {path} not found")]
    ManifestNotFound {
        /// Expected manifest location
        path: String,
    },

    /// One dependency could not be brought to its pinned revision
    #[error("Failed to restore {import_path} at {dir}: {reason}")]
    SyncFailed {
        /// Package location of the record
        import_path: String,
        /// Checkout directory
        dir: String,
        /// Underlying command error
        reason: String,
    },

    /// Aggregate of every failed dependency in a parallel restore
    #[error("Failed to restore {} dependencies:\n{}", .failures.len(), format_failures(.failures))]
    RestoreFailed {
        /// Per-dependency failures sorted by import path
        failures: Vec<SyncFailure>,
    },

    /// The executable for a VCS kind is not installed
    #[error("{vcs} is not installed or '{command}' was not found in PATH")]
    VcsNotFound {
        /// Display name of the VCS
        vcs: String,
        /// Executable that was looked up
        command: String,
    },

    /// A VCS command exited unsuccessfully or timed out
    #[error("{command} {operation} failed in {dir}: {stderr}")]
    VcsCommandFailed {
        /// Executable name
        command: String,
        /// Rendered arguments
        operation: String,
        /// Working directory
        dir: String,
        /// Error output of the command
        stderr: String,
    },

    /// An imported package is not covered by any manifest record
    #[error("Unknown import at path {import_path}. Run gdm save.")]
    UnpinnedImport {
        /// Import path without a matching record
        import_path: String,
    },

    /// `GOPATH` is not set
    #[error("GOPATH must be set to use gdm")]
    GopathNotSet,

    /// The working directory is outside of every `GOPATH` entry
    #[error("gdm can only be executed within a directory in the GOPATH (working dir: {wd})")]
    NotInGopath {
        /// Current working directory
        wd: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// File system error
    #[error("File system error: {operation} {path}")]
    FileSystemError {
        /// What was being done
        operation: String,
        /// The path involved
        path: String,
    },

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

fn format_failures(failures: &[SyncFailure]) -> String {
    failures.iter().map(|f| format!("  {f}")).collect::<Vec<_>>().join("\n")
}

impl Clone for GdmError {
    fn clone(&self) -> Self {
        match self {
            Self::ImportResolutionFailed {
                import_path,
                dir,
                reason,
            } => Self::ImportResolutionFailed {
                import_path: import_path.clone(),
                dir: dir.clone(),
                reason: reason.clone(),
            },
            Self::ImportParseFailed {
                file,
                reason,
            } => Self::ImportParseFailed {
                file: file.clone(),
                reason: reason.clone(),
            },
            Self::UnknownRepository {
                import_path,
                reason,
            } => Self::UnknownRepository {
                import_path: import_path.clone(),
                reason: reason.clone(),
            },
            Self::ManifestFormat {
                file,
                line,
                content,
            } => Self::ManifestFormat {
                file: file.clone(),
                line: *line,
                content: content.clone(),
            },
            Self::ManifestNotFound {
                path,
            } => Self::ManifestNotFound {
                path: path.clone(),
            },
            Self::SyncFailed {
                import_path,
                dir,
                reason,
            } => Self::SyncFailed {
                import_path: import_path.clone(),
                dir: dir.clone(),
                reason: reason.clone(),
            },
            Self::RestoreFailed {
                failures,
            } => Self::RestoreFailed {
                failures: failures.clone(),
            },
            Self::VcsNotFound {
                vcs,
                command,
            } => Self::VcsNotFound {
                vcs: vcs.clone(),
                command: command.clone(),
            },
            Self::VcsCommandFailed {
                command,
                operation,
                dir,
                stderr,
            } => Self::VcsCommandFailed {
                command: command.clone(),
                operation: operation.clone(),
                dir: dir.clone(),
                stderr: stderr.clone(),
            },
            Self::UnpinnedImport {
                import_path,
            } => Self::UnpinnedImport {
                import_path: import_path.clone(),
            },
            Self::GopathNotSet => Self::GopathNotSet,
            Self::NotInGopath {
                wd,
            } => Self::NotInGopath {
                wd: wd.clone(),
            },
            Self::ConfigError {
                message,
            } => Self::ConfigError {
                message: message.clone(),
            },
            Self::FileSystemError {
                operation,
                path,
            } => Self::FileSystemError {
                operation: operation.clone(),
                path: path.clone(),
            },
            Self::Other {
                message,
            } => Self::Other {
                message: message.clone(),
            },
        }
    }
}

/// Error context wrapper that provides user-friendly error information
///
/// Errors are displayed with the message in red, details in yellow and the
/// suggestion in green.
///
/// ```rust,no_run
/// use gdm_cli::core::{GdmError, ErrorContext};
///
/// let context = ErrorContext::new(GdmError::GopathNotSet)
///     .with_suggestion("export GOPATH=$HOME/go")
///     .with_details("gdm stores dependency checkouts under $GOPATH/src");
///
/// println!("{}", context);
/// ```
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying GDM error
    pub error: GdmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context from a [`GdmError`]
    #[must_use]
    pub const fn new(error: GdmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`GdmError`] anywhere in the error chain (so `.context(...)` wrappers
/// added on the way up do not hide it), then [`std::io::Error`], and finally falls
/// back to a generic message that includes the full cause chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(gdm_error) = error.chain().find_map(|e| e.downcast_ref::<GdmError>()) {
        return create_error_context(gdm_error.clone());
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(GdmError::FileSystemError {
                    operation: "permission denied while accessing".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check ownership of the GOPATH directories and the Godeps file");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(GdmError::FileSystemError {
                    operation: "file not found:".to_string(),
                    path: io_error.to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(GdmError::Other {
        message,
    })
}

fn create_error_context(error: GdmError) -> ErrorContext {
    let (suggestion, details): (Option<String>, Option<&str>) = match &error {
        GdmError::ImportResolutionFailed { .. } => (
            Some("Run 'go get' for the missing package or check GOPATH and GOROOT".to_string()),
            Some("Every import must resolve to a directory before a manifest can be written"),
        ),
        GdmError::ImportParseFailed { .. } => {
            (Some("Fix the syntax of the import block in the reported file".to_string()), None)
        }
        GdmError::UnknownRepository { .. } => (
            Some(
                "Check the import path, or drop --offline to allow go-get meta tag discovery"
                    .to_string(),
            ),
            None,
        ),
        GdmError::ManifestFormat { .. } => (
            Some(
                "Each line must be '<import path> <revision>', optionally followed by '# comment'"
                    .to_string(),
            ),
            Some("A malformed manifest is rejected entirely; nothing was restored"),
        ),
        GdmError::ManifestNotFound { .. } => {
            (Some("Run 'gdm save' to create it from the current checkouts".to_string()), None)
        }
        GdmError::SyncFailed { reason, .. } => {
            let suggestion = if reason.contains("unknown revision")
                || reason.contains("did not match")
                || reason.contains("reference is not a tree")
            {
                "The pinned revision does not exist upstream. Check the Godeps entry"
            } else {
                "Check your network connection and repository access, then run 'gdm restore' again"
            };
            (Some(suggestion.to_string()), None)
        }
        GdmError::RestoreFailed { .. } => (
            Some(
                "Re-run 'gdm restore'; dependencies already at their revision are not fetched again"
                    .to_string(),
            ),
            Some("Other dependencies were restored; only the ones listed failed"),
        ),
        GdmError::VcsNotFound { command, .. } => {
            (Some(format!("Install '{command}' and make sure it is on your PATH")), None)
        }
        GdmError::VcsCommandFailed { .. } => (
            Some("Run the command manually in the reported directory for more details".to_string()),
            None,
        ),
        GdmError::UnpinnedImport { .. } => {
            (None, Some("vendor only copies packages whose repository is pinned in Godeps"))
        }
        GdmError::GopathNotSet => {
            (Some("Set GOPATH, for example 'export GOPATH=$HOME/go'".to_string()), None)
        }
        GdmError::NotInGopath { .. } => {
            (Some("cd into a project under $GOPATH/src before running gdm".to_string()), None)
        }
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}
