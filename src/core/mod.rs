//! Core types and functionality for GDM
//!
//! This module holds the error taxonomy shared by every other module:
//! - [`GdmError`] - Enumerated error types covering all GDM failure modes
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to the user-friendly format
//! - [`SyncFailure`] - One entry of an aggregated restore failure
//!
//! # Error Handling Pattern
//!
//! ```rust
//! use gdm_cli::core::{GdmError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(GdmError::GopathNotSet.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.suggestion.is_some());
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, GdmError, SyncFailure, user_friendly_error};
