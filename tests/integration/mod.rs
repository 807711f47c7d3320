//! Integration test suite for GDM
//!
//! End-to-end tests that run the `gdm` binary, or the library against the
//! real `git` driver, inside throwaway `GOPATH` workspaces. Upstream
//! repositories are local git repositories, so the suite needs `git` on the
//! `PATH` but no network.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **cli**: environment discovery, settings files, global flags
//! - **save**: crawling and writing `Godeps`
//! - **restore**: local checkout, fetch fallback, serial and parallel failures
//! - **vendor**: copying pinned packages into `./vendor`
//! - **sync_engine**: `Synchronizer` and `RestoreCoordinator` over `SystemVcs`

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod fixtures;

mod cli;
mod restore;
mod save;
mod sync_engine;
mod vendor;
