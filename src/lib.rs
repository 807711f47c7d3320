//! GDM - Go Dependency Manager
//!
//! A dependency-pinning tool for Go `GOPATH` workspaces. gdm discovers which
//! external packages a source tree transitively imports, records one exact
//! revision per repository in a plain-text `Godeps` manifest, and reproduces
//! that set of revisions on disk by driving `git`, `hg`, `bzr` and `svn`.
//!
//! # Architecture Overview
//!
//! ```text
//!  save:    crawler ──packages──► manifest::DependencyStore ──records──► Godeps
//!  restore: Godeps ──records──► sync::RestoreCoordinator ──► sync::Synchronizer ──► vcs
//!  vendor:  crawler + Godeps ──► sync::Synchronizer (verify/restore) ──► ./vendor
//! ```
//!
//! There is no constraint solving: the manifest is the whole truth, and a
//! restore either reaches every pinned revision or reports exactly which
//! dependencies it could not reach.
//!
//! # Core Modules
//!
//! - [`crawler`] - static import-graph discovery over `GOPATH`/`GOROOT`
//! - [`vcs`] - VCS kinds, command templates, repository-root resolution
//! - [`manifest`] - the `Godeps` format and dependency records
//! - [`sync`] - per-dependency synchronization and restore coordination
//! - [`vendor`] - copying pinned packages into `./vendor`
//!
//! # Supporting Modules
//!
//! - [`cli`] - command-line interface
//! - [`config`] - settings file and Go environment discovery
//! - [`core`] - error taxonomy and user-facing error rendering
//! - [`constants`] - shared timeouts and names
//! - [`utils`] - filesystem and progress helpers
//!
//! # Manifest Format (Godeps)
//!
//! ```text
//! # one repository per line: <location> <revision>
//! github.com/BurntSushi/toml 056c9bc7be7190eaa7715723883caffa5f8fa3e4
//! gopkg.in/yaml.v2 a5b47d31c556af34a302ce5d659e6fea44d90de0
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! gdm save                  # write Godeps from what is checked out now
//! gdm restore               # check out every pinned revision (parallel)
//! gdm restore --serial      # one at a time, stop at the first failure
//! gdm vendor                # copy imported packages into ./vendor
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod crawler;
pub mod manifest;
pub mod sync;
pub mod utils;
pub mod vcs;
pub mod vendor;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
