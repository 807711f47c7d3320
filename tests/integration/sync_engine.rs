//! Synchronizer and coordinator over the real `git` driver.

use gdm_cli::core::GdmError;
use gdm_cli::manifest::DependencyRecord;
use gdm_cli::sync::{RestoreCoordinator, RestoreOptions, SyncOutcome, Synchronizer};
use gdm_cli::vcs::{RepoRoot, SystemVcs, VcsKind};
use std::sync::Arc;
use std::time::Duration;

use crate::common::{GoWorkspace, assert_head};

fn record(root: &str, url: String, rev: &str) -> DependencyRecord {
    DependencyRecord {
        import_path: root.to_string(),
        revision: rev.to_string(),
        repo: RepoRoot::new(VcsKind::Git, url, root),
    }
}

#[tokio::test]
async fn test_absent_checkout_is_created_at_pinned_revision() {
    let ws = GoWorkspace::new().unwrap();
    let (upstream, first) = ws.create_upstream("lib", &[("lib.go", "package lib\n")]).unwrap();
    upstream.commit_file("two.go", "package lib\n", "second").unwrap();

    let sync = Synchronizer::new(Arc::new(SystemVcs::new()), &ws.gopath);
    let rec = record("example.com/acme/lib", upstream.url(), &first);

    assert_eq!(sync.synchronize(&rec).await.unwrap(), SyncOutcome::Created);
    assert_head(&ws.src_dir("example.com/acme/lib"), &first);
    assert!(sync.verify(&rec).await.unwrap());

    // Already pinned: local checkout only.
    assert_eq!(sync.synchronize(&rec).await.unwrap(), SyncOutcome::AlreadyPresent);
}

#[tokio::test]
async fn test_verify_reports_drift_and_missing_checkouts() {
    let ws = GoWorkspace::new().unwrap();
    let (upstream, first) = ws.create_upstream("lib", &[("lib.go", "package lib\n")]).unwrap();
    let sync = Synchronizer::new(Arc::new(SystemVcs::new()), &ws.gopath);
    let rec = record("example.com/acme/lib", upstream.url(), &first);

    assert!(!sync.verify(&rec).await.unwrap());

    let clone = ws.install(&upstream, "example.com/acme/lib").unwrap();
    assert!(sync.verify(&rec).await.unwrap());

    clone.commit_file("local.go", "package lib\n", "local").unwrap();
    assert!(!sync.verify(&rec).await.unwrap());
}

#[tokio::test]
async fn test_parallel_restore_of_fresh_workspace() {
    let ws = GoWorkspace::new().unwrap();
    let (a, a_rev) = ws.create_upstream("a", &[("a.go", "package a\n")]).unwrap();
    let (b, b_rev) = ws.create_upstream("b", &[("b.go", "package b\n")]).unwrap();
    let records = vec![
        record("example.com/t/a", a.url(), &a_rev),
        record("example.com/t/b", b.url(), &b_rev),
        record("example.com/t/gone", ws.upstreams.join("gone").display().to_string(), &a_rev),
    ];

    let coordinator =
        RestoreCoordinator::new(Synchronizer::new(Arc::new(SystemVcs::new()), &ws.gopath));
    let options = RestoreOptions {
        parallel: true,
        stagger: Duration::from_millis(1),
    };
    let err = coordinator.restore_all(records, options).await.unwrap_err();

    match err.downcast_ref::<GdmError>() {
        Some(GdmError::RestoreFailed {
            failures,
        }) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].import_path, "example.com/t/gone");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_head(&ws.src_dir("example.com/t/a"), &a_rev);
    assert_head(&ws.src_dir("example.com/t/b"), &b_rev);
}
