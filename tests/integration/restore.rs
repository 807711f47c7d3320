//! `gdm restore` end to end against local upstream repositories.

use predicates::prelude::*;

use crate::common::assert_head;
use crate::fixtures::{LIB, UTIL, project};

const MISSING_REV: &str = "0123456789abcdef0123456789abcdef01234567";

#[test]
fn test_restore_checks_out_older_revision_from_local_history() {
    let p = project().unwrap();
    let second = p.lib.commit_file("more.go", "package lib\n", "second").unwrap();
    assert_head(p.lib.repo_path(), &second);

    p.ws.write_godeps(&format!("{LIB} {}\n", p.lib_rev)).unwrap();
    p.ws.gdm()
        .args(["restore", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("> Restored Import [{LIB}] Revision [{}]", p.lib_rev)));

    assert_head(p.lib.repo_path(), &p.lib_rev);
}

#[test]
fn test_restore_fetches_revision_missing_locally() {
    let p = project().unwrap();
    let newer = p.lib_upstream.commit_file("newer.go", "package lib\n", "upstream change").unwrap();

    p.ws.write_godeps(&format!("{LIB} {newer}\n")).unwrap();
    p.ws.gdm()
        .args(["sync", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(fetched)"));

    assert_head(p.lib.repo_path(), &newer);
}

#[test]
fn test_restore_twice_is_a_no_op() {
    let p = project().unwrap();
    p.ws.write_godeps(&format!("{LIB} {}\n{UTIL} {}\n", p.lib_rev, p.util_rev)).unwrap();

    p.ws.gdm().args(["restore", "--offline"]).assert().success();
    p.ws.gdm()
        .args(["checkout", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2 already up to date"));

    assert_head(p.lib.repo_path(), &p.lib_rev);
    assert_head(p.util.repo_path(), &p.util_rev);
}

#[test]
fn test_parallel_restore_reports_every_failure_and_restores_the_rest() {
    let p = project().unwrap();
    let second = p.util.commit_file("more.go", "package util\n", "local").unwrap();
    assert_ne!(second, p.util_rev);

    p.ws.write_godeps(&format!("{LIB} {MISSING_REV}\n{UTIL} {}\n", p.util_rev)).unwrap();
    p.ws.gdm()
        .args(["restore", "--offline", "--stagger-ms", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to restore 1 dependencies"))
        .stderr(predicate::str::contains(LIB));

    assert_head(p.util.repo_path(), &p.util_rev);
}

#[test]
fn test_serial_restore_stops_at_first_failure() {
    let p = project().unwrap();
    let second = p.util.commit_file("more.go", "package util\n", "local").unwrap();

    p.ws.write_godeps(&format!("{LIB} {MISSING_REV}\n{UTIL} {}\n", p.util_rev)).unwrap();
    p.ws.gdm()
        .args(["restore", "--offline", "--serial"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("Failed to restore {LIB}")));

    // The second record was never attempted.
    assert_head(p.util.repo_path(), &second);
}

#[test]
fn test_malformed_manifest_touches_nothing() {
    let p = project().unwrap();
    let second = p.lib.commit_file("more.go", "package lib\n", "second").unwrap();

    p.ws.write_godeps(&format!("{LIB} {}\n#comment\n\nfoo\n", p.lib_rev)).unwrap();
    p.ws.gdm()
        .args(["restore", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid line 4 in Godeps: \"foo\""));

    assert_head(p.lib.repo_path(), &second);
}

#[test]
fn test_missing_manifest() {
    let p = project().unwrap();
    p.ws.gdm()
        .args(["restore", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("gdm save"));
}
