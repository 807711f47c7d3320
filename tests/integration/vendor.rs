//! `gdm vendor` end to end.

use predicates::prelude::*;

use crate::common::assert_head;
use crate::fixtures::{LIB, UTIL, project};

#[test]
fn test_vendor_copies_only_imported_packages() {
    let p = project().unwrap();
    p.ws.gdm().args(["save", "--offline"]).assert().success();

    p.ws.gdm()
        .args(["vendor", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("> Vendoring"))
        .stdout(predicate::str::contains("Vendored 2 packages"));

    let vendor = p.ws.project.join("vendor");
    assert!(vendor.join(LIB).join("sub/sub.go").is_file());
    assert!(vendor.join(UTIL).join("util.go").is_file());
    assert!(!vendor.join(LIB).join("lib.go").exists());
    assert!(!vendor.join(UTIL).join(".git").exists());
}

#[test]
fn test_vendor_restores_drifted_checkout_before_copying() {
    let p = project().unwrap();
    p.ws.gdm().args(["save", "--offline"]).assert().success();

    p.util.write_file("util.go", "package util\n\nconst Name = \"drifted\"\n").unwrap();
    p.util.commit_all("drift").unwrap();

    p.ws.gdm()
        .args(["vendor", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("> Restored {UTIL}")));

    assert_head(p.util.repo_path(), &p.util_rev);
    let copied = std::fs::read_to_string(p.ws.project.join("vendor").join(UTIL).join("util.go")).unwrap();
    assert!(copied.contains("\"util\""));
}

#[test]
fn test_vendor_rejects_unpinned_import() {
    let p = project().unwrap();
    p.ws.write_godeps(&format!("{LIB} {}\n", p.lib_rev)).unwrap();

    p.ws.gdm()
        .args(["vendor", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(format!("Unknown import at path {UTIL}. Run gdm save.")));

    assert!(!p.ws.project.join("vendor").exists());
}

#[test]
fn test_save_after_vendor_ignores_vendor_directory() {
    let p = project().unwrap();
    p.ws.gdm().args(["save", "--offline"]).assert().success();
    let before = p.ws.read_godeps().unwrap();

    p.ws.gdm().args(["vendor", "--offline"]).assert().success();
    p.ws.gdm().args(["save", "--offline"]).assert().success();

    assert_eq!(p.ws.read_godeps().unwrap(), before);
}
