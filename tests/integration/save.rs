//! `gdm save` end to end.

use predicates::prelude::*;

use crate::common::assert_head;
use crate::fixtures::{LIB, UTIL, project};

#[test]
fn test_save_pins_every_transitive_repository() {
    let p = project().unwrap();

    p.ws.gdm()
        .args(["save", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "> Saving Import [{LIB}] Revision [{}]",
            p.lib_rev
        )))
        .stdout(predicate::str::contains(format!(
            "> Saving Import [{UTIL}] Revision [{}]",
            p.util_rev
        )));

    let godeps = p.ws.read_godeps().unwrap();
    assert_eq!(godeps, format!("{LIB} {}\n{UTIL} {}\n", p.lib_rev, p.util_rev));
}

#[test]
fn test_save_never_pins_the_project_or_stdlib() {
    let p = project().unwrap();
    p.ws.gdm().args(["save", "--offline"]).assert().success();

    let godeps = p.ws.read_godeps().unwrap();
    assert!(!godeps.contains("github.com/me/app"));
    assert!(!godeps.contains("fmt"));
}

#[test]
fn test_bootstrap_alias_and_custom_root() {
    let p = project().unwrap();
    p.ws.write_project_file("tools/tool.go", "package tools\n\nimport \"github.com/acme/util\"\n").unwrap();

    p.ws.gdm().args(["bootstrap", "--offline", "--root", "tools"]).assert().success();

    assert_eq!(p.ws.read_godeps().unwrap(), format!("{UTIL} {}\n", p.util_rev));
}

#[test]
fn test_save_fails_on_unresolvable_import_without_writing() {
    let p = project().unwrap();
    p.ws.write_project_file("broken/broken.go", "package broken\n\nimport \"github.com/acme/missing\"\n")
        .unwrap();

    p.ws.gdm()
        .args(["save", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot resolve import \"github.com/acme/missing\""));

    assert!(!p.ws.project.join("Godeps").exists());
}

#[test]
fn test_saved_manifest_restores_after_drift() {
    let p = project().unwrap();
    p.ws.gdm().args(["save", "--offline"]).assert().success();

    // Move the lib checkout forward past the saved revision.
    p.lib_upstream.commit_file("extra.go", "package lib\n", "drift").unwrap();
    p.lib.checkout("main").ok();
    std::process::Command::new("git")
        .args(["pull", "-q", "--ff-only"])
        .current_dir(p.lib.repo_path())
        .status()
        .unwrap();
    assert_ne!(p.lib.head().unwrap(), p.lib_rev);

    p.ws.gdm().args(["restore", "--offline"]).assert().success();
    assert_head(p.lib.repo_path(), &p.lib_rev);
    assert_head(p.util.repo_path(), &p.util_rev);
}

#[test]
fn test_save_follows_dependency_vendor_dirs_and_platform_files() {
    let p = project().unwrap();
    let (vlib_upstream, vlib_rev) = p
        .ws
        .create_upstream(
            "vlib",
            &[
                ("vlib.go", "package vlib\n\nimport \"github.com/other/hidden\"\n\nconst Name = hidden.Name\n"),
                ("vlib_plan9.go", "package vlib\n\nimport \"golang.org/x/sys/plan9\"\n"),
                ("vendor/github.com/other/hidden/hidden.go", "package hidden\n\nconst Name = \"hidden\"\n"),
            ],
        )
        .unwrap();
    p.ws.install(&vlib_upstream, "github.com/acme/vlib").unwrap();
    p.ws.write_project_file("extra/extra.go", "package extra\n\nimport \"github.com/acme/vlib\"\n").unwrap();

    p.ws.gdm().args(["save", "--offline"]).assert().success();

    assert_eq!(
        p.ws.read_godeps().unwrap(),
        format!("{LIB} {}\n{UTIL} {}\ngithub.com/acme/vlib {vlib_rev}\n", p.lib_rev, p.util_rev)
    );
}
