//! Environment, configuration and argument handling of the binary.

use predicates::prelude::*;

use crate::common::GoWorkspace;
use crate::fixtures::{UTIL, project};

#[test]
fn test_help_lists_commands_and_aliases() {
    let ws = GoWorkspace::new().unwrap();
    ws.gdm()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("save"))
        .stdout(predicate::str::contains("restore"))
        .stdout(predicate::str::contains("vendor"))
        .stdout(predicate::str::contains("bootstrap"));
}

#[test]
fn test_gopath_must_be_set() {
    let ws = GoWorkspace::new().unwrap();
    ws.gdm()
        .env_remove("GOPATH")
        .arg("save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GOPATH must be set to use gdm"));
}

#[test]
fn test_working_dir_must_be_inside_gopath() {
    let ws = GoWorkspace::new().unwrap();
    ws.gdm_in(&ws.upstreams)
        .arg("save")
        .assert()
        .failure()
        .stderr(predicate::str::contains("can only be executed within a directory in the GOPATH"));
}

#[test]
fn test_banner_shows_working_dir_and_gopath() {
    let p = project().unwrap();
    p.ws.gdm()
        .args(["save", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Go Dependency Manager"))
        .stdout(predicate::str::contains(format!("= working dir: {}", p.ws.project.display())))
        .stdout(predicate::str::contains(p.ws.gopath.display().to_string()));
}

#[test]
fn test_quiet_suppresses_status_output() {
    let p = project().unwrap();
    p.ws.gdm()
        .args(["--quiet", "save", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(p.ws.project.join("Godeps").is_file());
}

#[test]
fn test_project_settings_file_renames_manifest() {
    let p = project().unwrap();
    p.ws.write_project_file(".gdm.toml", "deps_file = \"deps.txt\"\noffline = true\n").unwrap();

    p.ws.gdm().arg("save").assert().success();

    assert!(!p.ws.project.join("Godeps").exists());
    let deps = std::fs::read_to_string(p.ws.project.join("deps.txt")).unwrap();
    assert!(deps.contains(UTIL));
}

#[test]
fn test_invalid_settings_file_is_rejected() {
    let p = project().unwrap();
    p.ws.write_project_file(".gdm.toml", "no_such_setting = 1\n").unwrap();

    p.ws.gdm().args(["save", "--offline"]).assert().failure();
}

#[test]
fn test_explicit_config_must_exist() {
    let p = project().unwrap();
    p.ws.gdm()
        .args(["save", "--offline", "--config", "/nonexistent/gdm.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
