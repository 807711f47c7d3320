//! A project importing two upstream repositories.
//!
//! ```text
//! github.com/me/app            imports fmt, github.com/acme/lib/sub, ./internal
//! github.com/acme/lib/sub      imports github.com/acme/util
//! github.com/acme/util         imports nothing
//! ```

use anyhow::Result;

use crate::common::{GoWorkspace, TestGit};

pub const LIB: &str = "github.com/acme/lib";
pub const UTIL: &str = "github.com/acme/util";

pub const MAIN_GO: &str = r#"package main

import (
	"fmt"

	"github.com/acme/lib/sub"
	"github.com/me/app/internal"
)

func main() {
	fmt.Println(sub.Name, internal.Name)
}
"#;

pub struct Project {
    pub ws: GoWorkspace,
    pub lib_upstream: TestGit,
    pub util_upstream: TestGit,
    pub lib: TestGit,
    pub util: TestGit,
    pub lib_rev: String,
    pub util_rev: String,
}

/// Workspace with the project sources and both dependencies checked out.
pub fn project() -> Result<Project> {
    let ws = GoWorkspace::new()?;
    ws.write_project_file("main.go", MAIN_GO)?;
    ws.write_project_file("internal/internal.go", "package internal\n\nconst Name = \"internal\"\n")?;

    let (lib_upstream, lib_rev) = ws.create_upstream(
        "lib",
        &[
            ("lib.go", "package lib\n"),
            (
                "sub/sub.go",
                "package sub\n\nimport \"github.com/acme/util\"\n\nconst Name = util.Name\n",
            ),
        ],
    )?;
    let (util_upstream, util_rev) =
        ws.create_upstream("util", &[("util.go", "package util\n\nconst Name = \"util\"\n")])?;

    let lib = ws.install(&lib_upstream, LIB)?;
    let util = ws.install(&util_upstream, UTIL)?;

    Ok(Project {
        ws,
        lib_upstream,
        util_upstream,
        lib,
        util,
        lib_rev,
        util_rev,
    })
}
