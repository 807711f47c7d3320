//! Directory helpers.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Ensures a directory exists, creating it and its parents when needed.
///
/// # Errors
///
/// Fails if the path exists but is not a directory, or creation fails.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Copies the tree at `src` into `dst`, skipping every directory whose name
/// is listed in `skip_dirs` (at any depth).
///
/// Regular files are copied; symlinks and other special files are skipped.
/// Returns the number of files copied.
pub fn copy_dir_filtered(src: &Path, dst: &Path, skip_dirs: &[&str]) -> Result<usize> {
    ensure_dir(dst)?;
    let mut copied = 0;

    let walker = WalkDir::new(src).sort_by_file_name().into_iter().filter_entry(|entry| {
        entry.depth() == 0
            || !(entry.file_type().is_dir()
                && skip_dirs.iter().any(|skip| entry.file_name() == std::ffi::OsStr::new(skip)))
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", src.display()))?;
        let rel = entry.path().strip_prefix(src).with_context(|| {
            format!("{} is not inside {}", entry.path().display(), src.display())
        })?;
        let target = dst.join(rel);

        if entry.file_type().is_dir() {
            ensure_dir(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("Failed to copy file from {} to {}", entry.path().display(), target.display())
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

/// Recursively removes a directory; a missing directory is not an error.
pub fn remove_dir_all(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_ensure_dir() {
        let temp = tempdir().unwrap();
        let test_dir = temp.path().join("a/b");

        ensure_dir(&test_dir).unwrap();
        assert!(test_dir.is_dir());
        ensure_dir(&test_dir).unwrap();

        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();
        assert!(ensure_dir(&file).is_err());
    }

    #[test]
    fn test_copy_dir_filtered_skips_listed_dirs() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join(".git/objects")).unwrap();
        std::fs::create_dir_all(src.join("sub/.hg")).unwrap();
        std::fs::write(src.join("a.go"), "package a").unwrap();
        std::fs::write(src.join(".git/HEAD"), "ref").unwrap();
        std::fs::write(src.join("sub/b.go"), "package sub").unwrap();
        std::fs::write(src.join("sub/.hg/store"), "x").unwrap();

        let dst = temp.path().join("dst");
        let copied = copy_dir_filtered(&src, &dst, &[".git", ".hg"]).unwrap();

        assert_eq!(copied, 2);
        assert!(dst.join("a.go").is_file());
        assert!(dst.join("sub/b.go").is_file());
        assert!(!dst.join(".git").exists());
        assert!(!dst.join("sub/.hg").exists());
    }

    #[test]
    fn test_remove_dir_all_missing_is_ok() {
        let temp = tempdir().unwrap();
        remove_dir_all(&temp.path().join("missing")).unwrap();
    }
}
