//! Filesystem utilities.
//!
//! Helper functions for file and directory operations.

use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Result, WfmError};

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Recursively copy a directory. The destination must not already exist.
pub fn copy_dir(src: &Path, dest: &Path) -> Result<()> {
    if dest.exists() {
        return Err(WfmError::Config(format!(
            "copy destination already exists: {}",
            dest.display()
        )));
    }
    for entry in WalkDir::new(src) {
        let entry = entry
            .map_err(|err| WfmError::Config(format!("walk {}: {err}", src.display())))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| WfmError::Config(format!("strip prefix: {err}")))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.file_type().is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target).map_err(|err| {
                WfmError::Config(format!("copy {}: {err}", entry.path().display()))
            })?;
        }
    }
    Ok(())
}

/// Remove a directory tree. Missing-on-disk is treated as already removed.
pub fn remove_dir_idempotent(path: &Path) -> Result<bool> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .map_err(|err| WfmError::Config(format!("remove {}: {err}", path.display())))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn copy_dir_copies_nested_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("SKILL.md"), "marker").unwrap();
        fs::write(src.join("nested/data.txt"), "data").unwrap();

        let dest = dir.path().join("dest");
        copy_dir(&src, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("SKILL.md")).unwrap(), "marker");
        assert_eq!(
            fs::read_to_string(dest.join("nested/data.txt")).unwrap(),
            "data"
        );
    }

    #[test]
    fn copy_dir_refuses_existing_destination() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dest");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&dest).unwrap();
        assert!(copy_dir(&src, &dest).is_err());
    }

    #[test]
    fn remove_dir_idempotent_on_missing() {
        let dir = tempdir().unwrap();
        let removed = remove_dir_idempotent(&dir.path().join("absent")).unwrap();
        assert!(!removed);
    }
}
