//! Per-file integrity classification.
//!
//! Re-hashes a workflow's tracked files against the hashes recorded at last
//! sync. Purely observational; this is the sole authority other components
//! consult before overwriting or deleting a tracked file.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::hash::hash_file;
use crate::model::{InstalledFile, WorkflowEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntegrityStatus {
    Clean,
    Modified,
    Deleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileIntegrity {
    pub dest: String,
    pub status: IntegrityStatus,
}

/// Classify every tracked file of a workflow entry.
///
/// File hashing fans out across files; each probe targets a distinct path
/// and the results are joined in input order.
pub fn check_integrity(live_root: &Path, entry: &WorkflowEntry) -> Result<Vec<FileIntegrity>> {
    check_files(live_root, &entry.files)
}

/// Classify an explicit file list (used mid-update against old records).
pub fn check_files(live_root: &Path, files: &[InstalledFile]) -> Result<Vec<FileIntegrity>> {
    files
        .par_iter()
        .map(|file| {
            let path = live_root.join(&file.dest);
            let status = if !path.exists() {
                IntegrityStatus::Deleted
            } else if hash_file(&path)? == file.hash {
                IntegrityStatus::Clean
            } else {
                IntegrityStatus::Modified
            };
            Ok(FileIntegrity {
                dest: file.dest.clone(),
                status,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::hash::hash_bytes;

    fn tracked(dest: &str, content: &[u8]) -> InstalledFile {
        InstalledFile {
            source: dest.to_string(),
            dest: dest.to_string(),
            hash: hash_bytes(content),
        }
    }

    #[test]
    fn fresh_files_are_clean() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("agents")).unwrap();
        std::fs::write(dir.path().join("agents/a.md"), b"alpha").unwrap();
        std::fs::write(dir.path().join("agents/b.md"), b"beta").unwrap();

        let files = vec![tracked("agents/a.md", b"alpha"), tracked("agents/b.md", b"beta")];
        let statuses = check_files(dir.path(), &files).unwrap();
        assert!(statuses.iter().all(|f| f.status == IntegrityStatus::Clean));
    }

    #[test]
    fn edited_file_is_modified_others_clean() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("agents")).unwrap();
        std::fs::write(dir.path().join("agents/a.md"), b"alpha").unwrap();
        std::fs::write(dir.path().join("agents/b.md"), b"edited").unwrap();

        let files = vec![tracked("agents/a.md", b"alpha"), tracked("agents/b.md", b"beta")];
        let statuses = check_files(dir.path(), &files).unwrap();
        assert_eq!(statuses[0].status, IntegrityStatus::Clean);
        assert_eq!(statuses[1].status, IntegrityStatus::Modified);
    }

    #[test]
    fn missing_file_is_deleted() {
        let dir = tempdir().unwrap();
        let files = vec![tracked("agents/gone.md", b"alpha")];
        let statuses = check_files(dir.path(), &files).unwrap();
        assert_eq!(statuses[0].status, IntegrityStatus::Deleted);
    }
}
