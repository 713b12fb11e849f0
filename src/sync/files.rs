//! Tracked file placement.
//!
//! Copies agent and command documents from a package into the live tree and
//! removes them again. Every write is gated on ownership (at most one
//! workflow per destination) and on integrity status (never overwrite or
//! delete content the operator has modified).

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::config::WorkflowsSection;
use crate::error::{Result, WfmError};
use crate::hash::{hash_bytes, hash_file};
use crate::integrity::IntegrityStatus;
use crate::manifest::WorkflowManifest;
use crate::model::InstalledFile;

/// One package-source to live-tree-destination pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMapping {
    pub source: String,
    pub dest: String,
}

/// Destinations for a manifest's agent and command documents: the file name
/// under the conventional per-entity directory.
#[must_use]
pub fn manifest_mappings(manifest: &WorkflowManifest) -> Vec<FileMapping> {
    let mut mappings = Vec::new();
    for (paths, dir) in [(&manifest.agents, "agents"), (&manifest.commands, "commands")] {
        for rel in paths.iter() {
            if let Some(file_name) = Path::new(rel).file_name() {
                mappings.push(FileMapping {
                    source: rel.clone(),
                    dest: format!("{dir}/{}", file_name.to_string_lossy()),
                });
            }
        }
    }
    mappings
}

#[derive(Debug, Default)]
pub struct PlaceOutcome {
    /// The workflow's tracked files after placement.
    pub files: Vec<InstalledFile>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RemoveOutcome {
    pub removed: Vec<String>,
    pub kept: Vec<String>,
    pub warnings: Vec<String>,
}

/// Place a workflow's files into the live tree.
///
/// Ownership is validated for the whole set before anything is written, so
/// a destination owned by a different workflow is a hard
/// [`WfmError::Conflict`] with nothing committed. Per destination:
/// - untracked but present on disk: unmanaged user content, skip with a
///   warning and do not record ownership;
/// - tracked by this workflow: overwrite only when integrity is clean and
///   the content actually changed; locally modified or deleted files are
///   skipped with a warning and keep their prior record;
/// - otherwise: copy and record the content hash.
///
/// A later failure (unreadable source, write error) removes the files this
/// call created before the error surfaces; a partial placement never
/// outlives the call.
pub fn place_files(
    live_root: &Path,
    package_root: &Path,
    mappings: &[FileMapping],
    workflow_name: &str,
    prior_files: &[InstalledFile],
    section: &WorkflowsSection,
) -> Result<PlaceOutcome> {
    for mapping in mappings {
        if let Some(owner) = section.owner_of(&mapping.dest, Some(workflow_name)) {
            return Err(WfmError::Conflict(format!(
                "{} is owned by workflow '{owner}'; remove it first",
                mapping.dest
            )));
        }
    }

    let mut written: Vec<std::path::PathBuf> = Vec::new();
    match place_all(live_root, package_root, mappings, prior_files, &mut written) {
        Ok(outcome) => Ok(outcome),
        Err(err) => {
            for path in written {
                let _ = fs::remove_file(&path);
            }
            Err(err)
        }
    }
}

fn place_all(
    live_root: &Path,
    package_root: &Path,
    mappings: &[FileMapping],
    prior_files: &[InstalledFile],
    written: &mut Vec<std::path::PathBuf>,
) -> Result<PlaceOutcome> {
    let mut outcome = PlaceOutcome::default();

    for mapping in mappings {
        let src = package_root.join(&mapping.source);
        let data = fs::read(&src).map_err(|err| {
            WfmError::Manifest(format!("read package file {}: {err}", src.display()))
        })?;
        let new_hash = hash_bytes(&data);
        let dest = live_root.join(&mapping.dest);
        let prior = prior_files.iter().find(|f| f.dest == mapping.dest);

        match prior {
            None => {
                if dest.exists() {
                    outcome.warnings.push(format!(
                        "{}: unmanaged file already exists; not overwriting",
                        mapping.dest
                    ));
                    continue;
                }
                write_file(&dest, &data)?;
                written.push(dest.clone());
                debug!(dest = %mapping.dest, "file placed");
                outcome.files.push(InstalledFile {
                    source: mapping.source.clone(),
                    dest: mapping.dest.clone(),
                    hash: new_hash,
                });
            }
            Some(record) => {
                let status = if !dest.exists() {
                    IntegrityStatus::Deleted
                } else if hash_file(&dest)? == record.hash {
                    IntegrityStatus::Clean
                } else {
                    IntegrityStatus::Modified
                };
                match status {
                    IntegrityStatus::Modified => {
                        outcome.warnings.push(format!(
                            "{}: locally modified; keeping your version",
                            mapping.dest
                        ));
                        outcome.files.push(record.clone());
                    }
                    IntegrityStatus::Deleted => {
                        outcome.warnings.push(format!(
                            "{}: locally deleted; not restoring",
                            mapping.dest
                        ));
                        outcome.files.push(record.clone());
                    }
                    IntegrityStatus::Clean => {
                        if new_hash != record.hash {
                            write_file(&dest, &data)?;
                            debug!(dest = %mapping.dest, "file refreshed");
                        }
                        outcome.files.push(InstalledFile {
                            source: mapping.source.clone(),
                            dest: mapping.dest.clone(),
                            hash: new_hash,
                        });
                    }
                }
            }
        }
    }

    Ok(outcome)
}

/// Remove tracked files from the live tree.
///
/// Only files whose integrity is clean are deleted; locally modified files
/// are kept with a warning, already-deleted files need no action.
pub fn remove_files(live_root: &Path, files: &[InstalledFile]) -> Result<RemoveOutcome> {
    let mut outcome = RemoveOutcome::default();
    for file in files {
        let path = live_root.join(&file.dest);
        if !path.exists() {
            outcome.removed.push(file.dest.clone());
            continue;
        }
        if hash_file(&path)? == file.hash {
            fs::remove_file(&path).map_err(|err| {
                WfmError::Config(format!("remove {}: {err}", path.display()))
            })?;
            debug!(dest = %file.dest, "file removed");
            outcome.removed.push(file.dest.clone());
        } else {
            outcome.warnings.push(format!(
                "{}: locally modified; keeping your version",
                file.dest
            ));
            outcome.kept.push(file.dest.clone());
        }
    }
    Ok(outcome)
}

fn write_file(dest: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, data)
        .map_err(|err| WfmError::Config(format!("write {}: {err}", dest.display())))?;
    Ok(())
}
