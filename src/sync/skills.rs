//! Skill directory synchronization.
//!
//! Copies skill directories from a package into the live skills directory
//! and removes them again, tracking per-skill status. A directory that
//! already existed before sync is `skipped` and never touched afterwards;
//! only `synced` copies are owned by this system.

use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::model::{SKILL_MARKER, SkillSyncMap, SkillSyncStatus};
use crate::utils::{copy_dir, ensure_dir, remove_dir_idempotent};

#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub entries: SkillSyncMap,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct UnsyncOutcome {
    pub removed: Vec<String>,
    pub kept: Vec<String>,
    pub warnings: Vec<String>,
}

fn skill_name(rel_path: &str) -> String {
    Path::new(rel_path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| rel_path.to_string())
}

/// Copy each declared skill directory into the live tree.
///
/// `skill_paths` are package-relative directory paths; the skill name is the
/// directory basename.
pub fn sync(live_root: &Path, package_root: &Path, skill_paths: &[String]) -> Result<SyncOutcome> {
    let mut outcome = SyncOutcome::default();
    for rel in skill_paths {
        let name = skill_name(rel);
        sync_one(live_root, package_root, rel, &name, &mut outcome)?;
    }
    Ok(outcome)
}

fn sync_one(
    live_root: &Path,
    package_root: &Path,
    rel: &str,
    name: &str,
    outcome: &mut SyncOutcome,
) -> Result<()> {
    let src = package_root.join(rel);
    if !src.is_dir() {
        outcome
            .warnings
            .push(format!("skill '{name}': source directory {rel} missing; skipped"));
        return Ok(());
    }
    if !src.join(SKILL_MARKER).is_file() {
        outcome
            .warnings
            .push(format!("skill '{name}': missing {SKILL_MARKER} marker; skipped"));
        return Ok(());
    }

    let dest = live_root.join("skills").join(name);
    if dest.exists() {
        outcome.warnings.push(format!(
            "skill '{name}': skills/{name} already exists; leaving it untouched"
        ));
        outcome
            .entries
            .insert(name.to_string(), SkillSyncStatus::Skipped);
        return Ok(());
    }

    ensure_dir(live_root.join("skills"))?;
    copy_dir(&src, &dest)?;
    debug!(skill = name, "skill synced");
    outcome
        .entries
        .insert(name.to_string(), SkillSyncStatus::Synced);
    Ok(())
}

/// Remove the live copies this system owns.
///
/// Only names with a prior `synced` entry are deleted; `skipped` or untracked
/// names are kept. A copy already missing on disk counts as removed.
pub fn unsync(live_root: &Path, names: &[String], prior: &SkillSyncMap) -> Result<UnsyncOutcome> {
    let mut outcome = UnsyncOutcome::default();
    for name in names {
        match prior.get(name) {
            Some(SkillSyncStatus::Synced) => {
                remove_dir_idempotent(&live_root.join("skills").join(name))?;
                debug!(skill = %name, "skill unsynced");
                outcome.removed.push(name.clone());
            }
            Some(SkillSyncStatus::Skipped) | None => {
                outcome.kept.push(name.clone());
            }
        }
    }
    Ok(outcome)
}

/// Three-way reconciliation used by update and switch.
///
/// Names dropped from the new set are unsynced; new names are synced;
/// continuing `synced` copies are refreshed (deleted and recopied) and
/// continuing `skipped` directories are left alone while they still exist.
pub fn resync(
    live_root: &Path,
    package_root: &Path,
    new_skill_paths: &[String],
    old_names: &[String],
    prior: &SkillSyncMap,
) -> Result<SyncOutcome> {
    let new_names: Vec<String> = new_skill_paths.iter().map(|p| skill_name(p)).collect();

    let dropped: Vec<String> = old_names
        .iter()
        .filter(|n| !new_names.contains(n))
        .cloned()
        .collect();
    let dropped_outcome = unsync(live_root, &dropped, prior)?;

    let mut outcome = SyncOutcome {
        entries: SkillSyncMap::new(),
        warnings: dropped_outcome.warnings,
    };

    for rel in new_skill_paths {
        let name = skill_name(rel);
        match prior.get(&name) {
            Some(SkillSyncStatus::Synced) => {
                let src = package_root.join(rel);
                if !src.is_dir() || !src.join(SKILL_MARKER).is_file() {
                    // Upstream lost the skill content; keep the live copy
                    // rather than deleting what we cannot replace.
                    outcome.warnings.push(format!(
                        "skill '{name}': new source invalid; keeping existing copy"
                    ));
                    outcome
                        .entries
                        .insert(name.clone(), SkillSyncStatus::Synced);
                    continue;
                }
                remove_dir_idempotent(&live_root.join("skills").join(&name))?;
                sync_one(live_root, package_root, rel, &name, &mut outcome)?;
            }
            Some(SkillSyncStatus::Skipped) => {
                if live_root.join("skills").join(&name).exists() {
                    // Blocking directory still present: permanent skip.
                    outcome
                        .entries
                        .insert(name.clone(), SkillSyncStatus::Skipped);
                } else {
                    sync_one(live_root, package_root, rel, &name, &mut outcome)?;
                }
            }
            None => {
                sync_one(live_root, package_root, rel, &name, &mut outcome)?;
            }
        }
    }

    Ok(outcome)
}
