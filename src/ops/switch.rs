//! Switch the active set to exactly the given workflows.
//!
//! Disables every active non-target, then enables every inactive target, and
//! commits once. Filesystem mutations are journaled; if a later step fails,
//! completed sync/unsync operations are reversed in opposite order before
//! the error surfaces, so the live tree matches the still-uncommitted config.

use std::path::PathBuf;

use tracing::{info, warn};

use crate::app::AppContext;
use crate::collision::{Scope, detect_collisions};
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::manifest::{DeclaredNames, WorkflowManifest};
use crate::model::{Entity, SkillSyncMap, SkillSyncStatus};
use crate::ops::OpReport;
use crate::sync;
use crate::utils::{copy_dir, remove_dir_idempotent};

/// A completed filesystem mutation, for reversal on failure.
enum Applied {
    SkillSynced {
        skill: String,
    },
    SkillUnsynced {
        skill: String,
        rel_path: String,
        package_root: PathBuf,
    },
}

pub fn switch(ctx: &AppContext, targets: &[String]) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;

    for target in targets {
        section.entry(target)?;
    }

    let to_disable: Vec<String> = section
        .active
        .iter()
        .filter(|n| !targets.contains(n))
        .cloned()
        .collect();
    let to_enable: Vec<String> = targets
        .iter()
        .filter(|n| !section.is_active(n))
        .cloned()
        .collect();

    let mut report = OpReport::default();
    if to_disable.is_empty() && to_enable.is_empty() {
        report.note("requested workflows are already active".to_string());
        return Ok(report);
    }

    let mut journal: Vec<Applied> = Vec::new();
    match apply(ctx, &mut section, &doc, &to_disable, &to_enable, &mut journal, &mut report) {
        Ok(()) => {}
        Err(err) => {
            rollback(ctx, journal);
            return Err(err);
        }
    }

    doc.set_workflows(&section)?;
    doc.write()?;

    info!(?targets, "active set switched");
    report.changed = true;
    report.note(format!("active workflows: {}", targets.join(", ")));
    Ok(report)
}

fn apply(
    ctx: &AppContext,
    section: &mut crate::config::WorkflowsSection,
    doc: &ConfigDoc,
    to_disable: &[String],
    to_enable: &[String],
    journal: &mut Vec<Applied>,
    report: &mut OpReport,
) -> Result<()> {
    // Disable first so enable-time collision checks only see workflows that
    // will remain active.
    for name in to_disable {
        let entry = section.entry(name)?.clone();
        let prior_sync = entry.skill_sync.clone().unwrap_or_default();
        let resolved = ctx.pm.resolve(&entry.package)?;
        let manifest = WorkflowManifest::load(&resolved.root)?;
        let paths = skill_paths_by_name(&manifest);

        for skill in &entry.skills {
            let outcome = sync::unsync(&ctx.live_root, std::slice::from_ref(skill), &prior_sync)?;
            report.warn_all(outcome.warnings);
            if outcome.removed.contains(skill) {
                journal.push(Applied::SkillUnsynced {
                    skill: skill.clone(),
                    rel_path: paths
                        .get(skill)
                        .cloned()
                        .unwrap_or_else(|| format!("skills/{skill}")),
                    package_root: resolved.root.clone(),
                });
            }
        }

        section.deactivate(name);
        if let Some(entry) = section.installed.get_mut(name) {
            entry.skill_sync = None;
        }
        report.note(format!("disabled workflow '{name}'"));
    }

    for name in to_enable {
        let entry = section.entry(name)?.clone();
        let resolved = ctx.pm.resolve(&entry.package)?;
        let manifest = WorkflowManifest::load(&resolved.root)?;

        let declared = DeclaredNames {
            agents: entry.declared(Entity::Agent).to_vec(),
            commands: entry.declared(Entity::Command).to_vec(),
            skills: entry.declared(Entity::Skill).to_vec(),
        };
        report.warn_all(detect_collisions(
            name,
            &declared,
            doc,
            section,
            &ctx.live_root,
            Scope::EnabledOnly,
            entry.skill_sync.as_ref(),
        ));

        let mut entries = SkillSyncMap::new();
        for rel in &manifest.skills {
            let outcome = sync::sync(&ctx.live_root, &resolved.root, std::slice::from_ref(rel))?;
            report.warn_all(outcome.warnings);
            for (skill, status) in outcome.entries {
                if status == SkillSyncStatus::Synced {
                    journal.push(Applied::SkillSynced {
                        skill: skill.clone(),
                    });
                }
                entries.insert(skill, status);
            }
        }

        if let Some(entry) = section.installed.get_mut(name) {
            entry.skill_sync = Some(entries);
        }
        section.activate(name);
        report.note(format!("enabled workflow '{name}'"));
    }

    Ok(())
}

/// Reverse completed filesystem mutations, newest first. Best-effort: a
/// rollback failure is logged, not surfaced over the original error.
fn rollback(ctx: &AppContext, journal: Vec<Applied>) {
    for action in journal.into_iter().rev() {
        match action {
            Applied::SkillSynced { skill } => {
                if let Err(err) =
                    remove_dir_idempotent(&ctx.live_root.join("skills").join(&skill))
                {
                    warn!(skill = %skill, %err, "rollback: failed to remove synced skill");
                }
            }
            Applied::SkillUnsynced {
                skill,
                rel_path,
                package_root,
            } => {
                let dest = ctx.live_root.join("skills").join(&skill);
                if let Err(err) = copy_dir(&package_root.join(&rel_path), &dest) {
                    warn!(skill = %skill, %err, "rollback: failed to restore unsynced skill");
                }
            }
        }
    }
}

fn skill_paths_by_name(
    manifest: &WorkflowManifest,
) -> std::collections::BTreeMap<String, String> {
    manifest
        .skills
        .iter()
        .filter_map(|rel| {
            std::path::Path::new(rel)
                .file_name()
                .map(|n| (n.to_string_lossy().to_string(), rel.clone()))
        })
        .collect()
}
