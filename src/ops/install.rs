//! Install a workflow from a package source.

use std::path::Path;

use tracing::{info, warn};

use crate::app::AppContext;
use crate::collision::{Scope, detect_collisions};
use crate::config::{ConfigDoc, WorkflowsSection};
use crate::error::{Result, WfmError};
use crate::manifest::{WorkflowManifest, derive_workflow_name};
use crate::model::{InstalledFile, PackageSource, SkillSyncStatus, WorkflowEntry};
use crate::ops::OpReport;
use crate::sync;
use crate::utils::remove_dir_idempotent;

/// Install the workflow described by a CLI package spec.
///
/// Registry sources are conflict-checked before fetching to avoid wasted
/// work; git and local sources only know their identity post-fetch and are
/// checked after. Any failure after the fetch unwinds the files this
/// install placed and removes the fetched package (best-effort, and only
/// when no installed workflow still references it) before the error
/// propagates; the config is only committed when every step succeeded.
pub fn install(ctx: &AppContext, spec: &str, force: bool) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;
    let source = PackageSource::parse(spec);

    if let Some(identity) = source.known_identity() {
        check_identity(&section, identity, force)?;
    }

    let resolved = ctx.pm.add(&source)?;

    // If an installed workflow already references this package (duplicate
    // identity, or a --force reinstall that fails midway), the fetch must
    // survive the failure: the persisted entry still resolves through it.
    let name = derive_workflow_name(&resolved.package);
    let referenced = section.installed.contains_key(&name)
        || section.find_by_package(&resolved.package).is_some();

    match install_fetched(ctx, &mut doc, &mut section, &resolved, force) {
        Ok(report) => Ok(report),
        Err(err) => {
            if !referenced {
                // Never leave a half-installed package behind.
                let _ = ctx.pm.remove(&resolved.package);
            }
            Err(err)
        }
    }
}

fn check_identity(section: &WorkflowsSection, package: &str, force: bool) -> Result<()> {
    if force {
        return Ok(());
    }
    let name = derive_workflow_name(package);
    if section.installed.contains_key(&name) {
        return Err(WfmError::AlreadyInstalled(format!(
            "workflow '{name}' (use --force to reinstall)"
        )));
    }
    if let Some((other, _)) = section.find_by_package(package) {
        return Err(WfmError::AlreadyInstalled(format!(
            "package '{package}' already installed as workflow '{other}'"
        )));
    }
    Ok(())
}

fn install_fetched(
    ctx: &AppContext,
    doc: &mut ConfigDoc,
    section: &mut WorkflowsSection,
    resolved: &crate::model::ResolvedPackage,
    force: bool,
) -> Result<OpReport> {
    let name = derive_workflow_name(&resolved.package);

    // Git/local sources only know their identity now.
    check_identity(section, &resolved.package, force)?;

    if force {
        if let Some(prior) = section.installed.get(&name).cloned() {
            let prior_sync = prior.skill_sync.clone().unwrap_or_default();
            sync::unsync(&ctx.live_root, &prior.skills, &prior_sync)?;
            sync::remove_files(&ctx.live_root, &prior.files)?;
            section.deactivate(&name);
            section.installed.remove(&name);
        }
    }

    let manifest = WorkflowManifest::load(&resolved.root)?;
    let declared = manifest.declared_names();

    let mut report = OpReport::default();
    report.warn_all(detect_collisions(
        &name,
        &declared,
        doc,
        section,
        &ctx.live_root,
        Scope::AllInstalled,
        None,
    ));

    let placed = sync::place_files(
        &ctx.live_root,
        &resolved.root,
        &sync::manifest_mappings(&manifest),
        &name,
        &[],
        section,
    )?;

    // Every file in `placed.files` was created by this call (prior records
    // are empty at install), so a later failure can unwind them cleanly.
    let synced = match sync::sync(&ctx.live_root, &resolved.root, &manifest.skills) {
        Ok(synced) => synced,
        Err(err) => {
            unplace(&ctx.live_root, &placed.files);
            return Err(err);
        }
    };
    report.warn_all(placed.warnings);
    report.warn_all(synced.warnings.clone());

    let mut entry = WorkflowEntry::new(resolved.package.clone(), resolved.version.clone());
    entry.agents = declared.agents;
    entry.commands = declared.commands;
    entry.skills = declared.skills;
    entry.files = placed.files.clone();
    entry.skill_sync = Some(synced.entries.clone());

    section.installed.insert(name.clone(), entry);
    section.activate(&name);
    if let Err(err) = doc.set_workflows(section).and_then(|()| doc.write()) {
        for (skill, status) in &synced.entries {
            if *status != SkillSyncStatus::Synced {
                continue;
            }
            if let Err(rollback_err) =
                remove_dir_idempotent(&ctx.live_root.join("skills").join(skill))
            {
                warn!(skill = %skill, %rollback_err, "rollback: failed to remove synced skill");
            }
        }
        unplace(&ctx.live_root, &placed.files);
        return Err(err);
    }

    info!(workflow = %name, version = %resolved.version, "workflow installed");
    report.changed = true;
    report.note(format!(
        "installed workflow '{name}' ({} {})",
        resolved.package, resolved.version
    ));
    Ok(report)
}

/// Best-effort removal of files this install created.
fn unplace(live_root: &Path, files: &[InstalledFile]) {
    for file in files {
        if let Err(err) = std::fs::remove_file(live_root.join(&file.dest)) {
            warn!(dest = %file.dest, %err, "rollback: failed to remove placed file");
        }
    }
}
