//! Update installed workflows to their latest package versions.

use chrono::Utc;
use tracing::info;

use crate::app::AppContext;
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::manifest::WorkflowManifest;
use crate::model::InstalledFile;
use crate::ops::OpReport;
use crate::sync;

/// Update one workflow, or all installed workflows when `name` is None.
///
/// A workflow whose upstream version and declared names are unchanged is
/// reported as such and causes zero filesystem writes. Everything else goes
/// through the same ownership- and integrity-gated file placement as
/// install, plus a three-way skill resync when the workflow is active.
pub fn update(ctx: &AppContext, name: Option<&str>) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;

    let targets: Vec<String> = match name {
        Some(n) => {
            section.entry(n)?;
            vec![n.to_string()]
        }
        None => section.installed.keys().cloned().collect(),
    };

    let mut report = OpReport::default();
    for target in &targets {
        update_one(ctx, &mut section, target, &mut report)?;
    }

    if report.changed {
        doc.set_workflows(&section)?;
        doc.write()?;
    }
    Ok(report)
}

fn update_one(
    ctx: &AppContext,
    section: &mut crate::config::WorkflowsSection,
    name: &str,
    report: &mut OpReport,
) -> Result<()> {
    let entry = section.entry(name)?.clone();
    let resolved = ctx.pm.update(&entry.package)?;
    let manifest = WorkflowManifest::load(&resolved.root)?;
    let declared = manifest.declared_names();

    let unchanged = resolved.version == entry.version
        && declared.agents == entry.agents
        && declared.commands == entry.commands
        && declared.skills == entry.skills;
    if unchanged {
        report.note(format!("workflow '{name}' is unchanged ({})", entry.version));
        return Ok(());
    }

    let mappings = sync::manifest_mappings(&manifest);
    let placed = sync::place_files(
        &ctx.live_root,
        &resolved.root,
        &mappings,
        name,
        &entry.files,
        section,
    )?;
    report.warn_all(placed.warnings);

    // Files dropped from the new manifest: delete clean copies, keep
    // modified ones (with a warning) as user content, and stop tracking.
    let dropped: Vec<InstalledFile> = entry
        .files
        .iter()
        .filter(|f| !mappings.iter().any(|m| m.dest == f.dest))
        .cloned()
        .collect();
    let removal = sync::remove_files(&ctx.live_root, &dropped)?;
    report.warn_all(removal.warnings);

    let skill_sync = if section.is_active(name) {
        let prior = entry.skill_sync.clone().unwrap_or_default();
        let outcome = sync::resync(
            &ctx.live_root,
            &resolved.root,
            &manifest.skills,
            &entry.skills,
            &prior,
        )?;
        report.warn_all(outcome.warnings);
        Some(outcome.entries)
    } else {
        None
    };

    if let Some(entry) = section.installed.get_mut(name) {
        entry.version = resolved.version.clone();
        entry.agents = declared.agents;
        entry.commands = declared.commands;
        entry.skills = declared.skills;
        entry.files = placed.files;
        entry.skill_sync = skill_sync;
        entry.updated_at = Some(Utc::now());
    }

    info!(workflow = %name, version = %resolved.version, "workflow updated");
    report.changed = true;
    report.note(format!(
        "updated workflow '{name}' to {}",
        resolved.version
    ));
    Ok(())
}
