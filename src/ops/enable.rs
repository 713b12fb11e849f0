//! Enable an installed workflow.

use tracing::info;

use crate::app::AppContext;
use crate::collision::{Scope, detect_collisions};
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::manifest::WorkflowManifest;
use crate::model::Entity;
use crate::ops::OpReport;
use crate::sync;

pub fn enable(ctx: &AppContext, name: &str) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;
    let entry = section.entry(name)?.clone();

    let mut report = OpReport::default();
    if section.is_active(name) {
        report.note(format!("workflow '{name}' is already enabled"));
        return Ok(report);
    }

    // The package root is needed to copy skills back in.
    let resolved = ctx.pm.resolve(&entry.package)?;
    let manifest = WorkflowManifest::load(&resolved.root)?;

    let declared = crate::manifest::DeclaredNames {
        agents: entry.declared(Entity::Agent).to_vec(),
        commands: entry.declared(Entity::Command).to_vec(),
        skills: entry.declared(Entity::Skill).to_vec(),
    };
    report.warn_all(detect_collisions(
        name,
        &declared,
        &doc,
        &section,
        &ctx.live_root,
        Scope::EnabledOnly,
        entry.skill_sync.as_ref(),
    ));

    let synced = sync::sync(&ctx.live_root, &resolved.root, &manifest.skills)?;
    report.warn_all(synced.warnings);

    if let Some(entry) = section.installed.get_mut(name) {
        entry.skill_sync = Some(synced.entries);
    }
    section.activate(name);

    doc.set_workflows(&section)?;
    doc.write()?;

    info!(workflow = %name, "workflow enabled");
    report.changed = true;
    report.note(format!("enabled workflow '{name}'"));
    Ok(report)
}
