//! Remove an installed workflow.

use tracing::info;

use crate::app::AppContext;
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::ops::OpReport;
use crate::sync;

/// Remove a workflow: unsync its skills, delete its clean tracked files,
/// drop the entry, commit, then best-effort uninstall through the package
/// manager. A failed uninstall is a warning, not an error; the committed
/// config is already consistent without it.
pub fn remove(ctx: &AppContext, name: &str) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;
    let entry = section.entry(name)?.clone();

    let mut report = OpReport::default();

    let prior_sync = entry.skill_sync.clone().unwrap_or_default();
    let unsynced = sync::unsync(&ctx.live_root, &entry.skills, &prior_sync)?;
    report.warn_all(unsynced.warnings);

    let removal = sync::remove_files(&ctx.live_root, &entry.files)?;
    report.warn_all(removal.warnings);

    section.deactivate(name);
    section.installed.remove(name);
    doc.set_workflows(&section)?;
    doc.write()?;

    if let Err(err) = ctx.pm.remove(&entry.package) {
        report.warn(format!(
            "package '{}' could not be uninstalled: {err}",
            entry.package
        ));
    }

    info!(workflow = %name, "workflow removed");
    report.changed = true;
    report.note(format!("removed workflow '{name}'"));
    Ok(report)
}
