//! Disable an active workflow.

use tracing::info;

use crate::app::AppContext;
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::ops::OpReport;
use crate::sync;

pub fn disable(ctx: &AppContext, name: &str) -> Result<OpReport> {
    let mut doc = ConfigDoc::read(&ctx.project_root)?;
    let mut section = doc.workflows()?;
    let entry = section.entry(name)?.clone();

    let mut report = OpReport::default();
    if !section.is_active(name) {
        report.note(format!("workflow '{name}' is already disabled"));
        return Ok(report);
    }

    let prior_sync = entry.skill_sync.clone().unwrap_or_default();
    let outcome = sync::unsync(&ctx.live_root, &entry.skills, &prior_sync)?;
    report.warn_all(outcome.warnings);

    section.deactivate(name);
    if let Some(entry) = section.installed.get_mut(name) {
        entry.skill_sync = None;
    }

    doc.set_workflows(&section)?;
    doc.write()?;

    info!(workflow = %name, "workflow disabled");
    report.changed = true;
    report.note(format!("disabled workflow '{name}'"));
    Ok(report)
}
