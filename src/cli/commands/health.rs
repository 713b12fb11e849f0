//! wfm health - Report tracked file integrity and skill sync state

use clap::Args;
use console::style;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::integrity::{FileIntegrity, IntegrityStatus, check_integrity};
use crate::model::SkillSyncStatus;

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Workflow name; every installed workflow when omitted
    pub name: Option<String>,

    /// Check every installed workflow
    #[arg(long, conflicts_with = "name")]
    pub all: bool,
}

#[derive(Serialize)]
struct HealthItem {
    name: String,
    files: Vec<FileIntegrity>,
    skills: Vec<(String, SkillSyncStatus)>,
}

pub fn run(ctx: &AppContext, args: &HealthArgs, json: bool) -> Result<()> {
    let doc = ConfigDoc::read(&ctx.project_root)?;
    let section = doc.workflows()?;

    let targets: Vec<String> = match &args.name {
        Some(name) => {
            section.entry(name)?;
            vec![name.clone()]
        }
        None => section.installed.keys().cloned().collect(),
    };

    let mut items = Vec::new();
    for name in &targets {
        let entry = section.entry(name)?;
        let files = check_integrity(&ctx.live_root, entry)?;
        let skills = entry
            .skill_sync
            .clone()
            .unwrap_or_default()
            .into_iter()
            .collect();
        items.push(HealthItem {
            name: name.clone(),
            files,
            skills,
        });
    }

    if json {
        return emit_json(&items);
    }

    for item in &items {
        println!("{}", style(&item.name).bold());
        for file in &item.files {
            let status = match file.status {
                IntegrityStatus::Clean => style("clean").green().to_string(),
                IntegrityStatus::Modified => style("modified").yellow().to_string(),
                IntegrityStatus::Deleted => style("deleted").red().to_string(),
            };
            println!("  {:40} {status}", file.dest);
        }
        for (skill, status) in &item.skills {
            let status = match status {
                SkillSyncStatus::Synced => style("synced").green().to_string(),
                SkillSyncStatus::Skipped => style("skipped").yellow().to_string(),
            };
            println!("  skills/{skill:33} {status}");
        }
        if item.files.is_empty() && item.skills.is_empty() {
            println!("  nothing tracked");
        }
    }
    Ok(())
}
