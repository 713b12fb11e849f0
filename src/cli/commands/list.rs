//! wfm list - List installed workflows

use clap::Args;
use console::style;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::emit_json;
use crate::config::ConfigDoc;
use crate::error::Result;
use crate::model::WorkflowEntry;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show one workflow in detail
    pub name: Option<String>,
}

#[derive(Serialize)]
struct ListItem<'a> {
    name: &'a str,
    package: &'a str,
    version: &'a str,
    enabled: bool,
    agents: &'a [String],
    commands: &'a [String],
    skills: &'a [String],
}

pub fn run(ctx: &AppContext, args: &ListArgs, json: bool) -> Result<()> {
    let doc = ConfigDoc::read(&ctx.project_root)?;
    let section = doc.workflows()?;

    let selected: Vec<(&String, &WorkflowEntry)> = match &args.name {
        Some(name) => vec![(name, section.entry(name)?)],
        None => section.installed.iter().collect(),
    };

    if json {
        let items: Vec<ListItem<'_>> = selected
            .iter()
            .map(|(name, entry)| ListItem {
                name,
                package: &entry.package,
                version: &entry.version,
                enabled: section.is_active(name),
                agents: &entry.agents,
                commands: &entry.commands,
                skills: &entry.skills,
            })
            .collect();
        return emit_json(&items);
    }

    if selected.is_empty() {
        println!("no workflows installed");
        return Ok(());
    }

    match &args.name {
        Some(name) => {
            let entry = section.entry(name)?;
            println!("{}", style(name).bold());
            println!("  package   {}", entry.package);
            println!("  version   {}", entry.version);
            println!(
                "  status    {}",
                if section.is_active(name) {
                    style("enabled").green().to_string()
                } else {
                    style("disabled").dim().to_string()
                }
            );
            println!("  agents    {}", entry.agents.join(", "));
            println!("  commands  {}", entry.commands.join(", "));
            println!("  skills    {}", entry.skills.join(", "));
        }
        None => {
            for (name, entry) in selected {
                let status = if section.is_active(name) {
                    style("enabled").green().to_string()
                } else {
                    style("disabled").dim().to_string()
                };
                println!("{:24} {:12} {status}", style(name).bold(), entry.version);
            }
        }
    }
    Ok(())
}
