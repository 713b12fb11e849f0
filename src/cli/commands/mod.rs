//! CLI command implementations.
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod disable;
pub mod enable;
pub mod health;
pub mod install;
pub mod list;
pub mod remove;
pub mod switch;
pub mod update;

use crate::app::AppContext;
use crate::error::Result;

pub fn run(ctx: &AppContext, command: &Commands, json: bool) -> Result<()> {
    match command {
        Commands::Install(args) => install::run(ctx, args, json),
        Commands::Remove(args) => remove::run(ctx, args, json),
        Commands::Update(args) => update::run(ctx, args, json),
        Commands::Enable(args) => enable::run(ctx, args, json),
        Commands::Disable(args) => disable::run(ctx, args, json),
        Commands::Switch(args) => switch::run(ctx, args, json),
        Commands::List(args) => list::run(ctx, args, json),
        Commands::Health(args) => health::run(ctx, args, json),
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a workflow from a registry name, git URL, or local path
    Install(install::InstallArgs),

    /// Remove an installed workflow
    Remove(remove::RemoveArgs),

    /// Update one workflow, or all installed workflows
    Update(update::UpdateArgs),

    /// Enable installed workflows
    Enable(enable::EnableArgs),

    /// Disable active workflows
    Disable(disable::DisableArgs),

    /// Make exactly the given workflows active
    Switch(switch::SwitchArgs),

    /// List installed workflows
    List(list::ListArgs),

    /// Check tracked files and skill sync state
    Health(health::HealthArgs),
}
