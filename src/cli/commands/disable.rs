//! wfm disable - Disable active workflows

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::error::Result;
use crate::ops::{self, OpReport};

use super::enable::resolve_names;

#[derive(Args, Debug)]
pub struct DisableArgs {
    /// Workflow names
    pub names: Vec<String>,

    /// Disable every installed workflow
    #[arg(long, conflicts_with = "names")]
    pub all: bool,
}

pub fn run(ctx: &AppContext, args: &DisableArgs, json: bool) -> Result<()> {
    let names = resolve_names(ctx, &args.names, args.all)?;
    let mut combined = OpReport::default();
    for name in &names {
        let report = ops::disable(ctx, name)?;
        combined.changed |= report.changed;
        combined.messages.extend(report.messages);
        combined.warnings.extend(report.warnings);
    }
    print_report(&combined, json)
}
