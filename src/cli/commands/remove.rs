//! wfm remove - Remove an installed workflow

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::error::Result;
use crate::ops;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Workflow name
    pub name: String,
}

pub fn run(ctx: &AppContext, args: &RemoveArgs, json: bool) -> Result<()> {
    let report = ops::remove(ctx, &args.name)?;
    print_report(&report, json)
}
