//! wfm update - Update installed workflows

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::error::Result;
use crate::ops;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Workflow name; all installed workflows when omitted
    pub name: Option<String>,
}

pub fn run(ctx: &AppContext, args: &UpdateArgs, json: bool) -> Result<()> {
    let report = ops::update(ctx, args.name.as_deref())?;
    print_report(&report, json)
}
