//! wfm install - Install a workflow bundle

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::error::Result;
use crate::ops;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Package spec: registry name, git+URL[#ref], or ./local/path
    pub spec: String,

    /// Reinstall even if the workflow is already installed
    #[arg(long)]
    pub force: bool,
}

pub fn run(ctx: &AppContext, args: &InstallArgs, json: bool) -> Result<()> {
    let report = ops::install(ctx, &args.spec, args.force)?;
    print_report(&report, json)
}
