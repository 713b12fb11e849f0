//! wfm switch - Make exactly the given workflows active

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::error::Result;
use crate::ops;

#[derive(Args, Debug)]
pub struct SwitchArgs {
    /// Workflow names forming the new active set
    #[arg(required = true)]
    pub names: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &SwitchArgs, json: bool) -> Result<()> {
    let report = ops::switch(ctx, &args.names)?;
    print_report(&report, json)
}
