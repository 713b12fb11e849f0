//! wfm enable - Enable installed workflows

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::print_report;
use crate::config::ConfigDoc;
use crate::error::{Result, WfmError};
use crate::ops::{self, OpReport};

#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Workflow names
    pub names: Vec<String>,

    /// Enable every installed workflow
    #[arg(long, conflicts_with = "names")]
    pub all: bool,
}

pub fn run(ctx: &AppContext, args: &EnableArgs, json: bool) -> Result<()> {
    let names = resolve_names(ctx, &args.names, args.all)?;
    let mut combined = OpReport::default();
    for name in &names {
        let report = ops::enable(ctx, name)?;
        combined.changed |= report.changed;
        combined.messages.extend(report.messages);
        combined.warnings.extend(report.warnings);
    }
    print_report(&combined, json)
}

pub(crate) fn resolve_names(
    ctx: &AppContext,
    names: &[String],
    all: bool,
) -> Result<Vec<String>> {
    if all {
        let doc = ConfigDoc::read(&ctx.project_root)?;
        return Ok(doc.workflows()?.installed.keys().cloned().collect());
    }
    if names.is_empty() {
        return Err(WfmError::Config(
            "provide one or more workflow names, or --all".to_string(),
        ));
    }
    Ok(names.to_vec())
}
