//! Output helpers.
//!
//! Informational output goes to stdout; warnings and errors go to stderr
//! with a distinct styled prefix.

use console::style;
use serde::Serialize;

use crate::error::{Result, WfmError};
use crate::ops::OpReport;

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| WfmError::Config(format!("serialize output: {err}")))?;
    println!("{payload}");
    Ok(())
}

pub fn print_warning(warning: &str) {
    eprintln!("{} {warning}", style("warning:").yellow().bold());
}

#[derive(Serialize)]
struct ReportJson<'a> {
    changed: bool,
    messages: &'a [String],
    warnings: &'a [String],
}

pub fn print_report(report: &OpReport, json: bool) -> Result<()> {
    if json {
        return emit_json(&ReportJson {
            changed: report.changed,
            messages: &report.messages,
            warnings: &report.warnings,
        });
    }
    for warning in &report.warnings {
        print_warning(warning);
    }
    for message in &report.messages {
        println!("{message}");
    }
    Ok(())
}
