//! External package manager integration.
//!
//! Package fetching, pinning, and removal are delegated to an external CLI
//! (`wfpm` by default, overridable via `WFM_PM`). This module shells out to
//! it and reads back the resolved package identity, version, and root
//! directory from its JSON output; the tool's internal cache format is never
//! parsed beyond that.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use crossbeam_channel::bounded;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, WfmError};
use crate::model::{PackageSource, ResolvedPackage};

/// Seam for the external package manager, so orchestrators can be exercised
/// against an in-process fake.
pub trait PackageManager {
    /// Fetch and pin a package, returning its resolved identity.
    fn add(&self, source: &PackageSource) -> Result<ResolvedPackage>;
    /// Update an installed package to its latest pinned version.
    fn update(&self, package: &str) -> Result<ResolvedPackage>;
    /// Remove an installed package.
    fn remove(&self, package: &str) -> Result<()>;
    /// Read an installed package's resolved version and root directory.
    fn resolve(&self, package: &str) -> Result<ResolvedPackage>;
}

#[derive(Debug, Deserialize)]
struct PmOutput {
    package: String,
    version: String,
    root: PathBuf,
}

/// Subprocess-backed client.
pub struct PmClient {
    bin: String,
    timeout: Duration,
}

impl Default for PmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PmClient {
    #[must_use]
    pub fn new() -> Self {
        let bin = std::env::var("WFM_PM").unwrap_or_else(|_| "wfpm".to_string());
        let timeout = std::env::var("WFM_PM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map_or(Duration::from_secs(120), Duration::from_secs);
        Self { bin, timeout }
    }

    #[must_use]
    pub fn with_bin(bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            bin: bin.into(),
            timeout,
        }
    }

    /// Run one subcommand with a timeout around the subprocess.
    fn run(&self, args: Vec<String>) -> Result<String> {
        debug!(bin = %self.bin, ?args, "invoking package manager");
        let bin = self.bin.clone();
        let (tx, rx) = bounded(1);
        std::thread::spawn(move || {
            let output = Command::new(&bin).args(&args).output();
            let _ = tx.send(output);
        });

        let output = rx
            .recv_timeout(self.timeout)
            .map_err(|_| {
                WfmError::PackageManager(format!(
                    "{} timed out after {}s",
                    self.bin,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|err| WfmError::PackageManager(format!("execute {}: {err}", self.bin)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WfmError::PackageManager(format!(
                "{} exited with {}: {}",
                self.bin,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn source_spec(source: &PackageSource) -> String {
    match source {
        PackageSource::Registry { name } => name.clone(),
        PackageSource::VersionControl { url, reference } => match reference {
            Some(r) => format!("{url}#{r}"),
            None => url.clone(),
        },
        PackageSource::LocalPath { path } => path.to_string_lossy().into_owned(),
    }
}

fn parse_resolved(stdout: &str, bin: &str) -> Result<ResolvedPackage> {
    let parsed: PmOutput = serde_json::from_str(stdout).map_err(|err| {
        WfmError::PackageManager(format!("unexpected {bin} output: {err}"))
    })?;
    Ok(ResolvedPackage {
        package: parsed.package,
        version: parsed.version,
        root: parsed.root,
    })
}

impl PackageManager for PmClient {
    fn add(&self, source: &PackageSource) -> Result<ResolvedPackage> {
        let stdout = self.run(vec![
            "add".to_string(),
            "--json".to_string(),
            source_spec(source),
        ])?;
        parse_resolved(&stdout, &self.bin)
    }

    fn update(&self, package: &str) -> Result<ResolvedPackage> {
        let stdout = self.run(vec![
            "update".to_string(),
            "--json".to_string(),
            package.to_string(),
        ])?;
        parse_resolved(&stdout, &self.bin)
    }

    fn remove(&self, package: &str) -> Result<()> {
        self.run(vec![
            "remove".to_string(),
            "--json".to_string(),
            package.to_string(),
        ])?;
        Ok(())
    }

    fn resolve(&self, package: &str) -> Result<ResolvedPackage> {
        let stdout = self.run(vec![
            "info".to_string(),
            "--json".to_string(),
            package.to_string(),
        ])?;
        parse_resolved(&stdout, &self.bin)
    }
}
