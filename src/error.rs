//! Error types for wfm.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WfmError>;

#[derive(Debug, Error)]
pub enum WfmError {
    /// Persisted project config is malformed. Fatal before any mutation.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// Environment or I/O failure around configuration handling.
    #[error("config error: {0}")]
    Config(String),

    /// Workflow manifest is missing, malformed, or fails validation.
    #[error("manifest error: {0}")]
    Manifest(String),

    /// A destination file is owned by a different installed workflow.
    /// Hard error: resolving it safely requires operator intervention.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Referenced workflow is not installed.
    #[error("workflow not installed: {0}")]
    NotInstalled(String),

    /// Duplicate workflow identity without --force.
    #[error("already installed: {0}")]
    AlreadyInstalled(String),

    /// External package manager subprocess failed.
    #[error("package manager error: {0}")]
    PackageManager(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
