//! Application context: resolved paths and collaborators for one invocation.

use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;
use crate::error::Result;
use crate::pm::{PackageManager, PmClient};

/// Directory inside the project that the agent host reads.
pub const LIVE_DIR: &str = ".claude";

pub struct AppContext {
    pub project_root: PathBuf,
    pub live_root: PathBuf,
    pub pm: Box<dyn PackageManager>,
}

impl AppContext {
    pub fn from_env() -> Result<Self> {
        let project_root = Self::find_project_root()?;
        Ok(Self::new(project_root, Box::new(PmClient::new())))
    }

    /// Build a context over explicit roots (tests, embedding).
    #[must_use]
    pub fn new(project_root: PathBuf, pm: Box<dyn PackageManager>) -> Self {
        let live_root = project_root.join(LIVE_DIR);
        Self {
            project_root,
            live_root,
            pm,
        }
    }

    fn find_project_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("WFM_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, CONFIG_FILE) {
            return Ok(found);
        }
        // No config yet: treat the working directory as a fresh project.
        Ok(cwd)
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(name).is_file() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}
