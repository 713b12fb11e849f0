//! Common test utilities shared across integration tests.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use wfm::app::AppContext;
use wfm::error::{Result, WfmError};
use wfm::manifest::derive_workflow_name;
use wfm::model::{PackageSource, ResolvedPackage};
use wfm::pm::PackageManager;

/// In-process package manager over a directory of package roots.
///
/// Packages live at `<store>/<workflow-name>/` with a `VERSION` file beside
/// the manifest. `add`/`update`/`resolve` read that layout; `remove` records
/// the identifier for assertions.
pub struct FakePm {
    store: PathBuf,
    pub removed: Arc<Mutex<Vec<String>>>,
    pub fail_resolve: BTreeSet<String>,
}

impl FakePm {
    pub fn new(store: PathBuf) -> Self {
        Self {
            store,
            removed: Arc::new(Mutex::new(Vec::new())),
            fail_resolve: BTreeSet::new(),
        }
    }

    fn lookup(&self, package: &str) -> Result<ResolvedPackage> {
        let name = derive_workflow_name(package);
        let root = self.store.join(&name);
        if !root.is_dir() {
            return Err(WfmError::PackageManager(format!(
                "package not found in store: {package}"
            )));
        }
        let version = fs::read_to_string(root.join("VERSION"))
            .map_err(|err| WfmError::PackageManager(format!("read VERSION: {err}")))?
            .trim()
            .to_string();
        Ok(ResolvedPackage {
            package: package.to_string(),
            version,
            root,
        })
    }
}

impl PackageManager for FakePm {
    fn add(&self, source: &PackageSource) -> Result<ResolvedPackage> {
        match source {
            PackageSource::Registry { name } => self.lookup(name),
            PackageSource::LocalPath { path } => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                self.lookup(&name)
            }
            PackageSource::VersionControl { url, .. } => {
                let name = url
                    .trim_end_matches(".git")
                    .rsplit('/')
                    .next()
                    .unwrap_or(url)
                    .to_string();
                self.lookup(&name)
            }
        }
    }

    fn update(&self, package: &str) -> Result<ResolvedPackage> {
        self.lookup(package)
    }

    fn remove(&self, package: &str) -> Result<()> {
        self.removed.lock().unwrap().push(package.to_string());
        Ok(())
    }

    fn resolve(&self, package: &str) -> Result<ResolvedPackage> {
        if self.fail_resolve.contains(package) {
            return Err(WfmError::PackageManager(format!(
                "resolve failed for {package}"
            )));
        }
        self.lookup(package)
    }
}

/// Isolated project plus package store.
pub struct TestProject {
    pub dir: TempDir,
    pub store: PathBuf,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp dir");
        let store = dir.path().join("store");
        fs::create_dir_all(&store).unwrap();
        Self { dir, store }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn live(&self, rel: &str) -> PathBuf {
        self.dir.path().join(".claude").join(rel)
    }

    /// Context backed by a fresh [`FakePm`] over this project's store.
    pub fn ctx(&self) -> AppContext {
        self.ctx_with(FakePm::new(self.store.clone()))
    }

    pub fn ctx_with(&self, pm: FakePm) -> AppContext {
        AppContext::new(self.root().to_path_buf(), Box::new(pm))
    }

    /// Create a package in the store: manifest, version, and content files.
    pub fn add_package(
        &self,
        package: &str,
        version: &str,
        manifest: &str,
        files: &[(&str, &str)],
    ) {
        let name = derive_workflow_name(package);
        let root = self.store.join(name);
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("workflow.toml"), manifest).unwrap();
        fs::write(root.join("VERSION"), version).unwrap();
        for (rel, content) in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    pub fn set_version(&self, package: &str, version: &str) {
        let name = derive_workflow_name(package);
        fs::write(self.store.join(name).join("VERSION"), version).unwrap();
    }

    pub fn package_file(&self, package: &str, rel: &str) -> PathBuf {
        self.store.join(derive_workflow_name(package)).join(rel)
    }

    pub fn config_text(&self) -> String {
        fs::read_to_string(self.root().join("workflows.toml")).unwrap_or_default()
    }
}

/// Manifest for a simple workflow with one agent, one command, one skill.
pub fn simple_manifest(name: &str, skill: &str) -> String {
    format!(
        r#"name = "{name}"
description = "test workflow"
agents = ["agents/{name}-agent.md"]
commands = ["commands/{name}-cmd.md"]
skills = ["skills/{skill}"]
"#
    )
}

/// Content files matching [`simple_manifest`].
pub fn simple_files(name: &str, skill: &str) -> Vec<(String, String)> {
    vec![
        (format!("agents/{name}-agent.md"), format!("{name} agent")),
        (format!("commands/{name}-cmd.md"), format!("{name} command")),
        (format!("skills/{skill}/SKILL.md"), format!("{skill} skill")),
    ]
}

/// Install a simple workflow end to end and return its context.
pub fn install_simple(project: &TestProject, package: &str, skill: &str) -> AppContext {
    let name = derive_workflow_name(package);
    let files = simple_files(&name, skill);
    let refs: Vec<(&str, &str)> = files
        .iter()
        .map(|(a, b)| (a.as_str(), b.as_str()))
        .collect();
    project.add_package(package, "1.0.0", &simple_manifest(&name, skill), &refs);
    let ctx = project.ctx();
    wfm::ops::install(&ctx, package, false).expect("install");
    ctx
}
