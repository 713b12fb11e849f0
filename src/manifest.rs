//! Workflow manifest parsing and validation.
//!
//! Every workflow package carries a `workflow.toml` at its root declaring
//! the agent, command, and skill files that constitute the bundle.

use std::collections::HashSet;
use std::path::{Component, Path};

use serde::{Deserialize, Serialize};

use crate::error::{Result, WfmError};

pub const MANIFEST_FILE: &str = "workflow.toml";

/// Extension required for agent and command documents.
pub const DOC_EXT: &str = "md";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowManifest {
    pub name: String,
    pub description: String,
    /// Relative paths inside the package, e.g. `agents/reviewer.md`.
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    /// Relative directory paths, e.g. `skills/lint-rules`.
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Declared entity names derived from manifest paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredNames {
    pub agents: Vec<String>,
    pub commands: Vec<String>,
    pub skills: Vec<String>,
}

impl WorkflowManifest {
    /// Read and validate the manifest at a package root.
    pub fn load(package_root: &Path) -> Result<Self> {
        let path = package_root.join(MANIFEST_FILE);
        let raw = std::fs::read_to_string(&path).map_err(|err| {
            WfmError::Manifest(format!("read {}: {err}", path.display()))
        })?;
        let manifest: Self = toml::from_str(&raw)
            .map_err(|err| WfmError::Manifest(format!("parse {}: {err}", path.display())))?;
        manifest.validate(package_root)?;
        Ok(manifest)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|err| WfmError::Manifest(format!("manifest TOML parse error: {err}")))
    }

    /// Validate field contents against the package root.
    ///
    /// Fails fast with a message naming the violated field.
    pub fn validate(&self, package_root: &Path) -> Result<()> {
        validate_required("name", &self.name)?;
        validate_required("description", &self.description)?;

        for field in ["agents", "commands"] {
            let paths = if field == "agents" {
                &self.agents
            } else {
                &self.commands
            };
            let mut seen = HashSet::new();
            for rel in paths {
                validate_inside_root(field, rel)?;
                let path = Path::new(rel);
                if path.extension().and_then(|e| e.to_str()) != Some(DOC_EXT) {
                    return Err(WfmError::Manifest(format!(
                        "{field} path must end in .{DOC_EXT}: {rel}"
                    )));
                }
                let name = stem_name(field, rel)?;
                if !seen.insert(name.clone()) {
                    return Err(WfmError::Manifest(format!(
                        "duplicate {field} name: {name}"
                    )));
                }
            }
        }

        let mut seen_skills = HashSet::new();
        for rel in &self.skills {
            validate_inside_root("skills", rel)?;
            let abs = package_root.join(rel);
            if abs.exists() && !abs.is_dir() {
                return Err(WfmError::Manifest(format!(
                    "skills path must be a directory: {rel}"
                )));
            }
            let name = base_name("skills", rel)?;
            if !seen_skills.insert(name.clone()) {
                return Err(WfmError::Manifest(format!("duplicate skill name: {name}")));
            }
        }

        Ok(())
    }

    /// Entity names derived from declared paths: file stem for agents and
    /// commands, directory basename for skills.
    #[must_use]
    pub fn declared_names(&self) -> DeclaredNames {
        DeclaredNames {
            agents: stems(&self.agents),
            commands: stems(&self.commands),
            skills: basenames(&self.skills),
        }
    }
}

/// Workflow name derived from a resolved package identity: the final path
/// segment, e.g. `acme/review-flow` -> `review-flow`.
#[must_use]
pub fn derive_workflow_name(package: &str) -> String {
    package
        .rsplit('/')
        .next()
        .unwrap_or(package)
        .to_string()
}

fn stems(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| {
            Path::new(p)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
        })
        .collect()
}

fn basenames(paths: &[String]) -> Vec<String> {
    paths
        .iter()
        .filter_map(|p| {
            Path::new(p)
                .file_name()
                .map(|s| s.to_string_lossy().to_string())
        })
        .collect()
}

fn validate_required(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WfmError::Manifest(format!("{field} must be non-empty")));
    }
    Ok(())
}

fn validate_inside_root(field: &str, rel: &str) -> Result<()> {
    let path = Path::new(rel);
    if path.is_absolute() {
        return Err(WfmError::Manifest(format!(
            "{field} path must be relative: {rel}"
        )));
    }
    if path
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(WfmError::Manifest(format!(
            "{field} path must not traverse outside the package: {rel}"
        )));
    }
    if rel.trim().is_empty() {
        return Err(WfmError::Manifest(format!("{field} path must be non-empty")));
    }
    Ok(())
}

fn stem_name(field: &str, rel: &str) -> Result<String> {
    Path::new(rel)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| WfmError::Manifest(format!("{field} path has no file name: {rel}")))
}

fn base_name(field: &str, rel: &str) -> Result<String> {
    Path::new(rel)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| WfmError::Manifest(format!("{field} path has no directory name: {rel}")))
}
