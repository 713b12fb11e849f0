//! Domain types shared across the reconciliation engine.
//!
//! These are the persisted shapes (workflow entries, tracked files, skill
//! sync state) plus the transient package-source descriptor used during
//! install resolution.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a workflow's package comes from. Resolved at install time and not
/// persisted; the persisted record only keeps the resolved package identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSource {
    Registry { name: String },
    VersionControl { url: String, reference: Option<String> },
    LocalPath { path: PathBuf },
}

impl PackageSource {
    /// Parse a CLI install spec.
    ///
    /// `git+<url>[#ref]` and URL-looking strings are version control,
    /// `./path`, `../path` and absolute paths are local, everything else is a
    /// registry package name.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        if let Some(rest) = spec.strip_prefix("git+") {
            let (url, reference) = match rest.split_once('#') {
                Some((url, r)) => (url.to_string(), Some(r.to_string())),
                None => (rest.to_string(), None),
            };
            return Self::VersionControl { url, reference };
        }
        if spec.starts_with("http://") || spec.starts_with("https://") || spec.starts_with("git@")
        {
            let (url, reference) = match spec.split_once('#') {
                Some((url, r)) => (url.to_string(), Some(r.to_string())),
                None => (spec.to_string(), None),
            };
            return Self::VersionControl { url, reference };
        }
        if spec.starts_with("./") || spec.starts_with("../") || spec.starts_with('/') {
            return Self::LocalPath {
                path: PathBuf::from(spec),
            };
        }
        Self::Registry {
            name: spec.to_string(),
        }
    }

    /// Registry sources know their package identity before fetching.
    #[must_use]
    pub fn known_identity(&self) -> Option<&str> {
        match self {
            Self::Registry { name } => Some(name),
            _ => None,
        }
    }
}

/// A package resolved by the external package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
    pub package: String,
    pub version: String,
    pub root: PathBuf,
}

/// A file placed into the live tree by a workflow.
///
/// `source` and `dest` are relative paths (inside the package and inside the
/// live tree respectively); `hash` is the content digest at last sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledFile {
    pub source: String,
    pub dest: String,
    pub hash: String,
}

/// Per-skill sync status.
///
/// `Skipped` means a pre-existing directory blocked the copy; that directory
/// is user content and must never be touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSyncStatus {
    Synced,
    Skipped,
}

pub type SkillSyncMap = BTreeMap<String, SkillSyncStatus>;

/// Persisted record for one installed workflow, keyed by workflow name in
/// the config's reserved section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowEntry {
    /// Package identifier as known to the external package manager.
    pub package: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    // Tables last so the TOML serializer emits scalar keys first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<InstalledFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_sync: Option<SkillSyncMap>,
}

impl WorkflowEntry {
    #[must_use]
    pub fn new(package: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            version: version.into(),
            installed_at: Some(Utc::now()),
            updated_at: None,
            agents: Vec::new(),
            commands: Vec::new(),
            skills: Vec::new(),
            files: Vec::new(),
            skill_sync: None,
        }
    }

    /// Declared names for one entity type.
    #[must_use]
    pub fn declared(&self, entity: Entity) -> &[String] {
        match entity {
            Entity::Agent => &self.agents,
            Entity::Command => &self.commands,
            Entity::Skill => &self.skills,
        }
    }
}

/// Entity types a workflow can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entity {
    Agent,
    Command,
    Skill,
}

impl Entity {
    pub const ALL: [Self; 3] = [Self::Agent, Self::Command, Self::Skill];

    /// Directory for this entity type inside the live tree.
    #[must_use]
    pub const fn live_dir(self) -> &'static str {
        match self {
            Self::Agent => "agents",
            Self::Command => "commands",
            Self::Skill => "skills",
        }
    }

    /// Top-level key for user overrides of this entity in the project config.
    #[must_use]
    pub const fn config_key(self) -> &'static str {
        self.live_dir()
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Agent => "agent",
            Self::Command => "command",
            Self::Skill => "skill",
        };
        f.write_str(name)
    }
}

/// Skill directory marker file name.
pub const SKILL_MARKER: &str = "SKILL.md";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_registry_spec() {
        let source = PackageSource::parse("acme/review-flow");
        assert_eq!(
            source,
            PackageSource::Registry {
                name: "acme/review-flow".to_string()
            }
        );
        assert_eq!(source.known_identity(), Some("acme/review-flow"));
    }

    #[test]
    fn parse_git_spec_with_ref() {
        let source = PackageSource::parse("git+https://example.com/r.git#v2");
        assert_eq!(
            source,
            PackageSource::VersionControl {
                url: "https://example.com/r.git".to_string(),
                reference: Some("v2".to_string()),
            }
        );
        assert_eq!(source.known_identity(), None);
    }

    #[test]
    fn parse_url_spec() {
        let source = PackageSource::parse("https://example.com/r.git");
        assert!(matches!(source, PackageSource::VersionControl { .. }));
    }

    #[test]
    fn parse_local_spec() {
        let source = PackageSource::parse("./bundles/review");
        assert_eq!(
            source,
            PackageSource::LocalPath {
                path: PathBuf::from("./bundles/review")
            }
        );
    }

    #[test]
    fn entry_declared_lists() {
        let mut entry = WorkflowEntry::new("acme/x", "1.0.0");
        entry.agents = vec!["reviewer".to_string()];
        entry.skills = vec!["lint".to_string()];
        assert_eq!(entry.declared(Entity::Agent), ["reviewer".to_string()]);
        assert_eq!(entry.declared(Entity::Command), Vec::<String>::new());
        assert_eq!(entry.declared(Entity::Skill), ["lint".to_string()]);
    }
}
