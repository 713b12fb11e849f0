//! Naming collision detection.
//!
//! Three independent passes over a workflow's declared names: against other
//! known workflows, against pre-existing files in the live tree, and against
//! user-config override sections. All warnings are accumulated; none of them
//! blocks an operation.

use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{ConfigDoc, WorkflowsSection};
use crate::manifest::DeclaredNames;
use crate::model::{Entity, SKILL_MARKER, SkillSyncMap, SkillSyncStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CollisionKind {
    CrossWorkflow,
    OverriddenByFile,
    OverriddenByUserConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollisionWarning {
    pub kind: CollisionKind,
    pub entity: Entity,
    pub name: String,
    pub detail: String,
}

impl std::fmt::Display for CollisionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} '{}': {}", self.entity, self.name, self.detail)
    }
}

/// Which other workflows pass 1 compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Only currently-active workflows (enable/switch time).
    EnabledOnly,
    /// Every installed workflow (install time).
    AllInstalled,
}

/// Detect every naming conflict for one workflow's declared names.
///
/// Never short-circuits; the result is advisory.
pub fn detect_collisions(
    workflow_name: &str,
    declared: &DeclaredNames,
    doc: &ConfigDoc,
    section: &WorkflowsSection,
    live_root: &Path,
    scope: Scope,
    skill_sync: Option<&SkillSyncMap>,
) -> Vec<CollisionWarning> {
    let mut warnings = Vec::new();
    warnings.extend(cross_workflow_pass(workflow_name, declared, section, scope));
    warnings.extend(file_override_pass(
        declared,
        section,
        live_root,
        skill_sync,
    ));
    warnings.extend(user_config_pass(declared, doc));
    warnings
}

fn declared_for(declared: &DeclaredNames, entity: Entity) -> &[String] {
    match entity {
        Entity::Agent => &declared.agents,
        Entity::Command => &declared.commands,
        Entity::Skill => &declared.skills,
    }
}

fn cross_workflow_pass(
    workflow_name: &str,
    declared: &DeclaredNames,
    section: &WorkflowsSection,
    scope: Scope,
) -> Vec<CollisionWarning> {
    let mut warnings = Vec::new();
    for (other_name, other) in &section.installed {
        if other_name == workflow_name {
            continue;
        }
        if scope == Scope::EnabledOnly && !section.is_active(other_name) {
            continue;
        }
        for entity in Entity::ALL {
            for name in declared_for(declared, entity) {
                if other.declared(entity).contains(name) {
                    warnings.push(CollisionWarning {
                        kind: CollisionKind::CrossWorkflow,
                        entity,
                        name: name.clone(),
                        detail: format!("also declared by workflow '{other_name}'"),
                    });
                }
            }
        }
    }
    warnings
}

fn file_override_pass(
    declared: &DeclaredNames,
    section: &WorkflowsSection,
    live_root: &Path,
    skill_sync: Option<&SkillSyncMap>,
) -> Vec<CollisionWarning> {
    let probes: Vec<(Entity, &String)> = Entity::ALL
        .into_iter()
        .flat_map(|entity| {
            declared_for(declared, entity)
                .iter()
                .map(move |name| (entity, name))
        })
        .collect();

    // Independent existence checks, fanned out and joined.
    probes
        .par_iter()
        .filter_map(|&(entity, name)| {
            let rel = match entity {
                Entity::Agent | Entity::Command => {
                    format!("{}/{name}.md", entity.live_dir())
                }
                Entity::Skill => format!("{}/{name}/{SKILL_MARKER}", entity.live_dir()),
            };
            if !live_root.join(&rel).exists() {
                return None;
            }
            match entity {
                Entity::Skill => {
                    // Our own synced copy is not a user override.
                    if skill_sync.and_then(|m| m.get(name))
                        == Some(&SkillSyncStatus::Synced)
                    {
                        return None;
                    }
                }
                Entity::Agent | Entity::Command => {
                    // A file tracked by any installed workflow is
                    // system-managed, not a user override.
                    if section.owner_of(&rel, None).is_some() {
                        return None;
                    }
                }
            }
            Some(CollisionWarning {
                kind: CollisionKind::OverriddenByFile,
                entity,
                name: name.clone(),
                detail: format!("existing file at {rel} takes precedence"),
            })
        })
        .collect()
}

fn user_config_pass(declared: &DeclaredNames, doc: &ConfigDoc) -> Vec<CollisionWarning> {
    let mut warnings = Vec::new();
    for entity in Entity::ALL {
        let overrides = doc.user_override_names(entity);
        for name in declared_for(declared, entity) {
            if overrides.contains(name) {
                warnings.push(CollisionWarning {
                    kind: CollisionKind::OverriddenByUserConfig,
                    entity,
                    name: name.clone(),
                    detail: format!(
                        "project config [{}.{name}] takes precedence",
                        entity.config_key()
                    ),
                });
            }
        }
    }
    warnings
}
