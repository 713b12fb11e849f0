//! Active-set switch tests: ordering, shared names, rollback.

mod common;

use std::fs;

use common::{FakePm, TestProject, install_simple, simple_files, simple_manifest};
use wfm::config::ConfigDoc;
use wfm::error::WfmError;
use wfm::model::SkillSyncStatus;
use wfm::ops;

fn install_pair(project: &TestProject, skill_a: &str, skill_b: &str) -> wfm::app::AppContext {
    install_simple(project, "acme/alpha", skill_a);
    let files = simple_files("beta", skill_b);
    let refs: Vec<(&str, &str)> = files.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
    project.add_package("acme/beta", "1.0.0", &simple_manifest("beta", skill_b), &refs);
    let ctx = project.ctx();
    ops::install(&ctx, "acme/beta", false).unwrap();
    ctx
}

#[test]
fn switch_disables_everything_outside_the_target_set() {
    let project = TestProject::new();
    let ctx = install_pair(&project, "alpha-skill", "beta-skill");

    let report = ops::switch(&ctx, &["beta".to_string()]).unwrap();
    assert!(report.changed);
    assert!(!project.live("skills/alpha-skill").exists());
    assert!(project.live("skills/beta-skill/SKILL.md").is_file());

    let doc = ConfigDoc::read(&ctx.project_root).unwrap();
    let section = doc.workflows().unwrap();
    assert_eq!(section.active, vec!["beta"]);
    assert!(section.entry("alpha").unwrap().skill_sync.is_none());
}

#[test]
fn switch_to_current_set_is_a_noop() {
    let project = TestProject::new();
    let ctx = install_simple(&project, "acme/alpha", "alpha-skill");

    let before = project.config_text();
    let report = ops::switch(&ctx, &["alpha".to_string()]).unwrap();
    assert!(!report.changed);
    assert!(report.messages.iter().any(|m| m.contains("already active")));
    assert_eq!(project.config_text(), before);
}

#[test]
fn switch_rejects_uninstalled_target() {
    let project = TestProject::new();
    let ctx = install_simple(&project, "acme/alpha", "alpha-skill");
    let err = ops::switch(&ctx, &["ghost".to_string()]).unwrap_err();
    assert!(matches!(err, WfmError::NotInstalled(_)));
}

#[test]
fn shared_skill_name_changes_hands_without_a_spurious_collision() {
    let project = TestProject::new();
    // Both workflows ship a skill named `lint`. Installing beta while alpha
    // is active leaves beta's copy skipped.
    let ctx = install_pair(&project, "lint", "lint");
    ops::disable(&ctx, "beta").unwrap();
    assert_eq!(
        fs::read_to_string(project.live("skills/lint/SKILL.md")).unwrap(),
        "lint skill"
    );

    // Alpha is unsynced before beta is enabled, so beta syncs cleanly.
    let report = ops::switch(&ctx, &["beta".to_string()]).unwrap();
    assert!(report.changed);
    assert!(
        !report.warnings.iter().any(|w| w.contains("already exists")),
        "unexpected warnings: {:?}",
        report.warnings
    );
    // Alpha is on its way out of the active set; sharing its skill name
    // must not read as a conflict with it.
    assert!(
        !report
            .warnings
            .iter()
            .any(|w| w.contains("alpha") || w.contains("also declared")),
        "spurious cross-workflow warning: {:?}",
        report.warnings
    );

    let doc = ConfigDoc::read(&ctx.project_root).unwrap();
    let section = doc.workflows().unwrap();
    assert_eq!(section.active, vec!["beta"]);
    assert_eq!(
        section.entry("beta").unwrap().skill_sync.as_ref().unwrap()["lint"],
        SkillSyncStatus::Synced
    );
    assert!(project.live("skills/lint/SKILL.md").is_file());
}

#[test]
fn failed_switch_rolls_back_and_commits_nothing() {
    let project = TestProject::new();
    install_pair(&project, "alpha-skill", "beta-skill");
    let setup = project.ctx();
    ops::disable(&setup, "beta").unwrap();

    let mut pm = FakePm::new(project.store.clone());
    pm.fail_resolve.insert("acme/beta".to_string());
    let ctx = project.ctx_with(pm);
    let before = project.config_text();

    let err = ops::switch(&ctx, &["beta".to_string()]).unwrap_err();
    assert!(matches!(err, WfmError::PackageManager(_)));

    // Alpha's skill was unsynced during the disable phase and restored by
    // the rollback; the persisted config never changed.
    assert!(project.live("skills/alpha-skill/SKILL.md").is_file());
    assert_eq!(project.config_text(), before);
    let doc = ConfigDoc::read(&ctx.project_root).unwrap();
    assert_eq!(doc.workflows().unwrap().active, vec!["alpha"]);
}
