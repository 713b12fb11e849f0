//! Project configuration store.
//!
//! The project config (`workflows.toml`) is a human-owned TOML document.
//! This system owns exactly one reserved top-level key, `workflows`, holding
//! the installed-workflow records and the active set. Everything else in the
//! file is operator content and must survive a write byte-identical.
//!
//! [`ConfigDoc`] is the explicit read->mutate->write handle: it captures the
//! raw text at read time so [`ConfigDoc::write`] can diff per top-level key
//! and splice only the changed keys back into the original text, preserving
//! comments and formatting outside them. With no cached raw text (fresh file)
//! the whole document is serialized.
//!
//! There is no cross-process locking: invocation is single-operator and
//! human-driven. Concurrent external mutation between read and write is a
//! known, accepted limitation.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WfmError};
use crate::model::{Entity, WorkflowEntry};

pub const CONFIG_FILE: &str = "workflows.toml";
pub const WORKFLOWS_KEY: &str = "workflows";

/// The reserved `workflows` section, typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowsSection {
    /// Ordered list of currently-enabled workflow names.
    #[serde(default)]
    pub active: Vec<String>,
    /// Installed workflow records, keyed by workflow name.
    #[serde(default)]
    pub installed: BTreeMap<String, WorkflowEntry>,
}

impl WorkflowsSection {
    #[must_use]
    pub fn is_active(&self, name: &str) -> bool {
        self.active.iter().any(|n| n == name)
    }

    pub fn entry(&self, name: &str) -> Result<&WorkflowEntry> {
        self.installed
            .get(name)
            .ok_or_else(|| WfmError::NotInstalled(name.to_string()))
    }

    /// Add to the active set, keeping order and uniqueness.
    pub fn activate(&mut self, name: &str) {
        if !self.is_active(name) {
            self.active.push(name.to_string());
        }
    }

    pub fn deactivate(&mut self, name: &str) {
        self.active.retain(|n| n != name);
    }

    /// Look up an installed workflow by package identity.
    #[must_use]
    pub fn find_by_package(&self, package: &str) -> Option<(&str, &WorkflowEntry)> {
        self.installed
            .iter()
            .find(|(_, entry)| entry.package == package)
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Which workflow (other than `exclude`) owns a live-tree destination.
    ///
    /// Ownership is exclusive: at most one entry tracks a given destination.
    #[must_use]
    pub fn owner_of(&self, dest: &str, exclude: Option<&str>) -> Option<&str> {
        self.installed
            .iter()
            .filter(|(name, _)| exclude != Some(name.as_str()))
            .find(|(_, entry)| entry.files.iter().any(|f| f.dest == dest))
            .map(|(name, _)| name.as_str())
    }
}

/// Handle over the project config file.
#[derive(Debug)]
pub struct ConfigDoc {
    path: PathBuf,
    root: toml::Table,
    /// Parsed snapshot from read time, used to diff on write.
    original: toml::Table,
    /// Raw text from read time; None when the file did not exist.
    raw: Option<String>,
}

impl ConfigDoc {
    /// Read the project config. A missing file yields an empty document.
    pub fn read(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(text) => Some(text),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                return Err(WfmError::Config(format!(
                    "read config {}: {err}",
                    path.display()
                )));
            }
        };

        let root: toml::Table = match &raw {
            Some(text) => toml::from_str(text).map_err(|err| {
                WfmError::ConfigParse(format!("parse {}: {err}", path.display()))
            })?,
            None => toml::Table::new(),
        };

        Ok(Self {
            path,
            original: root.clone(),
            root,
            raw,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed view of the reserved `workflows` key.
    pub fn workflows(&self) -> Result<WorkflowsSection> {
        match self.root.get(WORKFLOWS_KEY) {
            None => Ok(WorkflowsSection::default()),
            Some(value) => value.clone().try_into().map_err(|err| {
                WfmError::ConfigParse(format!("invalid [{WORKFLOWS_KEY}] section: {err}"))
            }),
        }
    }

    /// Replace the reserved `workflows` key in memory. Nothing is persisted
    /// until [`ConfigDoc::write`].
    pub fn set_workflows(&mut self, section: &WorkflowsSection) -> Result<()> {
        let value = toml::Value::try_from(section).map_err(|err| {
            WfmError::Config(format!("serialize [{WORKFLOWS_KEY}] section: {err}"))
        })?;
        self.root.insert(WORKFLOWS_KEY.to_string(), value);
        Ok(())
    }

    /// Names present under a user-override section (`[agents.*]` etc.).
    #[must_use]
    pub fn user_override_names(&self, entity: Entity) -> BTreeSet<String> {
        self.root
            .get(entity.config_key())
            .and_then(toml::Value::as_table)
            .map(|table| table.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Commit the in-memory document to disk.
    ///
    /// Top-level keys whose value is unchanged since read are emitted
    /// byte-identical from the captured raw text; changed or new keys are
    /// re-serialized. Deleted keys are dropped.
    pub fn write(&self) -> Result<()> {
        let text = match &self.raw {
            Some(raw) => self.splice(raw)?,
            None => toml::to_string_pretty(&self.root)
                .map_err(|err| WfmError::Config(format!("serialize config: {err}")))?,
        };
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, text)
            .map_err(|err| WfmError::Config(format!("write {}: {err}", self.path.display())))?;
        debug!(path = %self.path.display(), "config committed");
        Ok(())
    }

    fn splice(&self, raw: &str) -> Result<String> {
        let spans = split_top_level_spans(raw);
        let mut reserialized: BTreeSet<String> = BTreeSet::new();
        let mut out = String::new();

        for span in &spans {
            match &span.key {
                None => out.push_str(&span.text),
                Some(key) => {
                    let old = self.original.get(key);
                    let new = self.root.get(key);
                    match new {
                        // Key deleted since read: drop the span.
                        None => {}
                        Some(value) if Some(value) == old => {
                            // Unchanged: preserve original bytes (every span
                            // of the key, should comments have split it).
                            out.push_str(&span.text);
                        }
                        Some(value) => {
                            if reserialized.insert(key.clone()) {
                                push_serialized_key(&mut out, key, value)?;
                            }
                        }
                    }
                }
            }
        }

        // Keys added since read.
        for (key, value) in &self.root {
            if !spans.iter().any(|s| s.key.as_deref() == Some(key.as_str())) {
                push_serialized_key(&mut out, key, value)?;
            }
        }

        Ok(out)
    }
}

fn push_serialized_key(out: &mut String, key: &str, value: &toml::Value) -> Result<()> {
    let mut table = toml::Table::new();
    table.insert(key.to_string(), value.clone());
    let chunk = toml::to_string_pretty(&table)
        .map_err(|err| WfmError::Config(format!("serialize config key {key}: {err}")))?;
    if !out.is_empty() && !out.ends_with("\n\n") {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');
    }
    out.push_str(&chunk);
    Ok(())
}

/// One contiguous region of raw config text attributed to a single top-level
/// key (or to no key, for leading comments).
#[derive(Debug, PartialEq)]
struct Span {
    key: Option<String>,
    text: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum StrState {
    None,
    Basic,
    Literal,
    TripleBasic,
    TripleLiteral,
}

/// Split raw TOML into top-level key spans.
///
/// Line-based scan that tracks string and bracket state so header-looking
/// lines inside multi-line strings or arrays are not mistaken for section
/// starts. Consecutive sections sharing a first dotted segment (for example
/// `[workflows]` and `[workflows.installed.x]`) merge into one span. Blank
/// and comment lines attach to the following span.
fn split_top_level_spans(raw: &str) -> Vec<Span> {
    let mut spans: Vec<Span> = Vec::new();
    let mut pending = String::new();
    let mut str_state = StrState::None;
    let mut depth: usize = 0;
    // Bare keys are only recognized before the first section header.
    let mut seen_header = false;

    for line in raw.split_inclusive('\n') {
        let at_top = str_state == StrState::None && depth == 0;
        let trimmed = line.trim_start();

        if at_top && (trimmed.is_empty() || trimmed.starts_with('#')) {
            pending.push_str(line);
            continue;
        }

        if at_top && trimmed.starts_with('[') {
            let key = header_first_segment(trimmed);
            seen_header = true;
            match spans.last_mut() {
                Some(last) if last.key.as_deref() == Some(key.as_str()) && pending.trim().is_empty() => {
                    last.text.push_str(&pending);
                    last.text.push_str(line);
                }
                _ => {
                    let mut text = std::mem::take(&mut pending);
                    text.push_str(line);
                    spans.push(Span {
                        key: Some(key),
                        text,
                    });
                }
            }
            pending.clear();
            scan_line(line, &mut str_state, &mut depth);
            continue;
        }

        if at_top && !seen_header {
            // Bare top-level key assignment.
            let key = bare_key_first_segment(trimmed);
            let mut text = std::mem::take(&mut pending);
            text.push_str(line);
            spans.push(Span {
                key: Some(key),
                text,
            });
            scan_line(line, &mut str_state, &mut depth);
            continue;
        }

        // Continuation of the current span (multi-line value, or content
        // under the most recent header).
        if let Some(last) = spans.last_mut() {
            last.text.push_str(&pending);
            pending.clear();
            last.text.push_str(line);
        } else {
            pending.push_str(line);
        }
        scan_line(line, &mut str_state, &mut depth);
    }

    if !pending.is_empty() {
        match spans.last_mut() {
            Some(last) => last.text.push_str(&pending),
            None => spans.push(Span {
                key: None,
                text: pending,
            }),
        }
    }

    spans
}

/// Advance string/bracket state across one line.
fn scan_line(line: &str, str_state: &mut StrState, depth: &mut usize) {
    let bytes: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        match *str_state {
            StrState::None => match c {
                '#' => return,
                '"' => {
                    if bytes.get(i + 1) == Some(&'"') && bytes.get(i + 2) == Some(&'"') {
                        *str_state = StrState::TripleBasic;
                        i += 2;
                    } else {
                        *str_state = StrState::Basic;
                    }
                }
                '\'' => {
                    if bytes.get(i + 1) == Some(&'\'') && bytes.get(i + 2) == Some(&'\'') {
                        *str_state = StrState::TripleLiteral;
                        i += 2;
                    } else {
                        *str_state = StrState::Literal;
                    }
                }
                '[' | '{' => *depth += 1,
                ']' | '}' => *depth = depth.saturating_sub(1),
                _ => {}
            },
            StrState::Basic => match c {
                '\\' => i += 1,
                '"' => *str_state = StrState::None,
                _ => {}
            },
            StrState::Literal => {
                if c == '\'' {
                    *str_state = StrState::None;
                }
            }
            StrState::TripleBasic => match c {
                '\\' => i += 1,
                '"' if bytes.get(i + 1) == Some(&'"') && bytes.get(i + 2) == Some(&'"') => {
                    *str_state = StrState::None;
                    i += 2;
                }
                _ => {}
            },
            StrState::TripleLiteral => {
                if c == '\''
                    && bytes.get(i + 1) == Some(&'\'')
                    && bytes.get(i + 2) == Some(&'\'')
                {
                    *str_state = StrState::None;
                    i += 2;
                }
            }
        }
        i += 1;
    }
    // Single-line strings cannot span lines; an unterminated one is a parse
    // error upstream, so reset rather than poison the rest of the scan.
    if matches!(*str_state, StrState::Basic | StrState::Literal) {
        *str_state = StrState::None;
    }
    // Headers like `[workflows]` balance their own brackets within the line;
    // the depth here only persists for genuinely multi-line values.
}

/// First dotted segment of a `[section]` or `[[section]]` header name.
fn header_first_segment(trimmed: &str) -> String {
    let inner = trimmed
        .trim_start_matches('[')
        .split(']')
        .next()
        .unwrap_or("")
        .trim();
    first_segment(inner)
}

/// First dotted segment of a bare `key = value` line.
fn bare_key_first_segment(trimmed: &str) -> String {
    let key_part = trimmed.split('=').next().unwrap_or("").trim();
    first_segment(key_part)
}

fn first_segment(key: &str) -> String {
    let key = key.trim();
    if let Some(rest) = key.strip_prefix('"') {
        return rest.split('"').next().unwrap_or("").to_string();
    }
    if let Some(rest) = key.strip_prefix('\'') {
        return rest.split('\'').next().unwrap_or("").to_string();
    }
    key.split('.').next().unwrap_or("").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    use crate::model::WorkflowEntry;

    const SAMPLE: &str = r#"# Project workflows config
title = "my project"

# User-defined agent override
[agents.helper]
model = "fast"

[workflows]
active = ["review"]

[workflows.installed.review]
package = "acme/review"
version = "1.0.0"

[extra]
note = "keep me"
"#;

    #[test]
    fn read_missing_file_yields_empty_doc() {
        let dir = tempdir().unwrap();
        let doc = ConfigDoc::read(dir.path()).unwrap();
        let section = doc.workflows().unwrap();
        assert!(section.active.is_empty());
        assert!(section.installed.is_empty());
    }

    #[test]
    fn read_malformed_is_parse_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "not = [valid").unwrap();
        let err = ConfigDoc::read(dir.path()).unwrap_err();
        assert!(matches!(err, WfmError::ConfigParse(_)));
    }

    #[test]
    fn workflows_section_roundtrip() {
        let dir = tempdir().unwrap();
        let mut doc = ConfigDoc::read(dir.path()).unwrap();
        let mut section = WorkflowsSection::default();
        section
            .installed
            .insert("review".to_string(), WorkflowEntry::new("acme/review", "1.0.0"));
        section.activate("review");
        doc.set_workflows(&section).unwrap();
        doc.write().unwrap();

        let doc = ConfigDoc::read(dir.path()).unwrap();
        let reread = doc.workflows().unwrap();
        assert_eq!(reread.active, vec!["review".to_string()]);
        assert_eq!(reread.installed["review"].package, "acme/review");
    }

    #[test]
    fn write_preserves_untouched_keys_byte_identical() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();

        let mut doc = ConfigDoc::read(dir.path()).unwrap();
        let mut section = doc.workflows().unwrap();
        section.deactivate("review");
        doc.set_workflows(&section).unwrap();
        doc.write().unwrap();

        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert!(written.contains("# Project workflows config\ntitle = \"my project\""));
        assert!(written.contains("# User-defined agent override\n[agents.helper]\nmodel = \"fast\""));
        assert!(written.contains("[extra]\nnote = \"keep me\""));
        // The edited section was re-serialized without the active entry.
        assert!(!written.contains("active = [\"review\"]"));
        assert!(written.contains("[workflows.installed.review]"));
    }

    #[test]
    fn write_without_changes_is_identity() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let doc = ConfigDoc::read(dir.path()).unwrap();
        doc.write().unwrap();
        let written = std::fs::read_to_string(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(written, SAMPLE);
    }

    #[test]
    fn user_override_names_reads_entity_sections() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), SAMPLE).unwrap();
        let doc = ConfigDoc::read(dir.path()).unwrap();
        let agents = doc.user_override_names(Entity::Agent);
        assert!(agents.contains("helper"));
        assert!(doc.user_override_names(Entity::Command).is_empty());
    }

    #[test]
    fn owner_of_finds_exclusive_owner() {
        let mut section = WorkflowsSection::default();
        let mut entry = WorkflowEntry::new("acme/a", "1.0.0");
        entry.files.push(crate::model::InstalledFile {
            source: "agents/x.md".to_string(),
            dest: "agents/x.md".to_string(),
            hash: "sha256:0".to_string(),
        });
        section.installed.insert("a".to_string(), entry);
        assert_eq!(section.owner_of("agents/x.md", None), Some("a"));
        assert_eq!(section.owner_of("agents/x.md", Some("a")), None);
        assert_eq!(section.owner_of("agents/y.md", None), None);
    }

    #[test]
    fn spans_attach_comments_to_following_key() {
        let spans = split_top_level_spans(SAMPLE);
        let keys: Vec<Option<&str>> = spans.iter().map(|s| s.key.as_deref()).collect();
        assert_eq!(
            keys,
            vec![Some("title"), Some("agents"), Some("workflows"), Some("extra")]
        );
        assert!(spans[0].text.starts_with("# Project workflows config"));
        assert!(spans[1].text.starts_with("\n# User-defined agent override"));
    }

    #[test]
    fn spans_ignore_headers_inside_strings() {
        let raw = "text = \"\"\"\n[not-a-header]\n\"\"\"\n[real]\nx = 1\n";
        let spans = split_top_level_spans(raw);
        let keys: Vec<Option<&str>> = spans.iter().map(|s| s.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("text"), Some("real")]);
    }

    #[test]
    fn spans_track_multiline_arrays() {
        let raw = "list = [\n  1,\n  2,\n]\n[section]\nx = 1\n";
        let spans = split_top_level_spans(raw);
        let keys: Vec<Option<&str>> = spans.iter().map(|s| s.key.as_deref()).collect();
        assert_eq!(keys, vec![Some("list"), Some("section")]);
        assert_eq!(spans[0].text, "list = [\n  1,\n  2,\n]\n");
    }
}
