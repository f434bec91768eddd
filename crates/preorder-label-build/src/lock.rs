//! Lock file management for labels.lock.toml.
//!
//! The lock file pins every outline path to the label it was first given.
//! Labels are never reassigned: new paths are squeezed in between the labels
//! already handed out, and removed paths keep their label as a deprecated
//! entry so it cannot be reused.

use preorder_label::{Bound, LabelError, PreorderLabel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::toml_parser::{OutlineConfig, OutlineEntry};

/// Lock file format version.
pub const LOCK_VERSION: u32 = 1;

/// Contents of labels.lock.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockFile {
    pub version: u32,
    /// RFC 3339 timestamp of the last change to the entries
    pub generated_at: String,
    #[serde(default, rename = "entry")]
    pub entries: Vec<LockEntry>,
}

/// One pinned path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    pub path: String,
    /// Hex-encoded in the file
    pub label: PreorderLabel,
    #[serde(default, skip_serializing_if = "is_false")]
    pub deprecated: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Paths that differ between the config and the lock file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockDiff {
    /// In the config, not in the lock (outline order)
    pub added: Vec<String>,
    /// Active in the lock, no longer in the config
    pub removed: Vec<String>,
    /// Deprecated in the lock, back in the config
    pub revived: Vec<String>,
}

impl LockDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.revived.is_empty()
    }
}

impl LockFile {
    /// An empty lock stamped with the current time.
    pub fn new() -> Self {
        Self {
            version: LOCK_VERSION,
            generated_at: now(),
            entries: Vec::new(),
        }
    }

    /// Assign labels for a whole outline from scratch.
    pub fn from_config(config: &OutlineConfig) -> Result<Self, LockFileError> {
        let mut lock = Self::new();
        let all: Vec<&OutlineEntry> = config.entries().collect();
        lock.allocate(config, &all)?;
        info!(entries = lock.entries.len(), "assigned labels for new outline");
        Ok(lock)
    }

    /// Read from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LockFileError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| LockFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse and check a lock file.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, LockFileError> {
        let lock: Self = toml::from_str(content)?;
        if lock.version != LOCK_VERSION {
            return Err(LockFileError::UnsupportedVersion(lock.version));
        }
        lock.check()?;
        Ok(lock)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> Result<String, LockFileError> {
        let body = toml::to_string(self)?;
        Ok(format!(
            "# Generated by preorder-label-build. Commit this file.\n\
             # Labels listed here are never reassigned.\n\n{}",
            body
        ))
    }

    /// Write to disk.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> Result<(), LockFileError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?).map_err(|source| LockFileError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, path: &str) -> Option<&LockEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn active_entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.entries.iter().filter(|e| !e.deprecated)
    }

    pub fn deprecated_entries(&self) -> impl Iterator<Item = &LockEntry> {
        self.entries.iter().filter(|e| e.deprecated)
    }

    /// Entries in document order.
    pub fn sorted_entries(&self) -> Vec<&LockEntry> {
        let mut sorted: Vec<&LockEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| a.label.cmp(&b.label));
        sorted
    }

    /// Compare against the current config.
    pub fn diff(&self, config: &OutlineConfig) -> LockDiff {
        let locked: HashMap<&str, &LockEntry> =
            self.entries.iter().map(|e| (e.path.as_str(), e)).collect();

        let mut diff = LockDiff::default();
        for entry in config.entries() {
            match locked.get(entry.path.as_str()) {
                None => diff.added.push(entry.path.clone()),
                Some(locked) if locked.deprecated => diff.revived.push(entry.path.clone()),
                Some(_) => {}
            }
        }
        diff.removed = self
            .active_entries()
            .filter(|e| config.get(&e.path).is_none())
            .map(|e| e.path.clone())
            .collect();
        diff
    }

    /// Mark a path deprecated. Returns `false` if it is not in the lock.
    pub fn mark_deprecated(&mut self, path: &str) -> bool {
        self.set_deprecated(path, true)
    }

    /// Bring a deprecated path back into use with its old label.
    pub fn revive(&mut self, path: &str) -> bool {
        self.set_deprecated(path, false)
    }

    fn set_deprecated(&mut self, path: &str, deprecated: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.path == path) {
            Some(entry) => {
                if entry.deprecated != deprecated {
                    entry.deprecated = deprecated;
                    self.generated_at = now();
                }
                true
            }
            None => false,
        }
    }

    /// Assign labels to paths that are in the config but not yet locked.
    ///
    /// Existing labels stay untouched. A run of new siblings goes right after
    /// the nearest locked sibling that precedes it in the outline, before the
    /// next label already taken under the same parent.
    pub fn add_paths(
        &mut self,
        config: &OutlineConfig,
        paths: &[String],
    ) -> Result<(), LockFileError> {
        let wanted: HashSet<&str> = paths.iter().map(String::as_str).collect();
        let new: Vec<&OutlineEntry> = config
            .entries()
            .filter(|e| wanted.contains(e.path.as_str()) && self.get(&e.path).is_none())
            .collect();
        if new.is_empty() {
            return Ok(());
        }
        self.allocate(config, &new)?;
        self.generated_at = now();
        info!(added = new.len(), "extended lock file");
        Ok(())
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    fn allocate(
        &mut self,
        config: &OutlineConfig,
        new: &[&OutlineEntry],
    ) -> Result<(), LockFileError> {
        // Parents precede children in outline order, so each parent is
        // labeled before its own group is placed.
        let mut parents: Vec<Option<&str>> = Vec::new();
        for entry in new {
            let parent = entry.parent.as_deref();
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }

        let is_new: HashSet<&str> = new.iter().map(|e| e.path.as_str()).collect();
        for parent in parents {
            let parent_label = match parent {
                None => PreorderLabel::root(),
                Some(path) => self
                    .get(path)
                    .map(|e| e.label.clone())
                    .ok_or_else(|| LockFileError::MissingParent(path.to_string()))?,
            };
            self.allocate_group(config, parent, &parent_label, &is_new)?;
        }
        Ok(())
    }

    fn allocate_group(
        &mut self,
        config: &OutlineConfig,
        parent: Option<&str>,
        parent_label: &PreorderLabel,
        is_new: &HashSet<&str>,
    ) -> Result<(), LockFileError> {
        let mut prev: Option<PreorderLabel> = None;
        let mut run: Vec<String> = Vec::new();

        for sibling in config.children_of(parent) {
            if is_new.contains(sibling.path.as_str()) {
                run.push(sibling.path.clone());
                continue;
            }
            let Some(locked) = self.get(&sibling.path) else {
                continue;
            };
            let label = locked.label.clone();
            self.place_run(parent_label, prev.as_ref(), &mut run)?;
            prev = Some(label);
        }
        self.place_run(parent_label, prev.as_ref(), &mut run)
    }

    fn place_run(
        &mut self,
        parent: &PreorderLabel,
        prev: Option<&PreorderLabel>,
        run: &mut Vec<String>,
    ) -> Result<(), LockFileError> {
        if run.is_empty() {
            return Ok(());
        }

        let next = self.next_taken(parent, prev);
        let labels = match (prev, &next) {
            (None, None) => parent.create_children(run.len())?,
            (None, Some(next)) => next.create_siblings(Bound::First, run.len())?,
            (Some(prev), None) => prev.create_siblings(Bound::Last, run.len())?,
            (Some(prev), Some(next)) => prev.create_siblings(next, run.len())?,
        };

        debug!(
            parent = %parent,
            after = ?prev.map(PreorderLabel::to_hex),
            before = ?next.as_ref().map(PreorderLabel::to_hex),
            count = run.len(),
            "placing new siblings"
        );

        for (path, label) in run.drain(..).zip(labels) {
            self.entries.push(LockEntry {
                path,
                label,
                deprecated: false,
            });
        }
        Ok(())
    }

    /// Smallest label under `parent` after `prev`, deprecated ones included.
    fn next_taken(
        &self,
        parent: &PreorderLabel,
        prev: Option<&PreorderLabel>,
    ) -> Option<PreorderLabel> {
        self.entries
            .iter()
            .map(|e| &e.label)
            .filter(|label| label.is_child_of(parent))
            .filter(|label| prev.is_none_or(|prev| *label > prev))
            .min()
            .cloned()
    }

    /// Paths and labels must be unique and every parent must be locked.
    fn check(&self) -> Result<(), LockFileError> {
        let mut paths: HashMap<&str, &PreorderLabel> = HashMap::new();
        let mut labels: HashMap<&PreorderLabel, &str> = HashMap::new();

        for entry in &self.entries {
            if paths.insert(&entry.path, &entry.label).is_some() {
                return Err(LockFileError::DuplicatePath(entry.path.clone()));
            }
            if let Some(first) = labels.insert(&entry.label, &entry.path) {
                return Err(LockFileError::DuplicateLabel {
                    label: entry.label.to_hex(),
                    first: first.to_string(),
                    second: entry.path.clone(),
                });
            }
        }

        for entry in &self.entries {
            let expected = match entry.path.rsplit_once('.') {
                None => PreorderLabel::root(),
                Some((parent, _)) => match paths.get(parent) {
                    Some(label) => (*label).clone(),
                    None => return Err(LockFileError::MissingParent(parent.to_string())),
                },
            };
            if !entry.label.is_child_of(&expected) {
                return Err(LockFileError::Misplaced {
                    path: entry.path.clone(),
                    label: entry.label.to_hex(),
                });
            }
        }
        Ok(())
    }
}

impl Default for LockFile {
    fn default() -> Self {
        Self::new()
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Errors reading, writing or extending a lock file.
#[derive(Debug, Error)]
pub enum LockFileError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unsupported lock file version {0} (expected {})", LOCK_VERSION)]
    UnsupportedVersion(u32),

    #[error("path '{0}' appears more than once")]
    DuplicatePath(String),

    #[error("label {label} is assigned to both '{first}' and '{second}'")]
    DuplicateLabel {
        label: String,
        first: String,
        second: String,
    },

    #[error("parent '{0}' is not in the lock file")]
    MissingParent(String),

    #[error("label {label} of '{path}' is not a child of its parent's label")]
    Misplaced { path: String, label: String },

    #[error("label allocation failed: {0}")]
    Label(#[from] LabelError),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(paths: &[&str]) -> OutlineConfig {
        let quoted: Vec<String> = paths.iter().map(|p| format!("\"{}\"", p)).collect();
        OutlineConfig::from_str(&format!("[tree]\npaths = [{}]\n", quoted.join(", "))).unwrap()
    }

    fn hex(lock: &LockFile, path: &str) -> String {
        lock.get(path).unwrap().label.to_hex()
    }

    #[test]
    fn first_build_uses_balanced_children() {
        let lock = LockFile::from_config(&config(&["A.X", "A.Y", "B", "C"])).unwrap();

        assert_eq!(hex(&lock, "A"), "40");
        assert_eq!(hex(&lock, "B"), "80");
        assert_eq!(hex(&lock, "C"), "c0");
        assert_eq!(hex(&lock, "A.X"), "4040");
        assert_eq!(hex(&lock, "A.Y"), "4080");
    }

    #[test]
    fn labels_follow_outline_order() {
        let lock = LockFile::from_config(&config(&["Z", "M", "A"])).unwrap();
        let order: Vec<_> = lock
            .sorted_entries()
            .into_iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(order, ["Z", "M", "A"]);
    }

    #[test]
    fn new_paths_slot_between_existing() {
        let mut lock = LockFile::from_config(&config(&["A", "C"])).unwrap();
        let before = lock.clone();

        let updated = config(&["A", "B1", "B2", "C", "D"]);
        let diff = lock.diff(&updated);
        assert_eq!(diff.added, ["B1", "B2", "D"]);
        lock.add_paths(&updated, &diff.added).unwrap();

        for entry in &before.entries {
            assert_eq!(lock.get(&entry.path).unwrap().label, entry.label);
        }
        let order: Vec<_> = lock
            .sorted_entries()
            .into_iter()
            .map(|e| e.path.as_str())
            .collect();
        assert_eq!(order, ["A", "B1", "B2", "C", "D"]);
    }

    #[test]
    fn new_first_sibling_goes_before_everything() {
        let mut lock = LockFile::from_config(&config(&["B"])).unwrap();
        let updated = config(&["A", "B"]);
        lock.add_paths(&updated, &["A".to_string()]).unwrap();
        assert!(lock.get("A").unwrap().label < lock.get("B").unwrap().label);
    }

    #[test]
    fn deprecated_labels_stay_occupied() {
        let mut lock = LockFile::from_config(&config(&["A", "B", "C"])).unwrap();
        assert!(lock.mark_deprecated("B"));
        let retired = lock.get("B").unwrap().label.clone();

        // "New" follows A in the outline; B's label sits right after A.
        let updated = config(&["A", "New", "C"]);
        lock.add_paths(&updated, &["New".to_string()]).unwrap();

        let new_label = &lock.get("New").unwrap().label;
        assert_ne!(new_label, &retired);
        assert!(&lock.get("A").unwrap().label < new_label);
        assert!(new_label < &retired);
    }

    #[test]
    fn new_children_of_new_parent() {
        let mut lock = LockFile::from_config(&config(&["A"])).unwrap();
        let updated = config(&["A", "B.X", "B.Y"]);
        let diff = lock.diff(&updated);
        lock.add_paths(&updated, &diff.added).unwrap();

        let b = lock.get("B").unwrap().label.clone();
        let x = &lock.get("B.X").unwrap().label;
        let y = &lock.get("B.Y").unwrap().label;
        assert!(x.is_child_of(&b));
        assert!(y.is_child_of(&b));
        assert!(x < y);
    }

    #[test]
    fn diff_reports_removed_and_revived() {
        let mut lock = LockFile::from_config(&config(&["A", "B", "C"])).unwrap();
        lock.mark_deprecated("C");

        let diff = lock.diff(&config(&["A", "C"]));
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, ["B"]);
        assert_eq!(diff.revived, ["C"]);
    }

    #[test]
    fn toml_round_trip() {
        let mut lock = LockFile::from_config(&config(&["Docs.Intro", "Api"])).unwrap();
        lock.mark_deprecated("Api");

        let text = lock.to_toml_string().unwrap();
        assert!(text.contains("[[entry]]"));
        assert!(text.contains("label = \"4080\""));
        assert!(text.contains("deprecated = true"));

        assert_eq!(LockFile::from_str(&text).unwrap(), lock);
    }

    #[test]
    fn rejects_duplicate_labels() {
        let text = r#"
version = 1
generated_at = "2026-01-01T00:00:00+00:00"

[[entry]]
path = "A"
label = "80"

[[entry]]
path = "B"
label = "80"
"#;
        assert!(matches!(
            LockFile::from_str(text),
            Err(LockFileError::DuplicateLabel { .. })
        ));
    }

    #[test]
    fn rejects_misplaced_child() {
        let text = r#"
version = 1
generated_at = "2026-01-01T00:00:00+00:00"

[[entry]]
path = "A"
label = "80"

[[entry]]
path = "A.B"
label = "4080"
"#;
        assert!(matches!(
            LockFile::from_str(text),
            Err(LockFileError::Misplaced { .. })
        ));
    }

    #[test]
    fn rejects_unknown_version() {
        let text = "version = 9\ngenerated_at = \"2026-01-01T00:00:00+00:00\"\n";
        assert!(matches!(
            LockFile::from_str(text),
            Err(LockFileError::UnsupportedVersion(9))
        ));
    }
}
