//! Integration tests for preorder-label-build.

use preorder_label::PreorderLabel;
use preorder_label_build::{GenerateError, LockFile, generate, generate_with_lock};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
    lock: PathBuf,
    output: PathBuf,
}

impl Workspace {
    fn new(paths: &[&str], on_remove: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        let ws = Self {
            config: dir.path().join("labels.toml"),
            lock: dir.path().join("labels.lock.toml"),
            output: dir.path().join("generated.rs"),
            dir,
        };
        ws.write_config(paths, on_remove);
        ws
    }

    fn write_config(&self, paths: &[&str], on_remove: Option<&str>) {
        let paths_str = paths
            .iter()
            .map(|p| format!("\"{}\"", p))
            .collect::<Vec<_>>()
            .join(", ");
        let header = on_remove
            .map(|mode| format!("on_remove = \"{}\"\n", mode))
            .unwrap_or_default();
        fs::write(
            &self.config,
            format!("{}\n[tree]\npaths = [{}]\n", header, paths_str),
        )
        .unwrap();
    }

    fn build(&self) -> Result<(), GenerateError> {
        generate_with_lock(&self.config, &self.lock, &self.output)
    }

    fn lock_file(&self) -> LockFile {
        LockFile::from_file(&self.lock).unwrap()
    }

    fn label(&self, path: &str) -> PreorderLabel {
        self.lock_file().get(path).unwrap().label.clone()
    }

    fn code(&self) -> String {
        fs::read_to_string(&self.output).unwrap()
    }
}

#[test]
fn first_build_creates_lock_file() {
    let ws = Workspace::new(&["Docs.Guide.Install", "Api.Reference"], None);
    ws.build().unwrap();

    assert!(ws.lock.exists());
    assert!(ws.output.exists());

    let lock = ws.lock_file();
    for path in ["Docs", "Docs.Guide", "Docs.Guide.Install", "Api", "Api.Reference"] {
        assert!(lock.get(path).is_some(), "missing {}", path);
    }
    assert!(ws.label("Docs.Guide").is_child_of(&ws.label("Docs")));
    assert!(ws.label("Docs") < ws.label("Api"));
}

#[test]
fn generate_derives_lock_path_from_config() {
    let ws = Workspace::new(&["Docs"], None);
    generate(&ws.config, &ws.output).unwrap();
    assert!(ws.dir.path().join("labels.lock.toml").exists());
}

#[test]
fn adding_paths_keeps_existing_labels() {
    let ws = Workspace::new(&["Docs.Intro", "Docs.Faq", "Api"], None);
    ws.build().unwrap();
    let before = ws.lock_file();

    ws.write_config(
        &["Docs.Intro", "Docs.Guide", "Docs.Faq", "Api", "Changelog"],
        None,
    );
    ws.build().unwrap();
    let after = ws.lock_file();

    assert_eq!(after.entries.len(), before.entries.len() + 2);
    for entry in &before.entries {
        assert_eq!(after.get(&entry.path).unwrap().label, entry.label);
    }

    let order: Vec<_> = after
        .sorted_entries()
        .into_iter()
        .map(|e| e.path.as_str())
        .collect();
    assert_eq!(
        order,
        ["Docs", "Docs.Intro", "Docs.Guide", "Docs.Faq", "Api", "Changelog"]
    );
}

#[test]
fn removing_paths_causes_error() {
    let ws = Workspace::new(&["Docs.Intro", "Api.Reference"], None);
    ws.build().unwrap();

    ws.write_config(&["Docs.Intro"], None);
    match ws.build().unwrap_err() {
        GenerateError::LockMismatch(msg) => {
            assert!(msg.contains("Api"), "Error should mention removed path");
            assert!(msg.contains("Api.Reference"), "Error should mention removed path");
        }
        other => panic!("Expected LockMismatch, got: {:?}", other),
    }
}

#[test]
fn unchanged_config_leaves_lock_untouched() {
    let ws = Workspace::new(&["Docs.Intro"], None);
    ws.build().unwrap();
    let first = fs::read_to_string(&ws.lock).unwrap();

    ws.build().unwrap();
    ws.build().unwrap();
    assert_eq!(fs::read_to_string(&ws.lock).unwrap(), first);
}

#[test]
fn deleting_lock_allows_breaking_change() {
    let ws = Workspace::new(&["Docs.Intro", "Api.Reference"], None);
    ws.build().unwrap();

    ws.write_config(&["Docs.Intro"], None);
    fs::remove_file(&ws.lock).unwrap();
    ws.build().unwrap();

    let lock = ws.lock_file();
    assert!(lock.get("Docs.Intro").is_some());
    assert!(lock.get("Api").is_none());
    assert!(lock.get("Api.Reference").is_none());
}

#[test]
fn warn_mode_deprecates_removed_paths() {
    let ws = Workspace::new(&["Docs.Intro", "Api.Reference"], Some("warn"));
    ws.build().unwrap();

    ws.write_config(&["Docs.Intro"], Some("warn"));
    ws.build().unwrap();

    let lock = ws.lock_file();
    let deprecated: Vec<_> = lock.deprecated_entries().map(|e| e.path.as_str()).collect();
    assert!(deprecated.contains(&"Api"));
    assert!(deprecated.contains(&"Api.Reference"));

    let active: Vec<_> = lock.active_entries().map(|e| e.path.as_str()).collect();
    assert_eq!(active, ["Docs", "Docs.Intro"]);

    let code = ws.code();
    assert!(code.contains("#[deprecated(note = \"'Api' was removed"));
    assert!(code.contains("pub mod Reference {"));

    // Still deprecated after another build
    ws.build().unwrap();
    assert!(ws.lock_file().get("Api").unwrap().deprecated);
}

#[test]
fn deprecated_labels_are_never_reused() {
    let ws = Workspace::new(&["Intro", "Legacy", "Outro"], Some("warn"));
    ws.build().unwrap();
    let legacy = ws.label("Legacy");

    ws.write_config(&["Intro", "Replacement", "Outro"], Some("warn"));
    ws.build().unwrap();

    let replacement = ws.label("Replacement");
    assert_ne!(replacement, legacy);
    assert!(ws.label("Intro") < replacement);
    assert!(replacement < ws.label("Outro"));
}

#[test]
fn returning_path_gets_its_old_label() {
    let ws = Workspace::new(&["Docs", "Api"], Some("warn"));
    ws.build().unwrap();
    let api = ws.label("Api");

    ws.write_config(&["Docs"], Some("warn"));
    ws.build().unwrap();
    ws.write_config(&["Docs", "Api"], Some("warn"));
    ws.build().unwrap();

    let entry = ws.lock_file().get("Api").cloned().unwrap();
    assert_eq!(entry.label, api);
    assert!(!entry.deprecated);
}

#[test]
fn generated_code_has_correct_structure() {
    let ws = Workspace::new(&["Docs.Guide.Install", "Docs.Intro"], None);
    fs::write(
        &ws.config,
        "module_name = \"Outline\"\n\n[tree]\npaths = [\"Docs.Guide.Install\", \"Docs.Intro\"]\n",
    )
    .unwrap();
    ws.build().unwrap();

    let code = ws.code();
    assert!(code.contains("pub mod Outline {"));
    assert!(code.contains("pub mod Docs {"));
    assert!(code.contains("pub mod Guide {"));
    assert!(code.contains("pub mod Install {"));
    assert!(code.contains("pub mod Intro {"));
    assert!(code.contains("pub const PATH: &str = \"Docs.Guide.Install\";"));

    let install = ws.label("Docs.Guide.Install");
    let literal: String = install
        .as_bytes()
        .iter()
        .map(|b| format!("\\x{:02x}", b))
        .collect();
    assert!(code.contains(&format!("pub const LABEL: &[u8] = b\"{}\";", literal)));
}

#[test]
fn corrupt_lock_file_is_reported() {
    let ws = Workspace::new(&["Docs"], None);
    fs::write(&ws.lock, "version = 1\ngenerated_at = \"x\"\n\n[[entry]]\npath = \"Docs\"\nlabel = \"81\"\n").unwrap();
    assert!(matches!(ws.build(), Err(GenerateError::Lock(_))));
}
