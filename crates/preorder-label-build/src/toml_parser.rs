//! TOML configuration parser for labels.toml.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Words that cannot name a generated module, even as raw identifiers.
const RESERVED: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super", "trait",
    "true", "type", "unsafe", "use", "where", "while", "abstract", "become", "box", "do",
    "final", "macro", "override", "priv", "try", "typeof", "unsized", "virtual", "yield",
];

/// Behavior when a path is removed from config but exists in lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnRemove {
    /// Fail the build (default)
    #[default]
    Error,
    /// Keep the label reserved, generate it as `#[deprecated]`
    Warn,
}

/// Parsed outline configuration.
#[derive(Debug, Clone)]
pub struct OutlineConfig {
    /// Name of the generated top-level module
    pub module_name: String,
    /// Behavior when paths are removed
    pub on_remove: OnRemove,
    /// All nodes, ancestors included, in order of first appearance
    entries: Vec<OutlineEntry>,
}

/// One node of the outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Full dot-separated path (e.g., "Docs.Guide.Install")
    pub path: String,
    /// Number of segments; equals the depth of the node's label
    pub depth: usize,
    /// Parent path (None for top-level nodes)
    pub parent: Option<String>,
}

impl OutlineEntry {
    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOutlineConfig {
    module_name: Option<String>,
    on_remove: Option<String>,
    tree: RawTree,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTree {
    paths: Vec<String>,
}

impl OutlineConfig {
    /// Parse from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, OutlineConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| OutlineConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_str(&content)
    }

    /// Parse from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, OutlineConfigError> {
        let raw: RawOutlineConfig = toml::from_str(content)?;

        let module_name = raw.module_name.unwrap_or_else(|| "Labels".to_string());
        validate_segment(&module_name, &module_name)?;

        let on_remove = match raw.on_remove.as_deref() {
            None | Some("error") => OnRemove::Error,
            Some("warn") => OnRemove::Warn,
            Some(other) => {
                return Err(OutlineConfigError::Validation(format!(
                    "invalid on_remove value '{}': expected 'error' or 'warn'",
                    other
                )));
            }
        };

        let entries = Self::expand_paths(&raw.tree.paths)?;

        Ok(Self {
            module_name,
            on_remove,
            entries,
        })
    }

    /// All entries, parents before children.
    pub fn entries(&self) -> impl Iterator<Item = &OutlineEntry> {
        self.entries.iter()
    }

    /// Look up an entry by path.
    pub fn get(&self, path: &str) -> Option<&OutlineEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Children of `parent` (`None` for top level) in outline order.
    pub fn children_of<'a>(
        &'a self,
        parent: Option<&'a str>,
    ) -> impl Iterator<Item = &'a OutlineEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.parent.as_deref() == parent)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Expand paths to include all parent nodes.
    ///
    /// e.g., "A.B.C" expands to ["A", "A.B", "A.B.C"]. Sibling order is the
    /// order in which a node is first mentioned.
    fn expand_paths(paths: &[String]) -> Result<Vec<OutlineEntry>, OutlineConfigError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut entries: Vec<OutlineEntry> = Vec::new();

        for path in paths {
            if path.is_empty() {
                return Err(OutlineConfigError::Validation("empty path not allowed".into()));
            }

            let segments: Vec<&str> = path.split('.').collect();
            for seg in &segments {
                validate_segment(path, seg)?;
            }

            for depth in 1..=segments.len() {
                let node_path = segments[..depth].join(".");
                if seen.insert(node_path.clone()) {
                    let parent = (depth > 1).then(|| segments[..depth - 1].join("."));
                    entries.push(OutlineEntry {
                        path: node_path,
                        depth,
                        parent,
                    });
                }
            }
        }

        Ok(entries)
    }
}

/// A segment must be usable as a Rust module name.
fn validate_segment(path: &str, seg: &str) -> Result<(), OutlineConfigError> {
    let invalid = |reason: String| {
        OutlineConfigError::Validation(format!("invalid path '{}': {}", path, reason))
    };

    let mut chars = seg.chars();
    match chars.next() {
        None => return Err(invalid("empty segment".into())),
        Some(first) if !first.is_alphabetic() && first != '_' => {
            return Err(invalid(format!(
                "segment '{}' must start with letter or underscore",
                seg
            )));
        }
        Some(_) => {}
    }
    if let Some(c) = chars.find(|c| !c.is_alphanumeric() && *c != '_') {
        return Err(invalid(format!(
            "segment '{}' contains invalid character '{}'",
            seg, c
        )));
    }
    if seg == "_" || RESERVED.contains(&seg) {
        return Err(invalid(format!("segment '{}' is a reserved word", seg)));
    }
    Ok(())
}

/// Errors during config parsing.
#[derive(Debug, Error)]
pub enum OutlineConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),
}
