//! Build-time utilities for preorder-label.
//!
//! This crate provides tools for:
//! - Parsing `labels.toml` outline files
//! - Managing `labels.lock.toml` so a node keeps its label across builds
//! - Generating a Rust module tree of label constants
//!
//! # Usage in build.rs
//!
//! ```ignore
//! // build.rs
//! fn main() {
//!     println!("cargo:rerun-if-changed=labels.toml");
//!     println!("cargo:rerun-if-changed=labels.lock.toml");
//!     preorder_label_build::generate("labels.toml", "src/generated_labels.rs")
//!         .expect("Failed to generate labels");
//! }
//! ```
//!
//! # Lock File Mechanism
//!
//! Stored labels are keys: once a row is written under a label, the label
//! must never move. The lock file records every assignment:
//!
//! - First build: every node gets a balanced label from its parent
//! - New paths: slotted between labels already taken, nothing is renumbered
//! - Removed paths: **error** (default) or **deprecated** (with `on_remove = "warn"`)
//!
//! Deprecated labels stay reserved and are never handed out again. A path
//! that comes back gets its old label.
//!
//! ```toml
//! # labels.toml
//! module_name = "Labels"
//! on_remove = "warn"
//!
//! [tree]
//! paths = ["Docs.Intro", "Docs.Guide.Install", "Api"]
//! ```
//!
//! To intentionally start over, delete the lock file and rebuild. Every
//! label may change, so stored data has to be migrated.

mod codegen;
mod lock;
mod toml_parser;

pub use codegen::generate_label_code;
pub use lock::{LOCK_VERSION, LockDiff, LockEntry, LockFile, LockFileError};
pub use toml_parser::{OnRemove, OutlineConfig, OutlineConfigError, OutlineEntry};

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Main entry point for build.rs integration.
///
/// Reads `labels.toml`, reconciles it with `labels.lock.toml` next to it, and
/// writes the generated module to `output_path`.
///
/// # Errors
///
/// Returns an error if:
/// - `labels.toml` cannot be read or parsed
/// - the lock file is corrupt
/// - paths were removed and `on_remove = "error"`
/// - the output file cannot be written
pub fn generate(
    config_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config_path = config_path.as_ref();
    let lock_path = config_path.with_extension("lock.toml");
    generate_with_lock(config_path, &lock_path, output_path)
}

/// Generate with explicit lock file path.
pub fn generate_with_lock(
    config_path: impl AsRef<Path>,
    lock_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
) -> Result<(), GenerateError> {
    let config_path = config_path.as_ref();
    let lock_path = lock_path.as_ref();
    let output_path = output_path.as_ref();

    // 1. Parse labels.toml
    let config = OutlineConfig::from_file(config_path)?;
    debug!(path = %config_path.display(), nodes = config.len(), "parsed outline");

    // 2. Load the lock file, or assign everything from scratch
    let lock = if lock_path.exists() {
        let mut lock = LockFile::from_file(lock_path)?;
        reconcile(&mut lock, &config)?;
        lock
    } else {
        info!(path = %lock_path.display(), "no lock file, assigning fresh labels");
        LockFile::from_config(&config)?
    };

    // 3. Write lock file and generated code
    lock.write_to_file(lock_path)?;
    let code = generate_label_code(&config, &lock);
    std::fs::write(output_path, code).map_err(|source| GenerateError::Io {
        path: output_path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Bring `lock` in line with `config` without moving any existing label.
fn reconcile(lock: &mut LockFile, config: &OutlineConfig) -> Result<(), GenerateError> {
    let diff = lock.diff(config);
    if diff.is_empty() {
        debug!("lock file up to date");
        return Ok(());
    }

    if !diff.removed.is_empty() {
        match config.on_remove {
            OnRemove::Error => return Err(GenerateError::LockMismatch(format_lock_error(&diff))),
            OnRemove::Warn => {
                for path in &diff.removed {
                    lock.mark_deprecated(path);
                    warn!(%path, "path removed from outline, label kept as deprecated");
                    println!(
                        "cargo:warning=preorder-label: Path '{}' was removed from labels.toml and is now deprecated",
                        path
                    );
                }
            }
        }
    }

    for path in &diff.revived {
        lock.revive(path);
        info!(%path, "deprecated path is back, reusing its label");
    }

    lock.add_paths(config, &diff.added)?;
    Ok(())
}

fn format_lock_error(diff: &LockDiff) -> String {
    let mut msg = String::new();
    msg.push_str("preorder-label: Lock file mismatch!\n\n");
    msg.push_str("  Missing in labels.toml (existed in lock):\n");
    for path in &diff.removed {
        msg.push_str(&format!("    - {}\n", path));
    }
    msg.push_str("\n  To fix:\n");
    msg.push_str("    1. Add the path(s) back to labels.toml, OR\n");
    msg.push_str("    2. Set `on_remove = \"warn\"` in labels.toml to deprecate instead, OR\n");
    msg.push_str("    3. Delete labels.lock.toml to relabel everything (BREAKING CHANGE!)\n");
    msg
}

/// Errors that can occur during generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// Failed to parse labels.toml
    #[error("config error: {0}")]
    Config(#[from] OutlineConfigError),

    /// Failed to read, write or extend the lock file
    #[error("lock file error: {0}")]
    Lock(#[from] LockFileError),

    /// Paths were removed while `on_remove = "error"`
    #[error("{0}")]
    LockMismatch(String),

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
