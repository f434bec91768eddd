//! Rust code generation from a lock file.
//!
//! Output is a module tree mirroring the outline. Every node module carries
//! its label and metadata as constants:
//!
//! ```ignore
//! pub mod Labels {
//!     pub mod Docs {
//!         pub const LABEL: &[u8] = b"\x40";
//!         pub const PATH: &str = "Docs";
//!         pub const DEPTH: usize = 1;
//!
//!         pub mod Intro {
//!             pub const LABEL: &[u8] = b"\x40\x80";
//!             pub const PATH: &str = "Docs.Intro";
//!             pub const DEPTH: usize = 2;
//!         }
//!     }
//!
//!     pub const ALL: &[(&str, &[u8])] = &[("Docs", b"\x40"), ("Docs.Intro", b"\x40\x80")];
//! }
//! ```

use std::fmt::Write;

use crate::lock::{LockEntry, LockFile};
use crate::toml_parser::OutlineConfig;

/// Render the generated module for `lock`.
///
/// Modules appear in label order, which is outline order for every path
/// placed by the lock file.
pub fn generate_label_code(config: &OutlineConfig, lock: &LockFile) -> String {
    let entries = lock.sorted_entries();

    let mut out = String::new();
    out.push_str("// @generated by preorder-label-build from the outline config.\n");
    out.push_str("// Do not edit; change the config and rebuild instead.\n\n");
    out.push_str("#[allow(non_snake_case, dead_code)]\n");
    let _ = writeln!(out, "pub mod {} {{", config.module_name);

    // Preorder walk: a label's depth tells how many modules stay open.
    let mut open = 0usize;
    for entry in &entries {
        let depth = entry.label.depth();
        while open >= depth {
            open -= 1;
            close_module(&mut out, open + 1);
        }
        open_module(&mut out, entry, depth);
        open = depth;
    }
    while open > 0 {
        open -= 1;
        close_module(&mut out, open + 1);
    }

    out.push('\n');
    out.push_str("    /// Active paths and labels in document order.\n");
    out.push_str("    pub const ALL: &[(&str, &[u8])] = &[\n");
    for entry in entries.iter().filter(|e| !e.deprecated) {
        let _ = writeln!(
            out,
            "        ({:?}, {}),",
            entry.path,
            byte_literal(entry.label.as_bytes())
        );
    }
    out.push_str("    ];\n");
    out.push_str("}\n");
    out
}

fn open_module(out: &mut String, entry: &LockEntry, depth: usize) {
    let indent = "    ".repeat(depth);
    let name = entry.path.rsplit('.').next().unwrap_or(&entry.path);
    let note = entry.deprecated.then(|| {
        format!(
            "#[deprecated(note = \"'{}' was removed from the outline; its label stays reserved.\")]",
            entry.path
        )
    });

    out.push('\n');
    if let Some(note) = &note {
        let _ = writeln!(out, "{}{}", indent, note);
    }
    let _ = writeln!(out, "{}pub mod {} {{", indent, name);
    if let Some(note) = &note {
        let _ = writeln!(out, "{}    {}", indent, note);
    }
    let _ = writeln!(
        out,
        "{}    pub const LABEL: &[u8] = {};",
        indent,
        byte_literal(entry.label.as_bytes())
    );
    let _ = writeln!(out, "{}    pub const PATH: &str = {:?};", indent, entry.path);
    let _ = writeln!(out, "{}    pub const DEPTH: usize = {};", indent, depth);
}

fn close_module(out: &mut String, depth: usize) {
    let _ = writeln!(out, "{}}}", "    ".repeat(depth));
}

fn byte_literal(bytes: &[u8]) -> String {
    let mut lit = String::with_capacity(3 + bytes.len() * 4);
    lit.push_str("b\"");
    for b in bytes {
        let _ = write!(lit, "\\x{:02x}", b);
    }
    lit.push('"');
    lit
}
