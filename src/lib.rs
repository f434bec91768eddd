//! # Preorder tree labels (preorder-label)
//!
//! Byte-string labels for the nodes of an ordered tree. Comparing labels
//! byte-wise yields document (preorder) order, a label is a prefix of all of
//! its descendants, and new children or siblings can be inserted anywhere
//! without renaming a single existing label.
//!
//! ## Encoding
//!
//! A label is one level segment per tree depth. Each segment ends in an even
//! terminator byte, optionally preceded by odd continuation bytes that add
//! precision when two siblings leave no room between them:
//!
//! ```text
//! ┌──────────┬──────────────┬──────────┐
//! │ Level 1  │ Level 2      │ Level 3  │
//! │ 80       │ 7F 7F 80     │ C0       │
//! └──────────┴──────────────┴──────────┘
//!   even       odd odd even   even
//! ```
//!
//! NUL is never part of a label; it is only accepted as trailing padding from
//! fixed-width storage and stripped on the way in.
//!
//! ## Subtree Range Scans
//!
//! Every subtree is one contiguous key range, so a sorted store answers
//! "everything under X" with a single scan:
//!
//! ```
//! use preorder_label::{descendant_bound, sibling, PreorderLabel};
//!
//! let chapter = PreorderLabel::root().create_child();
//! let section = chapter.create_child();
//! let limit = descendant_bound(chapter.as_bytes()).unwrap();
//!
//! assert!(chapter.as_bytes() < section.as_bytes());
//! assert!(section.as_bytes() < limit.as_slice());
//!
//! let next_chapter = sibling(chapter.as_bytes(), b"").unwrap();
//! assert!(limit <= next_chapter);
//! ```
//!
//! ## Literals
//!
//! Hand-written labels are checked at compile time:
//!
//! ```
//! use preorder_label::label;
//!
//! let intro = label!("8040");
//! assert_eq!(intro.as_bytes(), b"\x80\x40");
//! assert!(label!(b"\x80").is_parent_of(&intro));
//! ```
//!
//! ```compile_fail
//! // Ends in a continuation byte.
//! let broken = preorder_label::label!("81");
//! ```

// Lets `label!` expansions resolve inside this crate too.
extern crate self as preorder_label;

pub mod allocate;
pub mod column;
pub mod error;
pub mod label;
pub mod level;
mod serde_impl;
pub mod validate;

pub use allocate::{child, children, descendant_bound, sibling, siblings};
pub use column::{decode_column, encode_column, from_padded, to_padded};
pub use error::{LabelError, Result};
pub use label::{Bound, PreorderLabel};
pub use level::{ancestors, depth, level, offset, split, up};
pub use preorder_label_macro::label;
pub use validate::{is_canonical, sanitize};

/// Raw label bytes, as produced by the allocator.
///
/// Use [`PreorderLabel`] for a validated handle with relational predicates.
pub type Label = Vec<u8>;
