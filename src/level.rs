//! Level codec: decomposition of a label into its per-depth segments.
//!
//! A label is a concatenation of level segments, one per tree depth below the
//! root. Every segment ends with an even *terminator* byte, preceded by zero or
//! more odd *continuation* bytes:
//!
//! ```text
//!   7F 7F 80 | 80        depth 2
//!   ──────── | ──
//!   level 1    level 2
//! ```
//!
//! Segment boundaries are exactly the terminator positions, so structural
//! queries are plain byte scans and never need a lookup table.

use crate::error::{LabelError, Result};
use crate::validate::is_canonical;

/// Bit that marks a continuation byte. Terminators have it cleared.
pub const CONTINUATION_BIT: u8 = 0x01;

/// Terminator of a first child: the even midpoint of `0..=254`.
pub const FIRST_CHILD: u8 = 0x80;

/// Smallest continuation byte.
pub const MIN_CONTINUATION: u8 = 0x01;

/// Largest continuation byte.
pub const MAX_CONTINUATION: u8 = 0xFF;

/// `true` if `byte` ends a level segment.
#[inline]
pub const fn is_terminator(byte: u8) -> bool {
    byte & CONTINUATION_BIT == 0
}

/// Byte index of the first byte of the last level segment.
///
/// Returns `None` for the root label.
pub fn offset(label: &[u8]) -> Option<usize> {
    debug_assert!(is_canonical(label), "offset requires a canonical label");
    let mut i = label.len().checked_sub(1)?;
    while i > 0 && !is_terminator(label[i - 1]) {
        i -= 1;
    }
    Some(i)
}

/// Split off the last level segment: `(parent, segment)`.
///
/// Returns `None` for the root label.
#[inline]
pub fn level(label: &[u8]) -> Option<(&[u8], &[u8])> {
    offset(label).map(|i| label.split_at(i))
}

/// Parent label, or `None` for the root label.
#[inline]
pub fn up(label: &[u8]) -> Option<&[u8]> {
    level(label).map(|(parent, _)| parent)
}

/// Proper ancestors ordered from the top level down to the parent.
///
/// The root label itself is never listed, so a depth-1 label has no
/// ancestors.
///
/// # Errors
///
/// [`LabelError::NoParent`] if `label` is the root label.
pub fn ancestors(label: &[u8]) -> Result<Vec<&[u8]>> {
    let parent = up(label).ok_or(LabelError::NoParent)?;
    Ok(terminator_ends(parent).map(|end| &parent[..end]).collect())
}

/// All level segments from the top level down to the leaf.
///
/// `split(a).concat() == a` and `split(a).len() == depth(a)`.
pub fn split(label: &[u8]) -> Vec<&[u8]> {
    debug_assert!(is_canonical(label), "split requires a canonical label");
    label.split_inclusive(|&b| is_terminator(b)).collect()
}

/// Number of level segments (the root label has depth 0).
#[inline]
pub fn depth(label: &[u8]) -> usize {
    label.iter().filter(|&&b| is_terminator(b)).count()
}

/// Exclusive end index of every segment in `label`.
fn terminator_ends(label: &[u8]) -> impl Iterator<Item = usize> + '_ {
    label
        .iter()
        .enumerate()
        .filter(|&(_, &b)| is_terminator(b))
        .map(|(i, _)| i + 1)
}
