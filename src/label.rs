//! `PreorderLabel`: an owned, validated label with relational predicates.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use crate::allocate;
use crate::error::{LabelError, Result};
use crate::level;
use crate::validate::{is_canonical, sanitize};

/// Position to allocate a sibling against.
///
/// `First` and `Last` are virtual siblings ordered before and after every
/// child of the shared parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound<'a> {
    /// Virtual sibling before every existing sibling.
    First,
    /// Virtual sibling after every existing sibling.
    Last,
    /// An existing sibling.
    Label(&'a PreorderLabel),
}

impl<'a> From<&'a PreorderLabel> for Bound<'a> {
    fn from(label: &'a PreorderLabel) -> Self {
        Bound::Label(label)
    }
}

/// A canonical preorder label.
///
/// Ordering is byte-wise lexicographic, which is preorder (document) order of
/// the labelled tree. The default value is the root label.
///
/// ```
/// use preorder_label::{Bound, PreorderLabel};
///
/// let root = PreorderLabel::root();
/// let chapter = root.create_child();
/// let appendix = chapter.create_sibling(Bound::Last).unwrap();
/// let preface = chapter.create_sibling(Bound::First).unwrap();
///
/// assert!(preface < chapter && chapter < appendix);
/// assert!(root.is_parent_of(&chapter));
/// assert!(preface.is_preceding_sibling_of(&appendix));
/// ```
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreorderLabel {
    bytes: Vec<u8>,
}

impl PreorderLabel {
    /// The root label (zero length).
    pub const fn root() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Validate `raw` into a label, stripping trailing NUL padding.
    ///
    /// # Errors
    ///
    /// [`LabelError::InvalidLabel`] if `raw` contains an embedded NUL or ends
    /// in a continuation byte.
    pub fn new(raw: impl AsRef<[u8]>) -> Result<Self> {
        let raw = raw.as_ref();
        sanitize(raw)
            .map(|bytes| Self::from_canonical(bytes.to_vec()))
            .ok_or_else(|| LabelError::invalid_label(raw))
    }

    /// Parse a hex rendering (as produced by `Display`).
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| LabelError::InvalidLabel {
            label: s.to_string(),
        })?;
        Self::new(bytes)
    }

    /// Wrap bytes produced by a compile-time validated `label!` literal.
    #[doc(hidden)]
    pub fn from_static_unchecked(bytes: &'static [u8]) -> Self {
        Self::from_canonical(bytes.to_vec())
    }

    pub(crate) fn from_canonical(bytes: Vec<u8>) -> Self {
        debug_assert!(is_canonical(&bytes), "label must be canonical");
        Self { bytes }
    }

    fn from_all(labels: Vec<Vec<u8>>) -> Vec<Self> {
        labels.into_iter().map(Self::from_canonical).collect()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Length of the encoded label in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// `true` for the root label.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` if `other` lies strictly inside this label's subtree.
    pub fn is_ancestor_of(&self, other: &Self) -> bool {
        other.bytes.len() > self.bytes.len() && other.bytes.starts_with(&self.bytes)
    }

    #[inline]
    pub fn is_descendant_of(&self, other: &Self) -> bool {
        other.is_ancestor_of(self)
    }

    pub fn is_parent_of(&self, other: &Self) -> bool {
        level::up(&other.bytes) == Some(self.bytes.as_slice())
    }

    #[inline]
    pub fn is_child_of(&self, other: &Self) -> bool {
        other.is_parent_of(self)
    }

    /// `true` if this label comes before `other` in document order.
    #[inline]
    pub fn is_preceding(&self, other: &Self) -> bool {
        self < other
    }

    /// `true` if this label comes after `other` in document order.
    #[inline]
    pub fn is_following(&self, other: &Self) -> bool {
        self > other
    }

    /// `true` if the labels are distinct and share their parent.
    pub fn is_sibling_of(&self, other: &Self) -> bool {
        self != other && level::up(&self.bytes) == level::up(&other.bytes)
    }

    pub fn is_preceding_sibling_of(&self, other: &Self) -> bool {
        self.is_preceding(other) && self.is_sibling_of(other)
    }

    pub fn is_following_sibling_of(&self, other: &Self) -> bool {
        self.is_following(other) && self.is_sibling_of(other)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Number of levels below the root.
    #[inline]
    pub fn depth(&self) -> usize {
        level::depth(&self.bytes)
    }

    /// # Errors
    ///
    /// [`LabelError::NoParent`] for the root label.
    pub fn parent(&self) -> Result<Self> {
        level::up(&self.bytes)
            .map(|parent| Self::from_canonical(parent.to_vec()))
            .ok_or(LabelError::NoParent)
    }

    /// Proper ancestors from the top level down to the parent, root excluded.
    ///
    /// # Errors
    ///
    /// [`LabelError::NoParent`] for the root label.
    pub fn ancestors(&self) -> Result<Vec<Self>> {
        Ok(level::ancestors(&self.bytes)?
            .into_iter()
            .map(|a| Self::from_canonical(a.to_vec()))
            .collect())
    }

    /// Exclusive upper bound of this label's subtree.
    ///
    /// The bound ends in a continuation byte, so it is a raw key rather than
    /// a label. `[self, descendant_limit)` is the subtree key range.
    ///
    /// # Errors
    ///
    /// [`LabelError::NoDescendantBound`] for the root label.
    pub fn descendant_limit(&self) -> Result<Vec<u8>> {
        allocate::descendant_bound(&self.bytes)
    }

    /// Copy into a NUL-padded fixed-width row.
    pub fn to_padded<const N: usize>(&self) -> Result<[u8; N]> {
        crate::column::to_padded(&self.bytes)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// First child of this label.
    ///
    /// Only ordered correctly while this label has no children; use
    /// [`create_sibling`](Self::create_sibling) on an existing child to add
    /// more.
    pub fn create_child(&self) -> Self {
        Self::from_canonical(allocate::first_child(&self.bytes))
    }

    /// `n` ordered children of a childless label.
    pub fn create_children(&self, n: usize) -> Result<Vec<Self>> {
        allocate::children(&self.bytes, n).map(Self::from_all)
    }

    /// A sibling between this label and `other`.
    ///
    /// `other` may sort before or after `self`; the result lies strictly
    /// between the two either way.
    ///
    /// # Errors
    ///
    /// - [`LabelError::NoParent`] if this is the root label.
    /// - [`LabelError::InvalidArgument`] if `other` is not a sibling.
    pub fn create_sibling<'a>(&self, other: impl Into<Bound<'a>>) -> Result<Self> {
        let (lower, upper) = self.sibling_bounds(other.into())?;
        allocate::sibling(lower, upper).map(Self::from_canonical)
    }

    /// `n` ordered siblings between this label and `other`.
    pub fn create_siblings<'a>(&self, other: impl Into<Bound<'a>>, n: usize) -> Result<Vec<Self>> {
        let (lower, upper) = self.sibling_bounds(other.into())?;
        allocate::siblings(lower, upper, n).map(Self::from_all)
    }

    fn sibling_bounds<'s>(&'s self, other: Bound<'s>) -> Result<(&'s [u8], &'s [u8])> {
        if self.is_root() {
            return Err(LabelError::NoParent);
        }
        match other {
            Bound::First => Ok((&[][..], self.bytes.as_slice())),
            Bound::Last => Ok((self.bytes.as_slice(), &[][..])),
            Bound::Label(other) if !self.is_sibling_of(other) => Err(LabelError::invalid_argument(
                format!("{} is not a sibling of {}", other, self),
            )),
            Bound::Label(other) if self < other => Ok((self.bytes.as_slice(), other.bytes.as_slice())),
            Bound::Label(other) => Ok((other.bytes.as_slice(), self.bytes.as_slice())),
        }
    }
}

impl fmt::Display for PreorderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.to_hex())
    }
}

impl fmt::Debug for PreorderLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PreorderLabel({})", self.to_hex())
    }
}

impl FromStr for PreorderLabel {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for PreorderLabel {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Lets ordered maps keyed by labels be range-scanned with raw byte bounds
/// such as [`PreorderLabel::descendant_limit`].
impl Borrow<[u8]> for PreorderLabel {
    fn borrow(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<PreorderLabel> for Vec<u8> {
    fn from(label: PreorderLabel) -> Self {
        label.bytes
    }
}

impl TryFrom<&[u8]> for PreorderLabel {
    type Error = LabelError;

    fn try_from(raw: &[u8]) -> Result<Self> {
        Self::new(raw)
    }
}

impl TryFrom<Vec<u8>> for PreorderLabel {
    type Error = LabelError;

    fn try_from(raw: Vec<u8>) -> Result<Self> {
        if is_canonical(&raw) {
            Ok(Self::from_canonical(raw))
        } else {
            Self::new(raw)
        }
    }
}
