//! Label validation: turning arbitrary bytes into canonical labels.

use crate::level::is_terminator;

/// Padding byte used by fixed-width binary columns. Never part of a label.
pub const PAD: u8 = 0x00;

/// `true` if `label` is canonical: empty, or NUL-free and ending in a
/// terminator byte.
#[inline]
pub fn is_canonical(label: &[u8]) -> bool {
    match label.last() {
        None => true,
        Some(&last) => is_terminator(last) && !label.contains(&PAD),
    }
}

/// Strip trailing NUL padding and validate what is left.
///
/// An empty remainder is the root label. Returns `None` if the remainder
/// contains a NUL byte or ends in a continuation byte.
///
/// ```
/// use preorder_label::sanitize;
///
/// assert_eq!(sanitize(b"\x01\xFE\x00"), Some(&b"\x01\xFE"[..]));
/// assert_eq!(sanitize(b"\x00\x00"), Some(&b""[..]));
/// assert_eq!(sanitize(b"\x00\x01\xFE"), None);
/// ```
pub fn sanitize(raw: &[u8]) -> Option<&[u8]> {
    let end = raw.iter().rposition(|&b| b != PAD).map_or(0, |i| i + 1);
    let trimmed = &raw[..end];
    is_canonical(trimmed).then_some(trimmed)
}
