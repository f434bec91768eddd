//! Label allocator: new child and sibling labels that never disturb existing
//! ones.
//!
//! Every allocation is a pure function of its bounds. A new sibling is found by
//! walking the last level segment of the bounds byte by byte until a gap wider
//! than one opens up; its midpoint becomes the new terminator. Where no such
//! gap exists the segment grows by a continuation byte, so a gap can always be
//! found:
//!
//! ```text
//! sibling(7C, 7E)   = 7D 80      (7D is odd, so it needs a terminator)
//! sibling(7C, 7D80) = 7D 40
//! sibling("", 02)   = 01 80      (below the smallest terminator)
//! sibling(FE, "")   = FF 80      (above the largest terminator)
//! ```
//!
//! An empty bound stands for the open end of the level of the other bound.

use tracing::{debug, trace};

use crate::error::{LabelError, Result};
use crate::level::{level, CONTINUATION_BIT, FIRST_CHILD, MAX_CONTINUATION, MIN_CONTINUATION};
use crate::validate::is_canonical;
use crate::Label;

/// Exclusive upper bound of the subtree rooted at `label`.
///
/// For every descendant `d` and every following sibling `s` of `label`:
/// `label < d < descendant_bound(label) <= s`. The half-open range
/// `[label, descendant_bound(label))` covers exactly the subtree.
///
/// # Errors
///
/// [`LabelError::NoDescendantBound`] for the root label.
pub fn descendant_bound(label: &[u8]) -> Result<Label> {
    ensure_canonical(label)?;
    let mut bound = label.to_vec();
    let last = bound.last_mut().ok_or(LabelError::NoDescendantBound)?;
    *last |= CONTINUATION_BIT;
    Ok(bound)
}

/// First child of `parent`.
///
/// Only ordered correctly while `parent` has no children; allocate further
/// children with [`sibling`] against an existing child.
pub fn child(parent: &[u8]) -> Result<Label> {
    ensure_canonical(parent)?;
    Ok(first_child(parent))
}

/// [`child`] for a parent already known to be canonical.
pub(crate) fn first_child(parent: &[u8]) -> Label {
    extend(parent, &[FIRST_CHILD])
}

/// `n` ordered first-generation children of a childless `parent`.
pub fn children(parent: &[u8], n: usize) -> Result<Vec<Label>> {
    ensure_count(n)?;
    let first = child(parent)?;
    subdivide(&[], &[], first, n, parent.len())
}

/// A label strictly between the siblings `lower` and `upper`.
///
/// Either bound may be empty (but not both): an empty `lower` means "before
/// every sibling of `upper`", an empty `upper` means "after every sibling of
/// `lower`".
///
/// # Errors
///
/// - [`LabelError::InvalidLabel`] if a bound is not canonical.
/// - [`LabelError::InvalidArgument`] if both bounds are empty, the bounds do
///   not share a parent, or `lower >= upper`.
pub fn sibling(lower: &[u8], upper: &[u8]) -> Result<Label> {
    let start = sibling_offset(lower, upper)?;
    midpoint(lower, upper, start)
}

/// `n` ordered labels strictly between the siblings `lower` and `upper`.
///
/// The batch is a balanced bisection of the gap: the first label is the
/// midpoint of the bounds, then every round fills the gaps left by the
/// previous one (1, 2, 4, 8, … labels per round). Label length grows with
/// `log2(n)` rather than `n`.
pub fn siblings(lower: &[u8], upper: &[u8], n: usize) -> Result<Vec<Label>> {
    ensure_count(n)?;
    let start = sibling_offset(lower, upper)?;
    let first = midpoint(lower, upper, start)?;
    subdivide(lower, upper, first, n, start)
}

fn ensure_canonical(label: &[u8]) -> Result<()> {
    if is_canonical(label) {
        Ok(())
    } else {
        Err(LabelError::invalid_label(label))
    }
}

fn ensure_count(n: usize) -> Result<()> {
    if n == 0 {
        return Err(LabelError::invalid_argument("label count must be at least 1"));
    }
    Ok(())
}

/// Validate a sibling pair and return the offset of their last level.
fn sibling_offset(lower: &[u8], upper: &[u8]) -> Result<usize> {
    ensure_canonical(lower)?;
    ensure_canonical(upper)?;

    match (level(lower), level(upper)) {
        (None, None) => Err(LabelError::invalid_argument(
            "at least one sibling bound must be a non-root label",
        )),
        (Some((parent, _)), None) | (None, Some((parent, _))) => Ok(parent.len()),
        (Some((lower_parent, _)), Some((upper_parent, _))) => {
            if lower_parent != upper_parent {
                return Err(LabelError::invalid_argument(format!(
                    "{} and {} are not siblings",
                    hex::encode(lower),
                    hex::encode(upper)
                )));
            }
            if lower >= upper {
                return Err(LabelError::invalid_argument(format!(
                    "{} does not precede {}",
                    hex::encode(lower),
                    hex::encode(upper)
                )));
            }
            Ok(lower_parent.len())
        }
    }
}

/// Label strictly between two validated bounds sharing their first `start`
/// bytes.
fn midpoint(lower: &[u8], upper: &[u8], start: usize) -> Result<Vec<u8>> {
    let mut i = start;
    loop {
        match (lower.get(i), upper.get(i)) {
            (None, _) => return below(upper, i),
            (Some(_), None) => return above(lower, i),
            (Some(&lo), Some(&hi)) => {
                let gap = u16::from(hi).saturating_sub(u16::from(lo));
                if gap > 1 {
                    let half = gap.div_ceil(2);
                    let x = lo + half as u8;
                    if x & CONTINUATION_BIT != 0 && half < 2 {
                        trace!(offset = i, "no terminator fits between bounds, adding a level of precision");
                        return Ok(extend(&lower[..i], &[x, FIRST_CHILD]));
                    }
                    return Ok(extend(&lower[..i], &[x & !CONTINUATION_BIT]));
                }
            }
        }
        i += 1;
    }
}

/// Label below `upper[i..]` with nothing underneath it.
fn below(upper: &[u8], i: usize) -> Result<Vec<u8>> {
    let i = i + upper[i.min(upper.len())..]
        .iter()
        .take_while(|&&b| b == MIN_CONTINUATION)
        .count();
    let &hi = upper
        .get(i)
        .ok_or_else(|| LabelError::invalid_argument("upper bound leaves no room below it"))?;
    let half = hi.div_ceil(2);
    if half == 1 {
        trace!(offset = i, "below the smallest terminator, adding a level of precision");
        return Ok(extend(&upper[..i], &[MIN_CONTINUATION, FIRST_CHILD]));
    }
    Ok(extend(&upper[..i], &[half & !CONTINUATION_BIT]))
}

/// Label above `lower[i..]` with nothing over it.
fn above(lower: &[u8], i: usize) -> Result<Vec<u8>> {
    let i = i + lower[i.min(lower.len())..]
        .iter()
        .take_while(|&&b| b == MAX_CONTINUATION)
        .count();
    let &lo = lower
        .get(i)
        .ok_or_else(|| LabelError::invalid_argument("lower bound leaves no room above it"))?;
    let half = (u16::from(lo) + u16::from(MAX_CONTINUATION)).div_ceil(2) as u8;
    if half == MAX_CONTINUATION {
        trace!(offset = i, "above the largest terminator, adding a level of precision");
        return Ok(extend(&lower[..i], &[MAX_CONTINUATION, FIRST_CHILD]));
    }
    Ok(extend(&lower[..i], &[half & !CONTINUATION_BIT]))
}

/// Balanced batch: `first` plus `n - 1` bisections of the gaps around it.
///
/// Round `k` adds one label below the current minimum, one between every
/// adjacent pair already present and one above the current maximum, then
/// sorts. Before a full round the batch holds `width - 1` labels.
fn subdivide(
    lower: &[u8],
    upper: &[u8],
    first: Vec<u8>,
    n: usize,
    start: usize,
) -> Result<Vec<Vec<u8>>> {
    let mut out = Vec::with_capacity(n);
    out.push(first);
    let mut remaining = n - 1;
    let mut width = 2usize;

    while remaining > 0 {
        remaining -= 1;
        let front = midpoint(lower, &out[0], start)?;
        out.push(front);

        let mut m = remaining.min(width - 2);
        while m > 0 && remaining > 0 {
            m -= 1;
            remaining -= 1;
            let mid = midpoint(&out[m], &out[m + 1], start)?;
            out.push(mid);
        }

        if remaining > 0 {
            remaining -= 1;
            let back = midpoint(&out[width - 2], upper, start)?;
            out.push(back);
            width *= 2;
        }

        out.sort_unstable();
    }

    debug!(
        count = n,
        longest = out.iter().map(Vec::len).max().unwrap_or(0),
        "allocated label batch"
    );
    Ok(out)
}

fn extend(prefix: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut label = Vec::with_capacity(prefix.len() + tail.len());
    label.extend_from_slice(prefix);
    label.extend_from_slice(tail);
    label
}
