//! Fixed-width column storage.
//!
//! Databases often keep binary keys in fixed-width columns padded with NUL
//! bytes. A column here is a flat buffer of `N`-byte rows:
//!
//! ```text
//! ┌────────────────┬────────────────┬────────────────┐
//! │ 80 00 00 00    │ 80 40 00 00    │ 7F 7F 80 C0    │   N = 4
//! └────────────────┴────────────────┴────────────────┘
//! ```
//!
//! Decoding views the buffer as `[[u8; N]]` in place and sanitizes each row,
//! so the padding never leaks into a label.

use zerocopy::{FromBytes, IntoBytes};

use crate::error::{LabelError, Result};
use crate::label::PreorderLabel;
use crate::validate::PAD;

/// Copy `label` into a NUL-padded row of `N` bytes.
///
/// # Errors
///
/// [`LabelError::TooWide`] if the label is longer than `N`.
pub fn to_padded<const N: usize>(label: &[u8]) -> Result<[u8; N]> {
    if label.len() > N {
        return Err(LabelError::TooWide {
            len: label.len(),
            width: N,
        });
    }
    let mut row = [PAD; N];
    row[..label.len()].copy_from_slice(label);
    Ok(row)
}

/// Read a label back from a NUL-padded row.
///
/// # Errors
///
/// [`LabelError::InvalidLabel`] if the row holds anything but a canonical
/// label followed by padding.
pub fn from_padded(row: &[u8]) -> Result<PreorderLabel> {
    PreorderLabel::new(row)
}

/// Pack labels into a column buffer of `N`-byte rows, in the given order.
pub fn encode_column<const N: usize>(labels: &[PreorderLabel]) -> Result<Vec<u8>> {
    let rows = labels
        .iter()
        .map(|label| to_padded::<N>(label.as_bytes()))
        .collect::<Result<Vec<_>>>()?;
    Ok(rows.as_slice().as_bytes().to_vec())
}

/// Unpack a column buffer of `N`-byte rows.
///
/// # Errors
///
/// - [`LabelError::InvalidArgument`] if the buffer is not a whole number of
///   rows.
/// - [`LabelError::InvalidLabel`] if a row does not hold a canonical label.
pub fn decode_column<const N: usize>(bytes: &[u8]) -> Result<Vec<PreorderLabel>> {
    let rows = <[[u8; N]]>::ref_from_bytes(bytes).map_err(|_| {
        LabelError::invalid_argument(format!(
            "column of {} bytes is not a whole number of {}-byte rows",
            bytes.len(),
            N
        ))
    })?;
    rows.iter().map(PreorderLabel::new).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_labels() {
        assert_eq!(to_padded::<4>(b"\x80\x40").unwrap(), [0x80, 0x40, 0, 0]);
        assert_eq!(to_padded::<2>(b"\x80\x40").unwrap(), [0x80, 0x40]);
        assert_eq!(to_padded::<3>(b"").unwrap(), [0, 0, 0]);
    }

    #[test]
    fn strips_padding_from_rows() {
        let label = from_padded(&[0x7F, 0x80, 0x00, 0x00]).unwrap();
        assert_eq!(label.as_bytes(), b"\x7F\x80");
        assert!(from_padded(&[0, 0, 0]).unwrap().is_root());
        assert!(from_padded(&[0x80, 0x00, 0x40]).is_err());
    }

    #[test]
    fn rejects_labels_wider_than_column() {
        assert_eq!(
            to_padded::<1>(b"\x80\x40"),
            Err(LabelError::TooWide { len: 2, width: 1 })
        );
    }

    #[test]
    fn column_round_trip_keeps_order() {
        let labels = PreorderLabel::root().create_children(6).unwrap();
        let column = encode_column::<4>(&labels).unwrap();
        assert_eq!(column.len(), 24);
        assert_eq!(decode_column::<4>(&column).unwrap(), labels);
    }

    #[test]
    fn rejects_ragged_buffers() {
        assert!(matches!(
            decode_column::<4>(&[0x80, 0, 0]),
            Err(LabelError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_corrupt_rows() {
        assert!(matches!(
            decode_column::<2>(&[0x80, 0x00, 0x00, 0x80]),
            Err(LabelError::InvalidLabel { .. })
        ));
    }
}
