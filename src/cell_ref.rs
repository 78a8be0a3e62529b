//! Utilities for parsing A1-style cell references and ranges.

use std::str::FromStr;

use crate::error::XlpagerError;
use crate::types::MergeRange;

/// Parse a cell reference from raw bytes like `b"B3"` or `b"$B$3"` into 0-indexed (row, col).
///
/// Works directly on attribute values from quick-xml. Returns `None` when
/// the column letters or the row number are missing, the row is 0, or the
/// reference overflows.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in ref_bytes {
        match b {
            b'$' => {}
            b'A'..=b'Z' | b'a'..=b'z' if !saw_row => {
                let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
                col = col.checked_mul(26)?.checked_add(digit)?;
                saw_col = true;
            }
            b'0'..=b'9' if saw_col => {
                row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
                saw_row = true;
            }
            _ => return None,
        }
    }

    if !saw_col || !saw_row || row == 0 {
        return None;
    }
    Some((row - 1, col - 1))
}

/// Parse a cell reference like "B3" into 0-indexed (row, col).
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Parse "A1:B10" (or a single cell "A1") into an inclusive range.
pub fn parse_cell_range(range: &str) -> Option<MergeRange> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (start_row, start_col) = parse_cell_ref(start)?;
    let (end_row, end_col) = parse_cell_ref(end)?;
    Some(MergeRange::new(start_row, start_col, end_row, end_col))
}

/// Convert a 0-indexed column number to letters (0 -> A, 26 -> AA).
pub fn col_to_letter(col: u32) -> String {
    let mut n = u64::from(col) + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

impl FromStr for MergeRange {
    type Err = XlpagerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_cell_range(s).ok_or_else(|| XlpagerError::CellRef(s.to_string()))
    }
}

impl std::fmt::Display for MergeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            col_to_letter(self.start_col),
            u64::from(self.start_row) + 1,
            col_to_letter(self.end_col),
            u64::from(self.end_row) + 1
        )
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("A1", Some((0, 0)))]
    #[test_case("B3", Some((2, 1)))]
    #[test_case("$AA$10", Some((9, 26)))]
    #[test_case("xfd1048576", Some((1_048_575, 16_383)))]
    #[test_case("A0", None ; "row zero")]
    #[test_case("12", None ; "no column")]
    #[test_case("AB", None ; "no row")]
    #[test_case("1A", None ; "digits first")]
    #[test_case("ZZZZZZZZ1", None ; "column overflow")]
    fn test_parse_cell_ref(input: &str, expected: Option<(u32, u32)>) {
        assert_eq!(parse_cell_ref(input), expected);
    }

    #[test]
    fn test_parse_range() {
        assert_eq!(
            parse_cell_range("B3:C4"),
            Some(MergeRange::new(2, 1, 3, 2))
        );
        assert_eq!(parse_cell_range("D5"), Some(MergeRange::new(4, 3, 4, 3)));
        assert_eq!(parse_cell_range("B3:"), None);
    }

    #[test]
    fn test_merge_range_from_str_and_display() {
        let range: MergeRange = "C3:D4".parse().unwrap();
        assert_eq!(range, MergeRange::new(2, 2, 3, 3));
        assert_eq!(range.to_string(), "C3:D4");

        let err = "nope".parse::<MergeRange>().unwrap_err();
        assert!(matches!(err, XlpagerError::CellRef(ref s) if s == "nope"));
    }

    #[test]
    fn test_col_to_letter() {
        assert_eq!(col_to_letter(0), "A");
        assert_eq!(col_to_letter(25), "Z");
        assert_eq!(col_to_letter(26), "AA");
        assert_eq!(col_to_letter(701), "ZZ");
        assert_eq!(col_to_letter(702), "AAA");
    }
}
