//! A1-notation range addressing.
//!
//! Rows and columns are 1-based everywhere in this module.

use std::fmt;

use crate::error::{UploadError, UploadResult};

/// A single cell position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    /// 1-based row number.
    pub row: u32,
    /// 1-based column number.
    pub col: u32,
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letter(self.col), self.row)
    }
}

/// Convert a 1-based column number to its letter(s): 1 → `A`, 26 → `Z`, 27 → `AA`, 703 → `AAA`.
///
/// This is bijective base-26: there is no zero digit, so each step decrements before taking
/// the remainder. Column 0 has no letters and yields an empty string.
pub fn column_to_letter(column: u32) -> String {
    let mut letters = Vec::new();
    let mut n = column;
    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % 26) as u8);
        n /= 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Sheet name as it must appear in a range: single-quoted when it contains a space.
pub fn quote_sheet_name(sheet: &str) -> String {
    if sheet.contains(' ') {
        format!("'{sheet}'")
    } else {
        sheet.to_owned()
    }
}

/// Build `Sheet!A1:E100`-style range text from inclusive 1-based bounds.
pub fn build_range(sheet: &str, start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> String {
    format!(
        "{}!{}{}:{}{}",
        quote_sheet_name(sheet),
        column_to_letter(start_col),
        start_row,
        column_to_letter(end_col),
        end_row
    )
}

/// Build `Sheet!B3`-style text addressing a single cell.
pub fn cell_range(sheet: &str, cell: CellAddress) -> String {
    format!("{}!{cell}", quote_sheet_name(sheet))
}

/// Parse a single A1 address (`B3`, `aa10`) into a [`CellAddress`].
///
/// Letters are case-insensitive. Fails when letters or digits are missing, when anything else
/// is present, or when the value does not fit.
pub fn parse_cell(cell: &str) -> UploadResult<CellAddress> {
    let invalid = || UploadError::validation(format!("invalid cell reference: \"{cell}\""));

    let split = cell.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(cell.len());
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    let mut col: u32 = 0;
    for b in letters.bytes() {
        let digit = u32::from(b.to_ascii_uppercase() - b'A' + 1);
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(digit))
            .ok_or_else(invalid)?;
    }
    let row: u32 = digits.parse().map_err(|_| invalid())?;

    Ok(CellAddress { row, col })
}
