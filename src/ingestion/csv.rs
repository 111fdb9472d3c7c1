//! CSV ingestion implementation.

use std::fs;
use std::path::Path;

use crate::error::{SourceFormat, UploadError, UploadResult};
use crate::types::{CellValue, Grid};

/// Parse a CSV file into a [`Grid`].
///
/// Rules:
///
/// - No header handling: the first line is just the first row.
/// - Rows may differ in width; padding happens at upload time.
/// - Each field is coerced with [`coerce_field`].
pub fn parse_csv_from_path(path: impl AsRef<Path>) -> UploadResult<Grid> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(UploadError::parse(
            SourceFormat::Csv,
            format!("file not found: \"{}\"", path.display()),
        ));
    }

    let text = fs::read_to_string(path).map_err(|e| {
        UploadError::parse_with_source(
            SourceFormat::Csv,
            format!("could not read file \"{}\"", path.display()),
            e,
        )
    })?;
    Ok(parse_csv_from_str(&text))
}

/// Parse CSV text into a [`Grid`].
///
/// A quote toggles quoted mode; inside quotes a doubled quote is one literal quote. Commas end
/// fields and `\n` / `\r\n` end rows only outside quotes. The last row is kept even without a
/// trailing newline, but a trailing newline does not produce an extra empty row.
pub fn parse_csv_from_str(input: &str) -> Grid {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);

    let mut rows: Grid = Vec::new();
    let mut row: Vec<CellValue> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' => in_quotes = true,
            ',' => row.push(coerce_field(&std::mem::take(&mut field))),
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                row.push(coerce_field(&std::mem::take(&mut field)));
                rows.push(std::mem::take(&mut row));
            }
            '\n' => {
                row.push(coerce_field(&std::mem::take(&mut field)));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(coerce_field(&field));
        rows.push(row);
    }

    rows
}

/// Coerce one raw CSV field into a typed cell.
///
/// - empty / whitespace-only → [`CellValue::Null`]
/// - `true` / `false` (any case) → [`CellValue::Bool`]
/// - finite numbers → [`CellValue::Number`]
/// - anything else stays text, untrimmed
pub fn coerce_field(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Null;
    }

    if trimmed.eq_ignore_ascii_case("true") {
        return CellValue::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return CellValue::Bool(false);
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => CellValue::Number(n),
        _ => CellValue::Text(raw.to_owned()),
    }
}
