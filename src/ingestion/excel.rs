#![cfg(feature = "excel")]

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{SourceFormat, UploadError, UploadResult};
use crate::types::{CellValue, Grid};

/// Parse the first worksheet of an Excel document (`.xlsx`, `.xls`) into a [`Grid`].
///
/// Behavior:
/// - Only the first sheet in workbook order is read
/// - Rows whose cells are all empty are skipped
/// - Trailing empty cells of a populated row are dropped
/// - Columns keep their sheet position: data starting at column C is preceded by two nulls
/// - Formula cells yield their cached result, error cells yield null
pub fn parse_excel_from_path(path: impl AsRef<Path>) -> UploadResult<Grid> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(UploadError::parse(
            SourceFormat::Excel,
            format!("file not found: \"{}\"", path.display()),
        ));
    }

    let mut workbook = open_workbook_auto(path).map_err(|e| {
        UploadError::parse_with_source(
            SourceFormat::Excel,
            format!("could not read file \"{}\"", path.display()),
            e,
        )
    })?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| UploadError::parse(SourceFormat::Excel, "workbook has no worksheets"))?;

    let range = workbook.worksheet_range(&first).map_err(|e| {
        UploadError::parse_with_source(
            SourceFormat::Excel,
            format!("could not read worksheet \"{first}\""),
            e,
        )
    })?;

    Ok(range_to_grid(&range))
}

fn range_to_grid(range: &calamine::Range<Data>) -> Grid {
    // `rows()` starts at the first used column, not column A.
    let leading_cols = range.start().map_or(0, |(_, col)| col as usize);

    let mut rows: Grid = Vec::new();
    for row in range.rows() {
        let Some(last) = row.iter().rposition(|c| !matches!(c, Data::Empty)) else {
            continue;
        };

        let mut out: Vec<CellValue> = Vec::with_capacity(leading_cols + last + 1);
        out.resize(leading_cols, CellValue::Null);
        out.extend(row[..=last].iter().map(convert_cell));
        rows.push(out);
    }
    rows
}

fn convert_cell(c: &Data) -> CellValue {
    match c {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            if dt.is_duration() {
                return CellValue::Text(dt.to_string());
            }
            match dt.as_datetime() {
                Some(naive) => CellValue::Instant(naive.and_utc()),
                None => CellValue::Number(dt.as_f64()),
            }
        }
        Data::DateTimeIso(s) => parse_iso_instant(s).map_or_else(|| CellValue::Text(s.clone()), CellValue::Instant),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        })
}
