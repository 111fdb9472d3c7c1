//! Unified data resolution.
//!
//! Most callers should use [`resolve`], which turns any [`DataSource`] into one [`Grid`]:
//!
//! - [`DataSource::Grid`] passes through unchanged
//! - [`DataSource::Records`] goes through the structured-record parser
//! - [`DataSource::Path`] picks a parser from the file extension (`.csv`, `.xlsx`, `.xls`)
//!
//! If a [`Logger`] is provided, the outcome is reported to it.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{UploadError, UploadResult};
use crate::observability::Logger;
use crate::types::{CellValue, Grid};

use super::{csv, json};

/// Supported file formats for path sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Comma-separated values.
    Csv,
    /// Spreadsheet documents (feature-gated behind `excel`).
    Excel,
}

impl FileFormat {
    /// Parse a file format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" => Some(Self::Excel),
            _ => None,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Excel => f.write_str("excel"),
        }
    }
}

/// Any input accepted by an upload.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// A prebuilt grid, used as-is.
    Grid(Grid),
    /// A collection of structured records (expected to be JSON objects).
    Records(Vec<serde_json::Value>),
    /// A `.csv`, `.xlsx`, or `.xls` file.
    Path(PathBuf),
}

impl DataSource {
    /// Pick a variant from the shape of an untyped JSON value.
    ///
    /// - an empty array, or an array whose first element is an array → [`DataSource::Grid`]
    /// - an array whose first element is an object → [`DataSource::Records`]
    /// - a string → [`DataSource::Path`]
    /// - anything else is a validation error
    pub fn from_json(value: serde_json::Value) -> UploadResult<Self> {
        match value {
            serde_json::Value::Array(items) => {
                if items.first().is_none_or(serde_json::Value::is_array) {
                    Ok(Self::Grid(
                        items
                            .iter()
                            .map(|row| match row {
                                serde_json::Value::Array(cells) => {
                                    cells.iter().map(CellValue::from_json).collect()
                                }
                                other => vec![CellValue::from_json(other)],
                            })
                            .collect(),
                    ))
                } else if items.first().is_some_and(serde_json::Value::is_object) {
                    Ok(Self::Records(items))
                } else {
                    Err(UploadError::validation(
                        "invalid data type: array items must be rows (arrays) or records (objects)",
                    ))
                }
            }
            serde_json::Value::String(s) => Ok(Self::Path(PathBuf::from(s))),
            _ => Err(UploadError::validation(
                "invalid data type: provide a file path, an array of records, or a 2D array",
            )),
        }
    }

    /// Short description used in log lines.
    pub fn describe(&self) -> String {
        match self {
            Self::Grid(rows) => format!("grid ({} rows)", rows.len()),
            Self::Records(items) => format!("records ({} items)", items.len()),
            Self::Path(p) => format!("file {}", p.display()),
        }
    }
}

impl From<Grid> for DataSource {
    fn from(grid: Grid) -> Self {
        Self::Grid(grid)
    }
}

impl From<Vec<serde_json::Value>> for DataSource {
    fn from(records: Vec<serde_json::Value>) -> Self {
        Self::Records(records)
    }
}

impl From<PathBuf> for DataSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for DataSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for DataSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

/// Resolve any [`DataSource`] into a [`Grid`].
///
/// `include_headers` only affects [`DataSource::Records`].
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use sheets_uploader::ingestion::{resolve, DataSource};
/// use sheets_uploader::types::CellValue;
///
/// # fn main() -> Result<(), sheets_uploader::UploadError> {
/// let source = DataSource::Records(vec![json!({"a": 1, "b": 2}), json!({"a": 3, "c": 4})]);
/// let grid = resolve(&source, true)?;
/// assert_eq!(grid[0], vec![CellValue::text("a"), CellValue::text("b"), CellValue::text("c")]);
/// assert_eq!(grid[2], vec![CellValue::Number(3.0), CellValue::Null, CellValue::Number(4.0)]);
/// # Ok(())
/// # }
/// ```
///
/// ```no_run
/// use sheets_uploader::ingestion::{resolve, DataSource};
///
/// # fn main() -> Result<(), sheets_uploader::UploadError> {
/// // Uses `.csv` to select the delimited-text parser.
/// let grid = resolve(&DataSource::from("people.csv"), true)?;
/// println!("rows={}", grid.len());
/// # Ok(())
/// # }
/// ```
pub fn resolve(source: &DataSource, include_headers: bool) -> UploadResult<Grid> {
    match source {
        DataSource::Grid(grid) => Ok(grid.clone()),
        DataSource::Records(records) => json::parse_records(records, include_headers),
        DataSource::Path(path) => match infer_format_from_path(path)? {
            FileFormat::Csv => csv::parse_csv_from_path(path),
            FileFormat::Excel => parse_excel_dispatch(path),
        },
    }
}

/// Like [`resolve`], reporting the outcome to `logger`.
pub fn resolve_logged(source: &DataSource, include_headers: bool, logger: &dyn Logger) -> UploadResult<Grid> {
    let result = resolve(source, include_headers);
    match &result {
        Ok(grid) => logger.debug(&format!("resolved {} into {} row(s)", source.describe(), grid.len())),
        Err(e) => logger.error(&format!("failed to resolve {}: {e}", source.describe())),
    }
    result
}

fn infer_format_from_path(path: &Path) -> UploadResult<FileFormat> {
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    FileFormat::from_extension(ext).ok_or_else(|| {
        UploadError::validation(format!(
            "unsupported file extension \".{ext}\" for path ({}). Supported formats: .xlsx, .xls, .csv",
            path.display()
        ))
    })
}

fn parse_excel_dispatch(path: &Path) -> UploadResult<Grid> {
    #[cfg(feature = "excel")]
    {
        super::excel::parse_excel_from_path(path)
    }

    #[cfg(not(feature = "excel"))]
    {
        Err(UploadError::validation(format!(
            "excel ingestion not enabled (enable cargo feature 'excel') for path ({})",
            path.display()
        )))
    }
}
