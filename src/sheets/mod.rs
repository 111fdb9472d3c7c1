//! The remote spreadsheet service seam.
//!
//! [`SheetsService`] is the small set of remote calls the uploader needs. The `http` feature
//! provides [`HttpSheetsService`], a blocking client for the Sheets v4 REST API; tests and
//! callers with their own transport can implement the trait directly.

#[cfg(feature = "http")]
mod http;

use serde::{Deserialize, Serialize};

use crate::error::{UploadError, UploadResult};

#[cfg(feature = "http")]
pub use http::{AccessTokenSource, HttpSheetsService, DEFAULT_BASE_URL};

/// Rows in transport form (see [`crate::types::CellValue::to_wire`]).
pub type WireRows = [Vec<serde_json::Value>];

/// Spreadsheet metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpreadsheetInfo {
    /// Spreadsheet ID.
    pub spreadsheet_id: String,
    /// Spreadsheet title.
    pub title: String,
    /// Locale.
    pub locale: String,
    /// Sheets in display order.
    pub sheets: Vec<SheetInfo>,
}

impl SpreadsheetInfo {
    /// Find a sheet by exact title.
    pub fn sheet(&self, title: &str) -> Option<&SheetInfo> {
        self.sheets.iter().find(|s| s.title == title)
    }

    /// Numeric id of the sheet titled `title`, or [`UploadError::SheetNotFound`].
    pub fn sheet_id(&self, title: &str) -> UploadResult<i64> {
        self.sheet(title)
            .map(|s| s.sheet_id)
            .ok_or_else(|| UploadError::SheetNotFound {
                sheet: title.to_owned(),
            })
    }
}

/// Metadata of one sheet (tab).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SheetInfo {
    /// Sheet ID.
    pub sheet_id: i64,
    /// Sheet title.
    pub title: String,
    /// Number of rows.
    pub row_count: u64,
    /// Number of columns.
    pub column_count: u64,
}

/// Remote calls used by the uploader.
///
/// Range arguments are complete A1 ranges including the sheet name (`'My Sheet'!A1:C10`).
/// Implementations report quota errors as [`UploadError::RateLimited`] and other remote
/// failures as [`UploadError::Service`] so the retry layer can classify them.
pub trait SheetsService: Send + Sync {
    /// Spreadsheet metadata: title, locale, and sheet list.
    fn spreadsheet(&self, spreadsheet_id: &str) -> UploadResult<SpreadsheetInfo>;

    /// Remove every cell value of the sheet with id `sheet_id`, from the first row and column on.
    fn clear_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> UploadResult<()>;

    /// Overwrite the rectangular `range` with `rows`.
    fn update_values(&self, spreadsheet_id: &str, range: &str, rows: &WireRows) -> UploadResult<()>;

    /// Insert `rows` after the existing content of the table found at `range`.
    fn append_values(&self, spreadsheet_id: &str, range: &str, rows: &WireRows) -> UploadResult<()>;

    /// Formatted values of `range`.
    fn get_values(&self, spreadsheet_id: &str, range: &str) -> UploadResult<Vec<Vec<String>>>;
}
