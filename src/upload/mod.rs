//! Upload orchestration.
//!
//! [`upload_data`] drives one upload through its phases:
//!
//! 1. **parsing**: resolve the [`DataSource`] into a grid; an empty grid completes at once
//! 2. **clearing** (replace mode only): wipe the destination sheet
//! 3. **uploading**: write the grid in chunks of [`CHUNK_SIZE`] rows, one remote call each
//! 4. **complete**
//!
//! Every remote call goes through the [`RequestGuard`] (rate limit + retry). Chunks are written
//! strictly one after another; a failed chunk leaves earlier chunks in place.

mod progress;
mod sheet_ops;

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use crate::error::{UploadError, UploadResult};
use crate::execution::RequestGuard;
use crate::ingestion::{resolve_logged, DataSource};
use crate::observability::Logger;
use crate::range::{build_range, cell_range, parse_cell, CellAddress};
use crate::sheets::SheetsService;
use crate::types::{grid_to_wire, max_width, pad_rows};

pub use progress::{ProgressEvent, ProgressObserver, UploadPhase};
pub use sheet_ops::{batch_upload, clear_sheet, read_sheet, BatchOperation, ReadOptions};
pub(crate) use sheet_ops::validate_batch;

/// Rows per write call.
pub const CHUNK_SIZE: usize = 10_000;

/// How an upload treats existing sheet content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    /// Clear the sheet, then write from `A1`.
    #[default]
    Replace,
    /// Insert rows after the existing content.
    Append,
}

impl fmt::Display for UploadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Replace => "replace",
            Self::Append => "append",
        })
    }
}

impl std::str::FromStr for UploadMode {
    type Err = UploadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(Self::Replace),
            "append" => Ok(Self::Append),
            other => Err(UploadError::validation(format!(
                "invalid mode \"{other}\". Must be \"replace\" or \"append\""
            ))),
        }
    }
}

/// Options for one upload.
#[derive(Clone)]
pub struct UploadOptions {
    /// Destination sheet name.
    pub sheet: String,
    /// Data to upload.
    pub source: DataSource,
    /// Replace (default) or append.
    pub mode: UploadMode,
    /// Append-mode anchor in A1 notation (default `A1`). Replace mode always writes from `A1`.
    pub start_cell: String,
    /// Emit a header row for structured records (default `true`).
    pub include_headers: bool,
    /// Optional progress observer.
    pub on_progress: Option<Arc<dyn ProgressObserver>>,
}

impl fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadOptions")
            .field("sheet", &self.sheet)
            .field("source", &self.source.describe())
            .field("mode", &self.mode)
            .field("start_cell", &self.start_cell)
            .field("include_headers", &self.include_headers)
            .field("on_progress_set", &self.on_progress.is_some())
            .finish()
    }
}

impl UploadOptions {
    /// Replace-mode upload of `source` into `sheet`, with headers, starting at `A1`.
    pub fn new(sheet: impl Into<String>, source: impl Into<DataSource>) -> Self {
        Self {
            sheet: sheet.into(),
            source: source.into(),
            mode: UploadMode::default(),
            start_cell: "A1".to_string(),
            include_headers: true,
            on_progress: None,
        }
    }

    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_start_cell(mut self, cell: impl Into<String>) -> Self {
        self.start_cell = cell.into();
        self
    }

    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }

    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.on_progress = Some(observer);
        self
    }

    /// Check the options without touching the source or the network.
    pub fn validate(&self) -> UploadResult<()> {
        validate_sheet_name(&self.sheet)?;
        self.start_address().map(|_| ())
    }

    fn start_address(&self) -> UploadResult<CellAddress> {
        parse_cell(&self.start_cell).map_err(|_| {
            UploadError::validation(format!(
                "invalid start cell \"{}\". Must be in A1 notation (e.g. \"A1\", \"B5\")",
                self.start_cell
            ))
        })
    }

    fn emit(&self, phase: UploadPhase, processed_rows: usize, total_rows: usize) {
        if let Some(obs) = &self.on_progress {
            obs.on_progress(&ProgressEvent::new(phase, processed_rows, total_rows));
        }
    }
}

pub(crate) fn validate_sheet_name(sheet: &str) -> UploadResult<()> {
    if sheet.trim().is_empty() {
        return Err(UploadError::validation(
            "sheet name is required and must be a non-empty string",
        ));
    }
    Ok(())
}

/// Minimal stats reported on a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UploadStats {
    /// Rows written (including a header row, if any).
    pub rows: usize,
    /// Write calls issued.
    pub chunks: usize,
}

/// Everything an operation needs to reach one spreadsheet.
#[derive(Clone, Copy)]
pub struct UploadContext<'a> {
    pub service: &'a dyn SheetsService,
    pub spreadsheet_id: &'a str,
    pub guard: &'a RequestGuard,
    pub logger: &'a dyn Logger,
}

/// Upload `options.source` into `options.sheet`.
///
/// Parse errors and a missing sheet are returned as-is; failed writes are wrapped in an
/// [`UploadError::Upload`] naming the sheet, with the remote error as its cause.
pub fn upload_data(ctx: UploadContext<'_>, options: &UploadOptions) -> UploadResult<UploadStats> {
    options.validate()?;
    let sheet = options.sheet.as_str();

    options.emit(UploadPhase::Parsing, 0, 0);
    let mut grid = resolve_logged(&options.source, options.include_headers, ctx.logger)?;

    if grid.is_empty() {
        ctx.logger.debug(&format!("nothing to upload to \"{sheet}\""));
        options.emit(UploadPhase::Complete, 0, 0);
        return Ok(UploadStats::default());
    }

    let total_rows = grid.len();

    if options.mode == UploadMode::Replace {
        options.emit(UploadPhase::Clearing, 0, total_rows);
        clear_sheet(ctx, sheet)?;
    }

    options.emit(UploadPhase::Uploading, 0, total_rows);

    let ranges = chunk_ranges(total_rows, CHUNK_SIZE);
    let chunk_count = ranges.len();
    match options.mode {
        UploadMode::Append => {
            let target = cell_range(sheet, options.start_address()?);
            for (i, range) in ranges.into_iter().enumerate() {
                let rows = grid_to_wire(&grid[range.clone()]);
                ctx.logger.debug(&format!(
                    "appending chunk {}/{chunk_count} ({} rows) at {target}",
                    i + 1,
                    rows.len()
                ));
                ctx.guard
                    .call("append values", ctx.logger, || {
                        ctx.service.append_values(ctx.spreadsheet_id, &target, &rows)
                    })
                    .map_err(|e| write_failed(sheet, e))?;
                options.emit(UploadPhase::Uploading, range.end.min(total_rows), total_rows);
            }
        }
        UploadMode::Replace => {
            pad_rows(&mut grid);
            let width = max_width(&grid).max(1);
            for (i, range) in ranges.into_iter().enumerate() {
                let target = chunk_target(sheet, &range, width)?;
                let rows = grid_to_wire(&grid[range.clone()]);
                ctx.logger.debug(&format!(
                    "writing chunk {}/{chunk_count} ({} rows) to {target}",
                    i + 1,
                    rows.len()
                ));
                ctx.guard
                    .call("update values", ctx.logger, || {
                        ctx.service.update_values(ctx.spreadsheet_id, &target, &rows)
                    })
                    .map_err(|e| write_failed(sheet, e))?;
                options.emit(UploadPhase::Uploading, range.end.min(total_rows), total_rows);
            }
        }
    }

    options.emit(UploadPhase::Complete, total_rows, total_rows);
    Ok(UploadStats {
        rows: total_rows,
        chunks: chunk_count,
    })
}

fn write_failed(sheet: &str, e: UploadError) -> UploadError {
    e.context(format!("failed to upload data to sheet \"{sheet}\""))
}

/// A1 range covering rows `range` (0-based, end-exclusive) and columns `1..=width`.
fn chunk_target(sheet: &str, range: &Range<usize>, width: usize) -> UploadResult<String> {
    let too_large = |what: &str, n: usize| {
        UploadError::validation(format!("{what} {n} exceeds the addressable sheet size"))
    };
    let first_row = u32::try_from(range.start + 1).map_err(|_| too_large("row", range.start + 1))?;
    let last_row = u32::try_from(range.end).map_err(|_| too_large("row", range.end))?;
    let last_col = u32::try_from(width).map_err(|_| too_large("column count", width))?;
    Ok(build_range(sheet, first_row, 1, last_row, last_col))
}

fn chunk_ranges(row_count: usize, chunk_size: usize) -> Vec<Range<usize>> {
    if row_count == 0 {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(row_count.div_ceil(chunk_size));
    let mut start = 0usize;
    while start < row_count {
        let end = (start + chunk_size).min(row_count);
        out.push(start..end);
        start = end;
    }
    out
}
