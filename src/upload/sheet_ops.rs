//! Whole-sheet operations built on the same guarded calls as [`super::upload_data`].

use crate::error::{UploadError, UploadResult};
use crate::ingestion::DataSource;
use crate::range::quote_sheet_name;

use super::{upload_data, validate_sheet_name, UploadContext, UploadMode, UploadOptions, UploadStats};

/// Remove every cell value of `sheet`.
///
/// A missing sheet is reported as [`UploadError::SheetNotFound`]; any other failure is
/// wrapped with the sheet name.
pub fn clear_sheet(ctx: UploadContext<'_>, sheet: &str) -> UploadResult<()> {
    validate_sheet_name(sheet)?;
    let info = ctx
        .guard
        .call("get spreadsheet", ctx.logger, || ctx.service.spreadsheet(ctx.spreadsheet_id))
        .map_err(|e| e.context(format!("failed to clear sheet \"{sheet}\"")))?;
    let sheet_id = info.sheet_id(sheet)?;

    ctx.logger.debug(&format!("clearing sheet \"{sheet}\" (id {sheet_id})"));
    ctx.guard
        .call("clear sheet", ctx.logger, || {
            ctx.service.clear_sheet(ctx.spreadsheet_id, sheet_id)
        })
        .map_err(|e| e.context(format!("failed to clear sheet \"{sheet}\"")))
}

/// Options for [`read_sheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub sheet: String,
    /// A1 range within the sheet (`A1:C10`); the whole sheet when `None`.
    pub range: Option<String>,
}

impl ReadOptions {
    pub fn new(sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            range: None,
        }
    }

    pub fn with_range(mut self, range: impl Into<String>) -> Self {
        self.range = Some(range.into());
        self
    }

    pub fn validate(&self) -> UploadResult<()> {
        validate_sheet_name(&self.sheet)?;
        if self.range.as_deref().is_some_and(|r| r.trim().is_empty()) {
            return Err(UploadError::validation("range must be a non-empty string when provided"));
        }
        Ok(())
    }

    /// Full range string sent to the service.
    pub fn target(&self) -> String {
        let sheet = quote_sheet_name(&self.sheet);
        match &self.range {
            Some(range) => format!("{sheet}!{range}"),
            None => sheet,
        }
    }
}

/// Read the formatted values of a sheet or range. Empty ranges read as no rows.
pub fn read_sheet(ctx: UploadContext<'_>, options: &ReadOptions) -> UploadResult<Vec<Vec<String>>> {
    options.validate()?;
    let target = options.target();
    ctx.guard
        .call("get values", ctx.logger, || ctx.service.get_values(ctx.spreadsheet_id, &target))
        .map_err(|e| {
            let range = options
                .range
                .as_deref()
                .map(|r| format!(" range \"{r}\""))
                .unwrap_or_default();
            e.context(format!(
                "failed to read data from sheet \"{}\"{range}",
                options.sheet
            ))
        })
}

/// One entry of a [`batch_upload`].
#[derive(Debug, Clone)]
pub struct BatchOperation {
    pub sheet: String,
    pub source: DataSource,
    pub mode: UploadMode,
    pub include_headers: bool,
}

impl BatchOperation {
    /// Replace-mode operation with headers.
    pub fn new(sheet: impl Into<String>, source: impl Into<DataSource>) -> Self {
        Self {
            sheet: sheet.into(),
            source: source.into(),
            mode: UploadMode::default(),
            include_headers: true,
        }
    }

    pub fn with_mode(mut self, mode: UploadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_headers(mut self, include_headers: bool) -> Self {
        self.include_headers = include_headers;
        self
    }

    fn to_options(&self) -> UploadOptions {
        UploadOptions::new(self.sheet.clone(), self.source.clone())
            .with_mode(self.mode)
            .with_headers(self.include_headers)
    }
}

pub(crate) fn validate_batch(operations: &[BatchOperation]) -> UploadResult<()> {
    if operations.is_empty() {
        return Err(UploadError::validation("operations must be a non-empty list"));
    }
    for (i, op) in operations.iter().enumerate() {
        if op.sheet.trim().is_empty() {
            return Err(UploadError::validation(format!(
                "operation at index {i} is missing a sheet name"
            )));
        }
    }
    Ok(())
}

/// Run `operations` one after another, stopping at the first failure.
///
/// Every entry is validated before the first upload starts.
pub fn batch_upload(
    ctx: UploadContext<'_>,
    operations: &[BatchOperation],
) -> UploadResult<Vec<UploadStats>> {
    validate_batch(operations)?;

    let total = operations.len();
    let mut stats = Vec::with_capacity(total);
    for (i, op) in operations.iter().enumerate() {
        ctx.logger.info(&format!(
            "[{}/{total}] uploading to sheet \"{}\" ({} mode)",
            i + 1,
            op.sheet,
            op.mode
        ));
        stats.push(upload_data(ctx, &op.to_options())?);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_targets_quote_sheet_names() {
        assert_eq!(ReadOptions::new("Data").target(), "Data");
        assert_eq!(ReadOptions::new("Q1 Data").with_range("A1:B2").target(), "'Q1 Data'!A1:B2");
    }

    #[test]
    fn read_options_reject_blank_range() {
        assert!(ReadOptions::new("Data").with_range(" ").validate().is_err());
        assert!(ReadOptions::new("").validate().is_err());
        assert!(ReadOptions::new("Data").with_range("A:A").validate().is_ok());
    }
}
