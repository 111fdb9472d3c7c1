#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use sheets_uploader::sheets::{SheetInfo, SheetsService, SpreadsheetInfo};
use sheets_uploader::{UploadError, UploadResult};

/// One recorded remote call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Spreadsheet,
    Clear { sheet_id: i64 },
    Update { range: String, rows: Vec<Vec<Value>> },
    Append { range: String, rows: Vec<Vec<Value>> },
    Get { range: String },
}

/// Which calls a scripted failure applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Spreadsheet,
    Clear,
    Update,
    Append,
    Get,
}

/// In-memory `SheetsService` that records every call and can be scripted to fail.
#[derive(Default)]
pub struct FakeSheets {
    sheets: Vec<SheetInfo>,
    calls: Mutex<Vec<Call>>,
    failures: Mutex<VecDeque<(Target, usize, UploadError)>>,
    values: Mutex<Vec<Vec<String>>>,
}

impl FakeSheets {
    pub fn with_sheets(titles: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            sheets: titles
                .iter()
                .enumerate()
                .map(|(i, t)| SheetInfo {
                    sheet_id: i as i64 * 100,
                    title: t.to_string(),
                    row_count: 1000,
                    column_count: 26,
                })
                .collect(),
            ..Default::default()
        })
    }

    /// Fail the next call matching `target` with `err`. Failures queue in order.
    pub fn fail_next(&self, target: Target, err: UploadError) {
        self.fail_nth(target, 0, err);
    }

    /// Let `skip` matching calls succeed, then fail the next one with `err`.
    pub fn fail_nth(&self, target: Target, skip: usize, err: UploadError) {
        self.failures.lock().unwrap().push_back((target, skip, err));
    }

    pub fn set_values(&self, rows: Vec<Vec<&str>>) {
        *self.values.lock().unwrap() = rows
            .into_iter()
            .map(|r| r.into_iter().map(str::to_string).collect())
            .collect();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Update { .. } | Call::Append { .. }))
            .collect()
    }

    fn record(&self, target: Target, call: Call) -> UploadResult<()> {
        self.calls.lock().unwrap().push(call);
        let mut failures = self.failures.lock().unwrap();
        if let Some(pos) = failures.iter().position(|(t, _, _)| *t == target) {
            if failures[pos].1 > 0 {
                failures[pos].1 -= 1;
                return Ok(());
            }
            let (_, _, err) = failures.remove(pos).unwrap();
            return Err(err);
        }
        Ok(())
    }
}

impl SheetsService for FakeSheets {
    fn spreadsheet(&self, spreadsheet_id: &str) -> UploadResult<SpreadsheetInfo> {
        self.record(Target::Spreadsheet, Call::Spreadsheet)?;
        Ok(SpreadsheetInfo {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: "Test Spreadsheet".to_string(),
            locale: "en_US".to_string(),
            sheets: self.sheets.clone(),
        })
    }

    fn clear_sheet(&self, _spreadsheet_id: &str, sheet_id: i64) -> UploadResult<()> {
        self.record(Target::Clear, Call::Clear { sheet_id })
    }

    fn update_values(&self, _spreadsheet_id: &str, range: &str, rows: &[Vec<Value>]) -> UploadResult<()> {
        self.record(
            Target::Update,
            Call::Update {
                range: range.to_string(),
                rows: rows.to_vec(),
            },
        )
    }

    fn append_values(&self, _spreadsheet_id: &str, range: &str, rows: &[Vec<Value>]) -> UploadResult<()> {
        self.record(
            Target::Append,
            Call::Append {
                range: range.to_string(),
                rows: rows.to_vec(),
            },
        )
    }

    fn get_values(&self, _spreadsheet_id: &str, range: &str) -> UploadResult<Vec<Vec<String>>> {
        self.record(
            Target::Get,
            Call::Get {
                range: range.to_string(),
            },
        )?;
        Ok(self.values.lock().unwrap().clone())
    }
}

pub fn unavailable() -> UploadError {
    UploadError::Service {
        status: Some(503),
        message: "The service is currently unavailable".to_string(),
    }
}

pub fn bad_request() -> UploadError {
    UploadError::Service {
        status: Some(400),
        message: "Unable to parse range".to_string(),
    }
}
