mod common;

use std::error::Error as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use sheets_uploader::auth::{Authenticator, ServiceAccountKey};
use sheets_uploader::error::BoxError;
use sheets_uploader::observability::Logger;
use sheets_uploader::sheets::SheetsService;
use sheets_uploader::{
    BatchOperation, CellValue, Credentials, LogLevel, ReadOptions, SheetsUploader, UploadError,
    UploadMode, UploadOptions, UploaderConfig,
};

use common::{bad_request, unavailable, Call, FakeSheets, Target};

#[derive(Default)]
struct Lines(Mutex<Vec<(LogLevel, String)>>);

impl Logger for Lines {
    fn log(&self, level: LogLevel, message: &str) {
        self.0.lock().unwrap().push((level, message.to_string()));
    }
}

impl Lines {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|(_, m)| m.clone()).collect()
    }
}

fn uploader(fake: &Arc<FakeSheets>) -> SheetsUploader {
    let service: Arc<dyn SheetsService> = fake.clone();
    let config = UploaderConfig::new(Credentials::client(service), "spreadsheet-1")
        .with_retry_delay(Duration::from_millis(1));
    SheetsUploader::new(config).unwrap()
}

#[test]
fn upload_goes_through_the_configured_client() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    let up = uploader(&fake);

    let records = vec![json!({"a": 1, "b": 2}), json!({"a": 3, "c": 4})];
    let stats = up.upload(&UploadOptions::new("Data", records)).unwrap();

    assert_eq!(stats.rows, 3);
    let Call::Update { range, rows } = &fake.writes()[0] else {
        panic!("expected update");
    };
    assert_eq!(range, "Data!A1:C3");
    assert_eq!(rows[0], vec![json!("a"), json!("b"), json!("c")]);
}

#[test]
fn read_returns_text_rows_and_quotes_the_sheet() {
    let fake = FakeSheets::with_sheets(&["Q1 Data"]);
    fake.set_values(vec![vec!["name", "score"], vec!["Ada", "98.5"]]);
    let up = uploader(&fake);

    let rows = up
        .read(&ReadOptions::new("Q1 Data").with_range("A1:B2"))
        .unwrap();

    assert_eq!(rows[1], vec!["Ada".to_string(), "98.5".to_string()]);
    assert_eq!(
        fake.calls(),
        vec![Call::Get {
            range: "'Q1 Data'!A1:B2".to_string()
        }]
    );
}

#[test]
fn read_failures_name_the_sheet_and_range() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    fake.fail_next(Target::Get, bad_request());
    let up = uploader(&fake);

    let err = up.read(&ReadOptions::new("Data").with_range("A1:Z")).unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("\"Data\""));
    assert!(msg.contains("A1:Z"));
    assert!(err.source().is_some());
}

#[test]
fn clear_resolves_the_sheet_id() {
    let fake = FakeSheets::with_sheets(&["First", "Second"]);
    let up = uploader(&fake);

    up.clear("Second").unwrap();
    assert_eq!(fake.calls(), vec![Call::Spreadsheet, Call::Clear { sheet_id: 100 }]);

    let err = up.clear("Third").unwrap_err();
    assert!(matches!(err, UploadError::SheetNotFound { .. }));
}

#[test]
fn clear_failures_are_wrapped_and_transient_ones_retried() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    fake.fail_next(Target::Spreadsheet, unavailable());
    fake.fail_next(Target::Clear, bad_request());
    let up = uploader(&fake);

    let err = up.clear("Data").unwrap_err();

    assert!(matches!(err, UploadError::Upload { .. }));
    assert!(err.to_string().contains("failed to clear sheet \"Data\""));
    assert_eq!(
        fake.calls(),
        vec![Call::Spreadsheet, Call::Spreadsheet, Call::Clear { sheet_id: 0 }]
    );
}

#[test]
fn batch_runs_in_order_and_stops_at_first_failure() {
    let fake = FakeSheets::with_sheets(&["One", "Two", "Three"]);
    fake.fail_next(Target::Append, bad_request());
    let lines = Arc::new(Lines::default());
    let up = uploader(&fake).with_logger(lines.clone());

    let grid = vec![vec![CellValue::text("x")]];
    let ops = vec![
        BatchOperation::new("One", grid.clone()),
        BatchOperation::new("Two", grid.clone()).with_mode(UploadMode::Append),
        BatchOperation::new("Three", grid),
    ];

    let err = up.batch(&ops).unwrap_err();
    assert!(err.to_string().contains("\"Two\""));

    let writes = fake.writes();
    assert_eq!(writes.len(), 2);
    assert!(matches!(&writes[0], Call::Update { range, .. } if range == "One!A1:A1"));
    assert!(fake.calls().iter().all(|c| *c != Call::Clear { sheet_id: 200 }));

    let messages = lines.messages();
    assert!(messages.iter().any(|m| m.starts_with("[1/3]")));
    assert!(messages.iter().any(|m| m.starts_with("[2/3]")));
    assert!(!messages.iter().any(|m| m.starts_with("[3/3]")));
}

#[test]
fn batch_is_validated_before_any_call() {
    let fake = FakeSheets::with_sheets(&["One"]);
    let up = uploader(&fake);

    let err = up.batch(&[]).unwrap_err();
    assert!(matches!(err, UploadError::Validation { .. }));

    let ops = vec![
        BatchOperation::new("One", Vec::<Vec<CellValue>>::new()),
        BatchOperation::new("", Vec::<Vec<CellValue>>::new()),
    ];
    let err = up.batch(&ops).unwrap_err();
    assert!(err.to_string().contains("index 1"));
    assert!(fake.calls().is_empty());
}

#[test]
fn spreadsheet_info_returns_metadata() {
    let fake = FakeSheets::with_sheets(&["Data", "Archive"]);
    let up = uploader(&fake);

    let info = up.spreadsheet_info().unwrap();

    assert_eq!(info.spreadsheet_id, "spreadsheet-1");
    assert_eq!(info.title, "Test Spreadsheet");
    assert_eq!(info.sheets.len(), 2);
    assert_eq!(info.sheets[1].title, "Archive");
    assert_eq!(info.sheets[1].sheet_id, 100);
}

#[test]
fn log_level_filters_injected_logger() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    let lines = Arc::new(Lines::default());
    let service: Arc<dyn SheetsService> = fake.clone();
    let config = UploaderConfig::new(Credentials::client(service), "id").with_log_level(LogLevel::Warn);
    let up = SheetsUploader::new(config).unwrap().with_logger(lines.clone());

    up.upload(&UploadOptions::new("Data", vec![vec![CellValue::Number(1.0)]]))
        .unwrap();
    assert!(lines.messages().is_empty());

    let _ = up.clear("Nope");
    assert!(lines.0.lock().unwrap().iter().all(|(l, _)| *l <= LogLevel::Warn));
}

struct CountingAuth {
    service: Arc<dyn SheetsService>,
    calls: Mutex<u32>,
}

impl Authenticator for CountingAuth {
    fn authenticate(&self, key: &ServiceAccountKey) -> Result<Arc<dyn SheetsService>, BoxError> {
        assert_eq!(key.client_email, "svc@example.iam.gserviceaccount.com");
        *self.calls.lock().unwrap() += 1;
        Ok(Arc::clone(&self.service))
    }
}

#[test]
fn key_credentials_authenticate_once_and_are_cached() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    let auth = Arc::new(CountingAuth {
        service: fake.clone(),
        calls: Mutex::new(0),
    });

    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("key.json");
    std::fs::write(
        &key_path,
        r#"{"type": "service_account", "client_email": "svc@example.iam.gserviceaccount.com", "private_key": "pk"}"#,
    )
    .unwrap();

    let up = SheetsUploader::new(UploaderConfig::new(key_path, "id"))
        .unwrap()
        .with_authenticator(auth.clone());

    up.spreadsheet_info().unwrap();
    up.clear("Data").unwrap();
    assert_eq!(*auth.calls.lock().unwrap(), 1);
}

#[test]
fn missing_key_file_fails_on_first_use() {
    let up = SheetsUploader::new(UploaderConfig::new("/nonexistent/key.json", "id")).unwrap();
    let err = up.spreadsheet_info().unwrap_err();
    assert!(matches!(err, UploadError::Authentication { .. }));
}

#[test]
fn invalid_config_is_rejected() {
    let fake = FakeSheets::with_sheets(&["Data"]);
    let service: Arc<dyn SheetsService> = fake.clone();

    let err = SheetsUploader::new(UploaderConfig::new(Credentials::client(service.clone()), ""))
        .unwrap_err();
    assert!(matches!(err, UploadError::Validation { .. }));

    let err = SheetsUploader::new(
        UploaderConfig::new(Credentials::client(service), "id").with_max_requests_per_minute(0),
    )
    .unwrap_err();
    assert!(matches!(err, UploadError::Validation { .. }));
}
