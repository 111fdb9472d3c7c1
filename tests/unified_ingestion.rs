use std::path::PathBuf;

use serde_json::json;
use sheets_uploader::ingestion::{resolve, DataSource, FileFormat};
use sheets_uploader::{CellValue, UploadError};

#[test]
fn grids_pass_through_unchanged() {
    let grid = vec![
        vec![CellValue::text("a"), CellValue::Null],
        vec![CellValue::Number(1.0)],
    ];
    assert_eq!(resolve(&DataSource::Grid(grid.clone()), true).unwrap(), grid);
}

#[test]
fn csv_paths_dispatch_by_extension() {
    let grid = resolve(&DataSource::from("tests/fixtures/people.csv"), true).unwrap();
    assert_eq!(grid.len(), 4);
    assert_eq!(grid[1][1], CellValue::text("Ada"));
}

#[test]
fn extension_matching_ignores_case() {
    assert_eq!(FileFormat::from_extension("CSV"), Some(FileFormat::Csv));
    assert_eq!(FileFormat::from_extension("Xlsx"), Some(FileFormat::Excel));
    assert_eq!(FileFormat::from_extension("xls"), Some(FileFormat::Excel));
    assert_eq!(FileFormat::from_extension("parquet"), None);
}

#[test]
fn unsupported_extension_names_the_supported_set() {
    let err = resolve(&DataSource::from("tests/fixtures/people.tsv"), true).unwrap_err();
    assert!(matches!(err, UploadError::Validation { .. }));
    let msg = err.to_string();
    assert!(msg.contains(".xlsx"));
    assert!(msg.contains(".xls"));
    assert!(msg.contains(".csv"));
}

#[test]
fn untyped_json_is_routed_by_shape() {
    let grid = DataSource::from_json(json!([["a", 1], ["b", null]])).unwrap();
    assert_eq!(
        grid,
        DataSource::Grid(vec![
            vec![CellValue::text("a"), CellValue::Number(1.0)],
            vec![CellValue::text("b"), CellValue::Null],
        ])
    );

    assert_eq!(DataSource::from_json(json!([])).unwrap(), DataSource::Grid(Vec::new()));

    let records = DataSource::from_json(json!([{"a": 1}])).unwrap();
    assert!(matches!(records, DataSource::Records(ref items) if items.len() == 1));

    let path = DataSource::from_json(json!("data/report.xlsx")).unwrap();
    assert_eq!(path, DataSource::Path(PathBuf::from("data/report.xlsx")));

    for bad in [
        json!(42),
        json!({"a": 1}),
        json!(true),
        json!(null),
        json!([1, 2]),
        json!(["a"]),
        json!([null, {"a": 1}]),
    ] {
        let err = DataSource::from_json(bad).unwrap_err();
        assert!(matches!(err, UploadError::Validation { .. }));
    }
}

#[test]
fn record_items_that_are_not_objects_fail_to_parse() {
    let source = DataSource::from_json(json!([{"a": 1}, "oops"])).unwrap();
    let err = resolve(&source, true).unwrap_err();
    assert!(matches!(err, UploadError::Parse { .. }));
}

#[cfg(not(feature = "excel"))]
#[test]
fn excel_paths_need_the_feature() {
    let err = resolve(&DataSource::from("book.xlsx"), true).unwrap_err();
    assert!(err.to_string().contains("enable cargo feature 'excel'"));
}
