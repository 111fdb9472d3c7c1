use serde_json::json;
use sheets_uploader::ingestion::json::{
    parse_records, parse_records_from_path, parse_records_from_str, record_headers,
};
use sheets_uploader::{CellValue, UploadError};

fn t(s: &str) -> CellValue {
    CellValue::text(s)
}

#[test]
fn headers_are_the_union_in_first_seen_order() {
    let records = vec![json!({"a": 1, "b": 2}), json!({"a": 3, "c": 4})];
    let grid = parse_records(&records, true).unwrap();
    assert_eq!(
        grid,
        vec![
            vec![t("a"), t("b"), t("c")],
            vec![CellValue::Number(1.0), CellValue::Number(2.0), CellValue::Null],
            vec![CellValue::Number(3.0), CellValue::Null, CellValue::Number(4.0)],
        ]
    );
}

#[test]
fn nested_objects_flatten_to_dot_paths_and_arrays_stay_whole() {
    let records = vec![json!({
        "id": 7,
        "user": {"name": "Ada", "address": {"city": "London"}},
        "tags": ["x", "y"],
        "active": true,
        "note": null,
    })];
    let grid = parse_records(&records, true).unwrap();
    assert_eq!(
        grid[0],
        vec![t("id"), t("user.name"), t("user.address.city"), t("tags"), t("active"), t("note")]
    );
    assert_eq!(
        grid[1],
        vec![
            CellValue::Number(7.0),
            t("Ada"),
            t("London"),
            t("[\"x\",\"y\"]"),
            CellValue::Bool(true),
            CellValue::Null,
        ]
    );
}

#[test]
fn header_set_ignores_repeats_across_records() {
    let records = vec![
        json!({"b": 1, "a": {"x": 1}}),
        json!({"a": {"x": 2, "y": 3}, "b": 4}),
    ];
    assert_eq!(record_headers(&records).unwrap(), vec!["b", "a.x", "a.y"]);
}

#[test]
fn headers_can_be_left_out() {
    let grid = parse_records(&[json!({"a": 1})], false).unwrap();
    assert_eq!(grid, vec![vec![CellValue::Number(1.0)]]);
}

#[test]
fn empty_collections() {
    assert_eq!(parse_records(&[], true).unwrap(), vec![Vec::<CellValue>::new()]);
    assert!(parse_records(&[], false).unwrap().is_empty());
}

#[test]
fn non_object_items_are_rejected() {
    let err = parse_records(&[json!({"a": 1}), json!(5)], true).unwrap_err();
    assert!(matches!(err, UploadError::Parse { .. }));
    assert!(err.to_string().contains("item 2"));
}

#[test]
fn top_level_must_be_an_array() {
    let err = parse_records_from_str(r#"{"a": 1}"#, true).unwrap_err();
    assert!(err.to_string().contains("must be an array"));

    let err = parse_records_from_str("[{", true).unwrap_err();
    assert!(matches!(err, UploadError::Parse { source: Some(_), .. }));
}

#[test]
fn records_load_from_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.json");
    std::fs::write(&path, r#"[{"name": "Ada", "score": 98.5}]"#).unwrap();

    let grid = parse_records_from_path(&path, true).unwrap();
    assert_eq!(grid[1], vec![t("Ada"), CellValue::Number(98.5)]);
}
