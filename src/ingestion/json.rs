//! Structured-record (JSON object) ingestion.
//!
//! Each record is flattened into dot-joined field paths (`user.address.city`). The header set
//! is the union of every record's paths in first-seen order, and each record becomes one row
//! with [`CellValue::Null`] wherever it lacks a path.
//!
//! Arrays are never descended into; they are kept whole as JSON text.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{SourceFormat, UploadError, UploadResult};
use crate::types::{CellValue, Grid};

/// Maximum object nesting followed while flattening a record.
pub const MAX_FLATTEN_DEPTH: usize = 64;

/// One record flattened into `(field path, leaf value)` pairs, in the record's own key order.
type FlatRecord<'a> = Vec<(String, &'a Value)>;

/// Parse a JSON value holding an array of objects.
///
/// Fails if `input` is not an array.
pub fn parse_records_value(input: &Value, include_headers: bool) -> UploadResult<Grid> {
    let items = input
        .as_array()
        .ok_or_else(|| UploadError::parse(SourceFormat::Json, "data must be an array of objects"))?;
    parse_records(items, include_headers)
}

/// Parse a JSON document (array of objects) from an in-memory string.
pub fn parse_records_from_str(input: &str, include_headers: bool) -> UploadResult<Grid> {
    let v: Value = serde_json::from_str(input.trim())
        .map_err(|e| UploadError::parse_with_source(SourceFormat::Json, "invalid json", e))?;
    parse_records_value(&v, include_headers)
}

/// Parse a JSON file holding an array of objects.
pub fn parse_records_from_path(path: impl AsRef<Path>, include_headers: bool) -> UploadResult<Grid> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| {
        UploadError::parse_with_source(
            SourceFormat::Json,
            format!("could not read file \"{}\"", path.display()),
            e,
        )
    })?;
    parse_records_from_str(&text, include_headers)
}

/// Convert a collection of records into a [`Grid`].
///
/// - With `include_headers`, the first row holds the field paths as text.
/// - An empty collection yields `[[]]` with headers and `[]` without.
/// - Any item that is not an object is an error.
pub fn parse_records(records: &[Value], include_headers: bool) -> UploadResult<Grid> {
    if records.is_empty() {
        return Ok(if include_headers { vec![Vec::new()] } else { Vec::new() });
    }

    let mut flattened: Vec<FlatRecord<'_>> = Vec::with_capacity(records.len());
    for (idx0, item) in records.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            UploadError::parse(
                SourceFormat::Json,
                format!("each item must be an object (item {} is not)", idx0 + 1),
            )
        })?;
        let mut flat = Vec::with_capacity(obj.len());
        flatten_into(obj, "", 0, &mut flat)?;
        flattened.push(flat);
    }

    let headers = collect_headers(&flattened);

    let mut rows: Grid = Vec::with_capacity(flattened.len() + usize::from(include_headers));
    if include_headers {
        rows.push(headers.iter().map(|h| CellValue::Text(h.clone())).collect());
    }

    for flat in &flattened {
        let lookup: HashMap<&str, &Value> = flat.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        let row = headers
            .iter()
            .map(|h| lookup.get(h.as_str()).map_or(CellValue::Null, |v| CellValue::from_json(v)))
            .collect();
        rows.push(row);
    }

    Ok(rows)
}

/// Ordered, duplicate-free union of field paths across `records`.
pub fn record_headers(records: &[Value]) -> UploadResult<Vec<String>> {
    let mut flattened = Vec::with_capacity(records.len());
    for item in records {
        let obj = item
            .as_object()
            .ok_or_else(|| UploadError::parse(SourceFormat::Json, "each item must be an object"))?;
        let mut flat = Vec::new();
        flatten_into(obj, "", 0, &mut flat)?;
        flattened.push(flat);
    }
    Ok(collect_headers(&flattened))
}

fn collect_headers(flattened: &[FlatRecord<'_>]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut headers = Vec::new();
    for flat in flattened {
        for (path, _) in flat {
            if seen.insert(path.as_str()) {
                headers.push(path.clone());
            }
        }
    }
    headers
}

fn flatten_into<'a>(
    obj: &'a Map<String, Value>,
    prefix: &str,
    depth: usize,
    out: &mut FlatRecord<'a>,
) -> UploadResult<()> {
    if depth >= MAX_FLATTEN_DEPTH {
        return Err(UploadError::parse(
            SourceFormat::Json,
            format!("record nesting exceeds {MAX_FLATTEN_DEPTH} levels at \"{prefix}\""),
        ));
    }

    for (key, value) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            // An empty object has no leaves, so it contributes no field paths.
            Value::Object(child) => flatten_into(child, &path, depth + 1, out)?,
            _ => out.push((path, value)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_objects_flatten_to_dot_paths() {
        let records = vec![json!({"user": {"address": {"city": "Oslo"}, "name": "Ada"}})];
        assert_eq!(record_headers(&records).unwrap(), vec!["user.address.city", "user.name"]);
    }

    #[test]
    fn depth_guard_rejects_pathological_nesting() {
        let mut v = json!(1);
        for _ in 0..(MAX_FLATTEN_DEPTH + 1) {
            v = json!({ "k": v });
        }
        let err = parse_records(&[v], true).unwrap_err();
        assert!(err.to_string().contains("nesting exceeds"));
    }
}
