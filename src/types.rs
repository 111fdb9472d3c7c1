//! Core data model types.
//!
//! Every parser produces a [`Grid`] of [`CellValue`]s; the uploader converts cells to their
//! transport form with [`CellValue::to_wire`] right before a remote call.

use chrono::{DateTime, SecondsFormat, Utc};

/// A single cell in a [`Grid`].
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Missing/empty value.
    Null,
    /// UTF-8 text.
    Text(String),
    /// Numeric value.
    Number(f64),
    /// Boolean.
    Bool(bool),
    /// Calendar instant. Serialized to ISO-8601 text only at the transport boundary.
    Instant(DateTime<Utc>),
}

/// Ordered rows of cells. Rows may differ in width until [`pad_rows`] is applied.
pub type Grid = Vec<Vec<CellValue>>;

impl CellValue {
    /// Convenience constructor for text cells.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Returns `true` for [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Map a structured-record leaf to a cell.
    ///
    /// Scalars keep their native type; objects and arrays are kept whole as compact JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => Self::Number(f),
                None => Self::Text(n.to_string()),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Transport form of this cell.
    ///
    /// Instants become RFC 3339 text (millisecond precision, `Z` suffix). Non-finite numbers
    /// have no JSON representation and become null.
    pub fn to_wire(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Instant(t) => serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(t: DateTime<Utc>) -> Self {
        Self::Instant(t)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Width of the widest row in `grid` (zero for an empty grid).
pub fn max_width(grid: &[Vec<CellValue>]) -> usize {
    grid.iter().map(Vec::len).max().unwrap_or(0)
}

/// Pad every row with [`CellValue::Null`] up to the widest row's length.
pub fn pad_rows(grid: &mut Grid) {
    let width = max_width(grid);
    for row in grid.iter_mut() {
        row.resize(width, CellValue::Null);
    }
}

/// Convert a whole grid to its transport form.
pub fn grid_to_wire(grid: &[Vec<CellValue>]) -> Vec<Vec<serde_json::Value>> {
    grid.iter()
        .map(|row| row.iter().map(CellValue::to_wire).collect())
        .collect()
}
