//! Ingestion entrypoints and implementations.
//!
//! Most callers should use [`resolve`] (from [`unified`]) which:
//!
//! - passes prebuilt grids through unchanged
//! - flattens structured records into a header row plus one row per record
//! - detects file format by extension and parses the file
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`json`]
//! - `excel` (feature `excel`)

pub mod csv;
#[cfg(feature = "excel")]
pub mod excel;
pub mod json;
pub mod unified;

pub use unified::{resolve, resolve_logged, DataSource, FileFormat};
