//! `sheets-uploader` normalizes tabular data from several shapes into one cell grid and
//! uploads it to a Google Sheets spreadsheet.
//!
//! The primary entrypoint is [`SheetsUploader`], built from an [`UploaderConfig`]. Every upload
//! goes through [`ingestion::resolve`], which turns a [`DataSource`] into a [`types::Grid`], and
//! then through the chunked writer in [`upload`].
//!
//! ## What you can upload
//!
//! - **Prebuilt grids**: `Vec<Vec<CellValue>>`, passed through unchanged
//! - **Structured records**: JSON objects, flattened to dot-joined column paths
//!   (`user.address.city`) with a header row built from every path seen, in first-seen order
//! - **CSV files**: `.csv`, with quoted fields and number/boolean coercion
//! - **Excel workbooks** (requires the Cargo feature `excel`, on by default): `.xlsx`, `.xls`;
//!   first worksheet only
//!
//! Cells are [`CellValue`]s: text, number, boolean, null, or a UTC instant. Instants are sent as
//! RFC 3339 text.
//!
//! ## Upload behavior
//!
//! - **Replace** mode (default) clears the sheet, pads rows to a common width, and writes from
//!   `A1` in explicit ranges.
//! - **Append** mode inserts rows after the existing content at the configured start cell.
//! - Rows are written in chunks of [`upload::CHUNK_SIZE`] rows, strictly one after another.
//! - Every remote call is rate limited (rolling one-minute window shared by the whole client)
//!   and retried with exponential backoff and jitter when the failure is transient.
//!
//! ## Quick example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use sheets_uploader::sheets::HttpSheetsService;
//! use sheets_uploader::{Credentials, SheetsUploader, UploadMode, UploadOptions, UploaderConfig};
//!
//! # fn main() -> Result<(), sheets_uploader::UploadError> {
//! let service = HttpSheetsService::new(Arc::new("ya29.token".to_string()))?;
//! let config = UploaderConfig::new(Credentials::client(Arc::new(service)), "1AbC...xyz");
//! let uploader = SheetsUploader::new(config)?;
//!
//! let records = vec![
//!     json!({"name": "Ada", "team": {"name": "Core"}}),
//!     json!({"name": "Grace", "active": true}),
//! ];
//! uploader.upload(&UploadOptions::new("People", records))?;
//!
//! let opts = UploadOptions::new("Log", "exports/events.csv").with_mode(UploadMode::Append);
//! let stats = uploader.upload(&opts)?;
//! println!("rows={} chunks={}", stats.rows, stats.chunks);
//! # Ok(())
//! # }
//! ```
//!
//! ## Progress
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use sheets_uploader::upload::ProgressEvent;
//! use sheets_uploader::UploadOptions;
//!
//! let opts = UploadOptions::new("Data", "data.csv")
//!     .with_progress(Arc::new(|e: &ProgressEvent| eprintln!("{e}")));
//! assert!(opts.validate().is_ok());
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: data resolution and format-specific parsers
//! - [`types`]: the cell model
//! - [`range`]: A1 range addressing
//! - [`execution`]: retry and rate limiting
//! - [`upload`]: upload orchestration, clear/read/batch
//! - [`sheets`]: the remote service seam and its REST transport
//! - [`auth`]: credentials
//! - [`observability`]: injectable loggers
//! - [`error`]: error types used across the crate

pub mod auth;
pub mod client;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod observability;
pub mod range;
pub mod sheets;
pub mod types;
pub mod upload;

pub use auth::{Credentials, ServiceAccountKey};
pub use client::{SheetsUploader, UploaderConfig};
pub use error::{SourceFormat, UploadError, UploadResult};
pub use ingestion::DataSource;
pub use observability::{LogLevel, Logger};
pub use types::{CellValue, Grid};
pub use upload::{BatchOperation, ReadOptions, UploadMode, UploadOptions, UploadStats};
