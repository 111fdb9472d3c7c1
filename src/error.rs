use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;

/// Boxed error used to keep third-party causes attached to an [`UploadError`].
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Convenience result type for parsing, upload, and client operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// HTTP status codes the remote service uses for transient conditions.
const RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// Lowercased fragments of transport error messages that indicate a transient network failure.
const TRANSIENT_MESSAGE_PATTERNS: [&str; 9] = [
    "econnreset",
    "etimedout",
    "enotfound",
    "socket hang up",
    "connection reset",
    "timed out",
    "broken pipe",
    "connection closed",
    "dns error",
];

/// Source format named in [`UploadError::Parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Comma-delimited text.
    Csv,
    /// Structured records (JSON objects).
    Json,
    /// Spreadsheet documents (`.xlsx`, `.xls`).
    Excel,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("CSV"),
            Self::Json => f.write_str("JSON"),
            Self::Excel => f.write_str("Excel"),
        }
    }
}

/// Error type returned by every operation in this crate.
///
/// Causes are kept as `source()` so callers can walk the chain; nothing is flattened into a
/// string except where the cause came from outside the crate as a message.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Caller input is malformed. Raised before any I/O happens.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Credentials are missing, malformed, or could not be exchanged for a client.
    #[error("authentication error: {message}")]
    Authentication {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A source file or record collection could not be parsed.
    #[error("failed to parse {format} data: {message}")]
    Parse {
        format: SourceFormat,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The named sheet does not exist in the destination spreadsheet.
    #[error("sheet \"{sheet}\" not found in the spreadsheet")]
    SheetNotFound { sheet: String },

    /// The remote service signalled that the request quota was exceeded.
    #[error("rate limit exceeded: {message}")]
    RateLimited { message: String },

    /// Failure reported by the remote service or its transport.
    #[error("{}", service_display(*status, message))]
    Service { status: Option<u16>, message: String },

    /// Any other failure, with context added and the original error kept as the cause.
    #[error("{message}")]
    Upload {
        message: String,
        #[source]
        source: Box<UploadError>,
    },
}

fn service_display(status: Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("service error (status {code}): {message}"),
        None => format!("service error: {message}"),
    }
}

impl UploadError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn parse(format: SourceFormat, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn parse_with_source(
        format: SourceFormat,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Parse {
            format,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub(crate) fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap `self` with a context message, keeping it as the cause.
    pub fn context(self, message: impl Into<String>) -> Self {
        Self::Upload {
            message: message.into(),
            source: Box::new(self),
        }
    }

    /// HTTP-style status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => *status,
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }

    /// Whether a failed remote call may succeed if attempted again.
    ///
    /// Quota errors are always retryable; service errors are retryable when they carry a
    /// transient status code or a message that matches a known transient network failure.
    /// Context wrappers, parse, validation, and authentication failures are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Service { status, message } => {
                if status.is_some_and(|code| RETRYABLE_STATUS_CODES.contains(&code)) {
                    return true;
                }
                is_transient_message(message)
            }
            _ => false,
        }
    }
}

fn is_transient_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    TRANSIENT_MESSAGE_PATTERNS.iter().any(|p| lower.contains(p))
}

/// Render an error followed by every error in its `source()` chain, separated by `: `.
#[cfg_attr(not(feature = "http"), allow(dead_code))]
pub(crate) fn error_chain_message(e: &(dyn StdError + 'static)) -> String {
    let mut out = e.to_string();
    let mut cur = e.source();
    while let Some(err) = cur {
        let text = err.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        cur = err.source();
    }
    out
}
