//! The [`SheetsUploader`] facade.
//!
//! Binds credentials, logging, retry, and rate limiting to one destination spreadsheet and
//! exposes the upload/read/clear/batch/info operations. One instance can be shared across
//! threads; all operations on it share a single rate-limit window.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::auth::{authenticate, Authenticator, Credentials};
use crate::error::{UploadError, UploadResult};
use crate::execution::{RateLimiter, RequestGuard, RetryPolicy};
use crate::observability::{LevelFilter, LogLevel, Logger, TracingLogger};
use crate::sheets::{SheetsService, SpreadsheetInfo};
use crate::upload::{
    batch_upload, clear_sheet, read_sheet, upload_data, BatchOperation, ReadOptions, UploadContext,
    UploadOptions, UploadStats, validate_batch, validate_sheet_name,
};

/// Uploader configuration.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub credentials: Credentials,
    /// Destination spreadsheet ID.
    pub spreadsheet_id: String,
    /// Retries after the first attempt of each remote call (default 3).
    pub retries: u32,
    /// Delay before the first retry (default 1000 ms).
    pub retry_delay: Duration,
    /// Ceiling for remote calls per rolling minute (default 60).
    pub max_requests_per_minute: usize,
    /// Log verbosity (default `Info`).
    pub log_level: LogLevel,
}

impl UploaderConfig {
    pub fn new(credentials: impl Into<Credentials>, spreadsheet_id: impl Into<String>) -> Self {
        let retry = RetryPolicy::default();
        Self {
            credentials: credentials.into(),
            spreadsheet_id: spreadsheet_id.into(),
            retries: retry.retries,
            retry_delay: retry.initial_delay,
            max_requests_per_minute: 60,
            log_level: LogLevel::default(),
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_max_requests_per_minute(mut self, max: usize) -> Self {
        self.max_requests_per_minute = max;
        self
    }

    pub fn with_log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Check the configuration without reading files or touching the network.
    pub fn validate(&self) -> UploadResult<()> {
        if self.spreadsheet_id.trim().is_empty() {
            return Err(UploadError::validation(
                "spreadsheet ID is required and must be a non-empty string",
            ));
        }
        if let Credentials::KeyFile(path) = &self.credentials {
            if path.as_os_str().is_empty() {
                return Err(UploadError::validation("credentials file path must not be empty"));
            }
        }
        if self.max_requests_per_minute == 0 {
            return Err(UploadError::validation(
                "max requests per minute must be a positive number",
            ));
        }
        Ok(())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.retries,
            initial_delay: self.retry_delay,
            ..RetryPolicy::default()
        }
    }
}

/// Uploads tabular data to one spreadsheet.
pub struct SheetsUploader {
    config: UploaderConfig,
    logger: Arc<LevelFilter>,
    guard: RequestGuard,
    authenticator: Option<Arc<dyn Authenticator>>,
    client: Mutex<Option<Arc<dyn SheetsService>>>,
}

impl fmt::Debug for SheetsUploader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetsUploader")
            .field("spreadsheet_id", &self.config.spreadsheet_id)
            .field("log_level", &self.config.log_level)
            .field("retry", self.guard.retry_policy())
            .field("authenticator_set", &self.authenticator.is_some())
            .finish()
    }
}

impl SheetsUploader {
    /// Validate `config` and build an uploader. Authentication happens on first use.
    pub fn new(config: UploaderConfig) -> UploadResult<Self> {
        config.validate()?;
        let limiter = Arc::new(RateLimiter::per_minute(config.max_requests_per_minute));
        let guard = RequestGuard::new(limiter, config.retry_policy());
        let logger = Arc::new(LevelFilter::new(Arc::new(TracingLogger), config.log_level));
        Ok(Self {
            config,
            logger,
            guard,
            authenticator: None,
            client: Mutex::new(None),
        })
    }

    /// Send log output to `logger` instead of `tracing`, still filtered by the configured level.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Arc::new(LevelFilter::new(logger, self.config.log_level));
        self
    }

    /// Use `authenticator` to exchange service-account keys for a client.
    pub fn with_authenticator(mut self, authenticator: Arc<dyn Authenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Upload data to a sheet.
    pub fn upload(&self, options: &UploadOptions) -> UploadResult<UploadStats> {
        options.validate()?;
        self.logger.info(&format!(
            "starting upload to sheet \"{}\" ({} mode, {})",
            options.sheet,
            options.mode,
            options.source.describe()
        ));
        let service = self.service()?;
        let stats = upload_data(self.context(service.as_ref()), options).inspect_err(|e| {
            self.logger.error(&format!("upload to \"{}\" failed: {e}", options.sheet));
        })?;
        self.logger.info(&format!(
            "uploaded {} rows to sheet \"{}\" in {} chunk(s)",
            stats.rows, options.sheet, stats.chunks
        ));
        Ok(stats)
    }

    /// Read formatted values from a sheet or range.
    pub fn read(&self, options: &ReadOptions) -> UploadResult<Vec<Vec<String>>> {
        options.validate()?;
        let service = self.service()?;
        self.logger.info(&format!("reading {}", options.target()));
        let rows = read_sheet(self.context(service.as_ref()), options)?;
        self.logger.debug(&format!("read {} rows", rows.len()));
        Ok(rows)
    }

    /// Remove every cell value of a sheet.
    pub fn clear(&self, sheet: &str) -> UploadResult<()> {
        validate_sheet_name(sheet)?;
        let service = self.service()?;
        self.logger.info(&format!("clearing sheet \"{sheet}\""));
        clear_sheet(self.context(service.as_ref()), sheet)?;
        self.logger.info(&format!("cleared sheet \"{sheet}\""));
        Ok(())
    }

    /// Run several uploads in order, stopping at the first failure.
    pub fn batch(&self, operations: &[BatchOperation]) -> UploadResult<Vec<UploadStats>> {
        validate_batch(operations)?;
        let service = self.service()?;
        self.logger
            .info(&format!("starting batch upload of {} operation(s)", operations.len()));
        let stats = batch_upload(self.context(service.as_ref()), operations)?;
        self.logger.info("batch upload complete");
        Ok(stats)
    }

    /// Spreadsheet title, locale, and sheet list.
    pub fn spreadsheet_info(&self) -> UploadResult<SpreadsheetInfo> {
        let service = self.service()?;
        let id = self.config.spreadsheet_id.as_str();
        self.guard
            .call("get spreadsheet", &*self.logger, || service.spreadsheet(id))
            .map_err(|e| e.context("failed to get spreadsheet info"))
    }

    fn context<'a>(&'a self, service: &'a dyn SheetsService) -> UploadContext<'a> {
        UploadContext {
            service,
            spreadsheet_id: &self.config.spreadsheet_id,
            guard: &self.guard,
            logger: &*self.logger,
        }
    }

    /// Authorized client, authenticating on first use.
    fn service(&self) -> UploadResult<Arc<dyn SheetsService>> {
        let mut cached = self.client.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(service) = cached.as_ref() {
            return Ok(Arc::clone(service));
        }
        self.logger.debug(&format!("authenticating ({})", describe(&self.config.credentials)));
        let service = authenticate(&self.config.credentials, self.authenticator.as_deref())
            .inspect_err(|e| self.logger.error(&e.to_string()))?;
        *cached = Some(Arc::clone(&service));
        self.logger.debug("authenticated");
        Ok(service)
    }
}

fn describe(credentials: &Credentials) -> String {
    match credentials {
        Credentials::KeyFile(path) => format!("key file {}", path.display()),
        Credentials::ServiceAccount(key) => format!("service account {}", key.client_email),
        Credentials::Handle(_) => "pre-authenticated handle".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = UploaderConfig::new("key.json", "sheet-id");
        assert_eq!(cfg.retries, 3);
        assert_eq!(cfg.retry_delay, Duration::from_millis(1000));
        assert_eq!(cfg.max_requests_per_minute, 60);
        assert_eq!(cfg.log_level, LogLevel::Info);
    }

    #[test]
    fn config_is_validated_before_any_io() {
        let err = SheetsUploader::new(UploaderConfig::new("key.json", " ")).unwrap_err();
        assert!(matches!(err, UploadError::Validation { .. }));

        let err = SheetsUploader::new(UploaderConfig::new("", "id")).unwrap_err();
        assert!(err.to_string().contains("credentials file path"));

        let err = SheetsUploader::new(UploaderConfig::new("key.json", "id").with_max_requests_per_minute(0))
            .unwrap_err();
        assert!(err.to_string().contains("max requests per minute"));

        // The key file is only read on first use.
        assert!(SheetsUploader::new(UploaderConfig::new("/missing/key.json", "id")).is_ok());
    }
}
