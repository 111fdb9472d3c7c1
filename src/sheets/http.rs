use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::json;

use crate::error::{error_chain_message, BoxError, UploadError, UploadResult};

use super::{SheetInfo, SheetsService, SpreadsheetInfo, WireRows};

/// Root of the Sheets v4 REST API.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Supplies OAuth bearer tokens for requests.
///
/// Obtaining the token (service-account JWT exchange, metadata server, ...) happens outside
/// this crate. A plain `String` is a static token.
pub trait AccessTokenSource: Send + Sync {
    fn access_token(&self) -> Result<String, BoxError>;
}

impl AccessTokenSource for String {
    fn access_token(&self) -> Result<String, BoxError> {
        Ok(self.clone())
    }
}

/// Blocking [`SheetsService`] over the Sheets v4 REST API.
pub struct HttpSheetsService {
    http: Client,
    base_url: String,
    tokens: Arc<dyn AccessTokenSource>,
}

impl fmt::Debug for HttpSheetsService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSheetsService")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpSheetsService {
    /// Create a client that authorizes every request with a token from `tokens`.
    pub fn new(tokens: Arc<dyn AccessTokenSource>) -> UploadResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| transport_error(&e))?;
        Ok(Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            tokens,
        })
    }

    /// Point the client at another API root (proxies, emulators).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> UploadResult<Url> {
        let invalid = |message: String| UploadError::Validation { message };
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| invalid(format!("invalid base url \"{}\": {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|()| invalid(format!("base url \"{}\" cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn send(&self, req: RequestBuilder) -> UploadResult<Response> {
        let token = self.tokens.access_token().map_err(|source| UploadError::Authentication {
            message: "could not obtain an access token".to_string(),
            source: Some(source),
        })?;
        let resp = req.bearer_auth(token).send().map_err(|e| transport_error(&e))?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(error_from_response(status, &body))
    }

    fn read_json<T: for<'de> Deserialize<'de>>(resp: Response) -> UploadResult<T> {
        let text = resp.text().map_err(|e| transport_error(&e))?;
        serde_json::from_str(&text).map_err(|e| UploadError::Service {
            status: None,
            message: format!("unexpected response body: {e}"),
        })
    }
}

impl SheetsService for HttpSheetsService {
    fn spreadsheet(&self, spreadsheet_id: &str) -> UploadResult<SpreadsheetInfo> {
        let url = self.url(
            &[spreadsheet_id],
            &[("fields", "spreadsheetId,properties(title,locale),sheets.properties")],
        )?;
        let resp = self.send(self.http.get(url))?;
        let raw: RawSpreadsheet = Self::read_json(resp)?;
        Ok(raw.into_info(spreadsheet_id))
    }

    fn clear_sheet(&self, spreadsheet_id: &str, sheet_id: i64) -> UploadResult<()> {
        let url = self.url(&[&format!("{spreadsheet_id}:batchUpdate")], &[])?;
        let body = json!({
            "requests": [{
                "updateCells": {
                    "range": { "sheetId": sheet_id, "startRowIndex": 0, "startColumnIndex": 0 },
                    "fields": "userEnteredValue",
                }
            }]
        });
        self.send(self.http.post(url).json(&body))?;
        Ok(())
    }

    fn update_values(&self, spreadsheet_id: &str, range: &str, rows: &WireRows) -> UploadResult<()> {
        let url = self.url(&[spreadsheet_id, "values", range], &[("valueInputOption", "RAW")])?;
        let body = json!({ "range": range, "majorDimension": "ROWS", "values": rows });
        self.send(self.http.put(url).json(&body))?;
        Ok(())
    }

    fn append_values(&self, spreadsheet_id: &str, range: &str, rows: &WireRows) -> UploadResult<()> {
        let url = self.url(
            &[spreadsheet_id, "values", &format!("{range}:append")],
            &[("valueInputOption", "RAW"), ("insertDataOption", "INSERT_ROWS")],
        )?;
        let body = json!({ "majorDimension": "ROWS", "values": rows });
        self.send(self.http.post(url).json(&body))?;
        Ok(())
    }

    fn get_values(&self, spreadsheet_id: &str, range: &str) -> UploadResult<Vec<Vec<String>>> {
        let url = self.url(&[spreadsheet_id, "values", range], &[])?;
        let resp = self.send(self.http.get(url))?;
        let raw: RawValueRange = Self::read_json(resp)?;
        Ok(raw.into_rows())
    }
}

fn transport_error(e: &reqwest::Error) -> UploadError {
    UploadError::Service {
        status: e.status().map(|s| s.as_u16()),
        message: error_chain_message(e),
    }
}

fn error_from_response(status: StatusCode, body: &str) -> UploadError {
    let message = serde_json::from_str::<RawErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });

    if status == StatusCode::TOO_MANY_REQUESTS {
        return UploadError::RateLimited { message };
    }
    UploadError::Service {
        status: Some(status.as_u16()),
        message,
    }
}

#[derive(Deserialize)]
struct RawErrorBody {
    error: RawErrorDetail,
}

#[derive(Deserialize)]
struct RawErrorDetail {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSpreadsheet {
    spreadsheet_id: Option<String>,
    properties: RawSpreadsheetProperties,
    sheets: Vec<RawSheet>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSpreadsheetProperties {
    title: String,
    locale: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSheet {
    properties: RawSheetProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawSheetProperties {
    sheet_id: i64,
    title: String,
    grid_properties: RawGridProperties,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawGridProperties {
    row_count: u64,
    column_count: u64,
}

impl RawSpreadsheet {
    fn into_info(self, requested_id: &str) -> SpreadsheetInfo {
        SpreadsheetInfo {
            spreadsheet_id: self.spreadsheet_id.unwrap_or_else(|| requested_id.to_string()),
            title: self.properties.title,
            locale: self.properties.locale,
            sheets: self
                .sheets
                .into_iter()
                .map(|s| SheetInfo {
                    sheet_id: s.properties.sheet_id,
                    title: s.properties.title,
                    row_count: s.properties.grid_properties.row_count,
                    column_count: s.properties.grid_properties.column_count,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawValueRange {
    values: Vec<Vec<serde_json::Value>>,
}

impl RawValueRange {
    fn into_rows(self) -> Vec<Vec<String>> {
        self.values
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|v| match v {
                        serde_json::Value::String(s) => s,
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .collect()
    }
}
