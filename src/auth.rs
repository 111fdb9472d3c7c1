//! Credential handling.
//!
//! The uploader accepts three kinds of [`Credentials`]. Exchanging a service-account key for an
//! authorized client is not done here: key credentials are validated and then handed to an
//! injected [`Authenticator`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{BoxError, UploadError, UploadResult};
use crate::sheets::SheetsService;

/// A parsed service-account key file.
///
/// Only `client_email` and `private_key` are required; other fields default to empty.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceAccountKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub auth_uri: String,
    pub token_uri: String,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("key_type", &self.key_type)
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key_set", &!self.private_key.is_empty())
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse key JSON text.
    pub fn from_json_str(text: &str) -> UploadResult<Self> {
        serde_json::from_str(text).map_err(|e| UploadError::Authentication {
            message: "credentials are not a valid service-account key".to_string(),
            source: Some(Box::new(e)),
        })
    }

    /// Require the identity and private key fields.
    pub fn validate(&self) -> UploadResult<()> {
        if self.client_email.trim().is_empty() || self.private_key.trim().is_empty() {
            return Err(UploadError::authentication(
                "invalid credentials object: must contain \"client_email\" and \"private_key\" fields",
            ));
        }
        Ok(())
    }
}

/// Exchanges a validated service-account key for an authorized service client.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, key: &ServiceAccountKey) -> Result<Arc<dyn SheetsService>, BoxError>;
}

/// A pre-authenticated handle that can hand out a service client.
pub trait AuthHandle: Send + Sync {
    fn client(&self) -> Result<Arc<dyn SheetsService>, BoxError>;
}

/// [`AuthHandle`] around an existing client.
struct ReadyClient(Arc<dyn SheetsService>);

impl AuthHandle for ReadyClient {
    fn client(&self) -> Result<Arc<dyn SheetsService>, BoxError> {
        Ok(Arc::clone(&self.0))
    }
}

/// Ways to authorize the uploader.
#[derive(Clone)]
pub enum Credentials {
    /// Path to a service-account key JSON file.
    KeyFile(PathBuf),
    /// An already-parsed service-account key.
    ServiceAccount(ServiceAccountKey),
    /// A pre-authenticated handle.
    Handle(Arc<dyn AuthHandle>),
}

impl Credentials {
    /// Credentials backed by an existing service client.
    pub fn client(service: Arc<dyn SheetsService>) -> Self {
        Self::Handle(Arc::new(ReadyClient(service)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyFile(p) => f.debug_tuple("KeyFile").field(p).finish(),
            Self::ServiceAccount(k) => f.debug_tuple("ServiceAccount").field(k).finish(),
            Self::Handle(_) => f.write_str("Handle(..)"),
        }
    }
}

impl From<PathBuf> for Credentials {
    fn from(path: PathBuf) -> Self {
        Self::KeyFile(path)
    }
}

impl From<&str> for Credentials {
    fn from(path: &str) -> Self {
        Self::KeyFile(PathBuf::from(path))
    }
}

impl From<ServiceAccountKey> for Credentials {
    fn from(key: ServiceAccountKey) -> Self {
        Self::ServiceAccount(key)
    }
}

/// Load and validate a key file.
pub fn load_key_file(path: &Path) -> UploadResult<ServiceAccountKey> {
    if !path.exists() {
        return Err(UploadError::authentication(format!(
            "credentials file not found at \"{}\". Ensure the file exists and the path is correct",
            path.display()
        )));
    }
    let text = fs::read_to_string(path).map_err(|e| UploadError::Authentication {
        message: format!("failed to read credentials at \"{}\"", path.display()),
        source: Some(Box::new(e)),
    })?;
    let key = ServiceAccountKey::from_json_str(&text)?;
    key.validate()?;
    Ok(key)
}

/// Turn `credentials` into an authorized service client.
///
/// Key credentials require `authenticator`; handles are asked for their client directly.
pub fn authenticate(
    credentials: &Credentials,
    authenticator: Option<&dyn Authenticator>,
) -> UploadResult<Arc<dyn SheetsService>> {
    let key = match credentials {
        Credentials::Handle(handle) => {
            return handle.client().map_err(|source| UploadError::Authentication {
                message: "pre-authenticated handle failed to provide a client".to_string(),
                source: Some(source),
            });
        }
        Credentials::ServiceAccount(key) => {
            key.validate()?;
            key.clone()
        }
        Credentials::KeyFile(path) => load_key_file(path)?,
    };

    let authenticator = authenticator.ok_or_else(|| {
        UploadError::authentication(format!(
            "no authenticator configured to exchange the service-account key for {}",
            key.client_email
        ))
    })?;

    authenticator
        .authenticate(&key)
        .map_err(|source| UploadError::Authentication {
            message: format!("failed to authenticate as {}", key.client_email),
            source: Some(source),
        })
}
