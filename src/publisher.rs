//! Archive publication to the remote object store.
//!
//! Provides a trait-based abstraction over the store so the pipeline can
//! be tested without network access, plus the production implementation
//! targeting the Google Cloud Storage JSON upload API.

use crate::error::{PackagerError, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

/// Base URL of the GCS JSON media-upload API.
const UPLOAD_ENDPOINT: &str = "https://storage.googleapis.com/upload/storage/v1/b";

/// Network timeout covering the whole archive upload.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Trait for publishing the package archive to an object store.
///
/// Abstraction allows tests to mock the store without network access.
#[cfg_attr(test, mockall::automock)]
pub trait ObjectStore {
    /// Upload the file at `archive` to `bucket` under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive cannot be read or the store
    /// rejects the upload.
    fn put_object(&self, bucket: &str, key: &str, archive: &Path) -> Result<()>;
}

/// Pre-provisioned service-account credentials, parsed from the JSON blob
/// supplied at configuration time.
///
/// Token exchange and signing happen upstream; the blob carries a
/// ready-to-use OAuth2 access token.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceCredentials {
    /// The bearer token presented to the store.
    access_token: String,
    /// The cloud project the bucket belongs to, when the blob records it.
    #[serde(default)]
    project_id: Option<String>,
}

impl ServiceCredentials {
    /// Parse a credentials JSON blob.
    ///
    /// # Errors
    ///
    /// Returns [`PackagerError::Credentials`] when the blob is not valid
    /// JSON or the access token is missing or empty.
    pub fn from_json(blob: &str) -> Result<Self> {
        let credentials: Self =
            serde_json::from_str(blob).map_err(|e| PackagerError::Credentials {
                reason: format!("malformed credentials JSON: {e}"),
            })?;
        if credentials.access_token.trim().is_empty() {
            return Err(PackagerError::Credentials {
                reason: "credentials JSON carries an empty access_token".to_owned(),
            });
        }
        Ok(credentials)
    }

    /// The project identifier recorded in the blob, if any.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }
}

/// Production [`ObjectStore`] backed by the GCS JSON upload API.
pub struct GcsObjectStore {
    credentials: ServiceCredentials,
    project_id: Option<String>,
}

impl GcsObjectStore {
    /// Create a store client that authenticates with `credentials`,
    /// scoping requests to `project_id` when one is configured.
    #[must_use]
    pub fn new(credentials: ServiceCredentials, project_id: Option<String>) -> Self {
        Self {
            credentials,
            project_id,
        }
    }

    /// The project uploads are scoped to, if configured.
    #[must_use]
    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Construct the media-upload URL for a bucket. The object name is
    /// supplied as a query parameter so it is percent-encoded by the
    /// HTTP client.
    ///
    /// # Examples
    ///
    /// ```
    /// use fuzzpack::publisher::GcsObjectStore;
    ///
    /// let url = GcsObjectStore::upload_url("fd-fuzz-targets");
    /// assert!(url.ends_with("/b/fd-fuzz-targets/o"));
    /// ```
    #[must_use]
    pub fn upload_url(bucket: &str) -> String {
        format!("{UPLOAD_ENDPOINT}/{bucket}/o")
    }
}

impl ObjectStore for GcsObjectStore {
    fn put_object(&self, bucket: &str, key: &str, archive: &Path) -> Result<()> {
        let url = Self::upload_url(bucket);
        let mut file = std::fs::File::open(archive)?;

        let mut request = http_agent()
            .post(&url)
            .query("uploadType", "media")
            .query("name", key)
            .header(
                "authorization",
                format!("Bearer {}", self.credentials.access_token),
            )
            .header("content-type", "application/octet-stream");
        if let Some(project) = &self.project_id {
            request = request.header("x-goog-user-project", project);
        }

        // Success is the store's completed response, nothing earlier.
        request
            .send(ureq::SendBody::from_reader(&mut file))
            .map_err(|e| map_upload_error(key, &e))?;
        Ok(())
    }
}

/// Shared `ureq` agent with upload timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(UPLOAD_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// Map a ureq error to a [`PackagerError::Publish`] naming the object.
fn map_upload_error(key: &str, err: &ureq::Error) -> PackagerError {
    let reason = match err {
        ureq::Error::StatusCode(code) => format!("store rejected upload with HTTP {code}"),
        other => other.to_string(),
    };
    PackagerError::Publish {
        object: key.to_owned(),
        reason,
    }
}
