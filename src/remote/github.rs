//! GitHub contents API transport.
//!
//! `GET /repos/{owner}/{repo}/contents/{path}` returns the base64 file body and
//! its blob sha, which serves as the version token. `PUT` on the same URL writes
//! a new commit; sending the sha makes it a compare-and-swap update, omitting it
//! makes it a create.

use super::{ContentStore, RemoteBlob};
use crate::config::RemoteConfig;
use crate::error::SyncError;
use crate::types::VersionToken;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

const GITHUB_MEDIA_TYPE: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Which request a failing status belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Serialize)]
struct PutRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Debug, Deserialize)]
struct PutContent {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

pub struct GitHubContentStore {
    client: Client,
    url: Url,
    owner: String,
    repo: String,
    path: String,
    branch: Option<String>,
    commit_message: String,
}

impl GitHubContentStore {
    /// Build a store from config. Fails with `ConfigError` before any network
    /// call when the target or credential is missing.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, SyncError> {
        config.validate()?;
        let token = config.resolve_token()?;
        let owner = config.owner().unwrap_or_default().to_string();
        let repo = config.repo().unwrap_or_default().to_string();
        let path = config.path.trim_matches('/').to_string();

        let url = contents_url(&config.api_base, &owner, &repo, &path)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_MEDIA_TYPE));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| SyncError::ConfigError("Token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("promptsync/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .connect_timeout(config.timeout())
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            owner,
            repo,
            path,
            branch: config.branch.clone().filter(|b| !b.trim().is_empty()),
            commit_message: config.commit_message.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// GET the contents endpoint; `None` when the file does not exist.
    async fn get_contents(&self) -> Result<Option<Value>, SyncError> {
        let mut request = self.client.get(self.url.clone());
        if let Some(branch) = &self.branch {
            request = request.query(&[("ref", branch.as_str())]);
        }
        debug!(url = %self.url, "GET remote content");
        let response = request.send().await.map_err(transport_error)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(path = %self.path, "Remote file not found");
            return Ok(None);
        }
        if !status.is_success() {
            return Err(self.error_for(Operation::Read, response, None).await);
        }

        let body: Value = response.json().await.map_err(transport_error)?;
        Ok(Some(body))
    }

    async fn error_for(
        &self,
        operation: Operation,
        response: Response,
        expected: Option<&VersionToken>,
    ) -> SyncError {
        let status = response.status();
        let rate_limited = is_rate_limited(response.headers());
        let message = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.message)
            .unwrap_or_default();
        classify_failure(operation, status, rate_limited, &message, &self.path, expected)
    }
}

/// `{api_base}/repos/{owner}/{repo}/contents/{path}` with each segment escaped.
pub fn contents_url(api_base: &str, owner: &str, repo: &str, path: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(api_base)
        .map_err(|e| SyncError::ConfigError(format!("Invalid API base URL {}: {}", api_base, e)))?;
    url.path_segments_mut()
        .map_err(|_| SyncError::ConfigError(format!("API base URL cannot be a base: {}", api_base)))?
        .pop_if_empty()
        .extend(["repos", owner, repo, "contents"])
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

fn is_rate_limited(headers: &HeaderMap) -> bool {
    let exhausted = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim() == "0")
        .unwrap_or(false);
    exhausted || headers.contains_key("retry-after")
}

/// Map a non-success status onto the error taxonomy.
pub fn classify_failure(
    operation: Operation,
    status: StatusCode,
    rate_limited: bool,
    message: &str,
    path: &str,
    expected: Option<&VersionToken>,
) -> SyncError {
    let detail = if message.is_empty() {
        status.to_string()
    } else {
        format!("{} ({})", status, message)
    };

    match (status.as_u16(), operation) {
        (409, Operation::Update) => SyncError::VersionConflict {
            path: path.to_string(),
            expected: expected.map(|t| t.to_string()).unwrap_or_default(),
        },
        (409, Operation::Create) | (422, Operation::Create) => {
            SyncError::AlreadyExists(path.to_string())
        }
        (401, _) => SyncError::PermanentStore(format!("Bad credentials: {}", detail)),
        (429, _) => SyncError::TransientStore(format!("Rate limited: {}", detail)),
        (403, _) if rate_limited => SyncError::TransientStore(format!("Rate limited: {}", detail)),
        (403, _) => SyncError::PermanentStore(format!("Access denied: {}", detail)),
        (404, _) => SyncError::PermanentStore(format!(
            "Repository or branch not found: {}",
            detail
        )),
        (413, _) => SyncError::PermanentStore(format!("Payload too large: {}", detail)),
        (408, _) => SyncError::TransientStore(format!("Request timeout: {}", detail)),
        (code, _) if (500..=599).contains(&code) => {
            SyncError::TransientStore(format!("Server error: {}", detail))
        }
        _ => SyncError::PermanentStore(format!("Unexpected response: {}", detail)),
    }
}

/// Network-level failures are retryable; malformed requests and bodies are not.
fn transport_error(err: reqwest::Error) -> SyncError {
    if err.is_builder() {
        SyncError::PermanentStore(format!("Invalid request: {}", err))
    } else if err.is_decode() {
        SyncError::PermanentStore(format!("Unreadable response body: {}", err))
    } else if err.is_timeout() {
        SyncError::TransientStore(format!("Request timed out: {}", err))
    } else {
        SyncError::TransientStore(format!("Request failed: {}", err))
    }
}

/// Check that a contents API body describes a single file and read its
/// metadata. The body content itself is not required.
fn parse_file_metadata(path: &str, body: Value) -> Result<ContentResponse, SyncError> {
    if body.is_array() {
        return Err(SyncError::PermanentStore(format!(
            "Target path is a directory, not a file: {}",
            path
        )));
    }
    let content: ContentResponse = serde_json::from_value(body).map_err(|e| {
        SyncError::PermanentStore(format!("Unexpected contents response for {}: {}", path, e))
    })?;
    if content.kind != "file" {
        return Err(SyncError::PermanentStore(format!(
            "Target path is a {}, not a file: {}",
            content.kind, path
        )));
    }
    Ok(content)
}

/// Decode a contents API body into the file bytes and blob sha.
fn parse_content(path: &str, body: Value) -> Result<RemoteBlob, SyncError> {
    let content = parse_file_metadata(path, body)?;
    let encoded = match (content.encoding.as_deref(), content.content) {
        (Some("none"), _) | (_, None) => {
            return Err(SyncError::PermanentStore(format!(
                "File {} ({} bytes) is too large for the contents API",
                path, content.size
            )))
        }
        (_, Some(encoded)) => encoded,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).map_err(|e| {
        SyncError::PermanentStore(format!("Invalid base64 content for {}: {}", path, e))
    })?;

    Ok(RemoteBlob {
        bytes,
        version: VersionToken::new(content.sha),
    })
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    fn describe(&self) -> String {
        match &self.branch {
            Some(branch) => format!("github:{}/{}/{}@{}", self.owner, self.repo, self.path, branch),
            None => format!("github:{}/{}/{}", self.owner, self.repo, self.path),
        }
    }

    async fn fetch(&self) -> Result<Option<RemoteBlob>, SyncError> {
        match self.get_contents().await? {
            Some(body) => parse_content(&self.path, body).map(Some),
            None => Ok(None),
        }
    }

    /// The sha is present even when the file is too large to be inlined.
    async fn fetch_version(&self) -> Result<Option<VersionToken>, SyncError> {
        match self.get_contents().await? {
            Some(body) => {
                let metadata = parse_file_metadata(&self.path, body)?;
                Ok(Some(VersionToken::new(metadata.sha)))
            }
            None => Ok(None),
        }
    }

    async fn put(
        &self,
        bytes: &[u8],
        expected: Option<&VersionToken>,
    ) -> Result<VersionToken, SyncError> {
        let operation = if expected.is_some() {
            Operation::Update
        } else {
            Operation::Create
        };
        let body = PutRequest {
            message: &self.commit_message,
            content: STANDARD.encode(bytes),
            sha: expected.map(VersionToken::as_str),
            branch: self.branch.as_deref(),
        };

        debug!(url = %self.url, ?operation, bytes = bytes.len(), "PUT remote content");
        let response = self
            .client
            .put(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let err = self.error_for(operation, response, expected).await;
            if err.is_conflict() {
                warn!(path = %self.path, error = %err, "Remote write rejected");
            }
            return Err(err);
        }

        let written: PutResponse = response.json().await.map_err(transport_error)?;
        Ok(VersionToken::new(written.content.sha))
    }
}
