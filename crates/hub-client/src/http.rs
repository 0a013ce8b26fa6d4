//! HTTP model hub client
//!
//! Talks to a Hugging Face compatible hub: repository creation through
//! `/api/repos/create`, uploads as single-file NDJSON commits, downloads
//! through the `resolve` endpoint.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::HubError;
use crate::hub_traits::{prepare_destination, HubResult, ModelHub, RepoId, UploadSource};

/// Default public hub endpoint
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Hub configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Hub base URL
    pub endpoint: String,
    /// Access token (required for create/upload, optional for public downloads)
    pub token: Option<String>,
    /// Branch that uploads commit to and downloads resolve from
    pub revision: String,
    /// User agent sent with every request
    pub user_agent: String,
    /// Per-request timeout; transport default when unset
    pub timeout_secs: Option<u64>,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            endpoint: std::env::var("HF_ENDPOINT").unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            token: std::env::var("HF_TOKEN")
                .or_else(|_| std::env::var("HUGGING_FACE_HUB_TOKEN"))
                .ok(),
            revision: "main".to_string(),
            user_agent: format!("policy-hub/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: None,
        }
    }
}

impl HubConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific endpoint
    pub fn new(endpoint: &str) -> Self {
        HubConfig {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: None,
            ..Self::default()
        }
    }

    /// Set authentication token
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn base(&self) -> &str {
        self.endpoint.trim_end_matches('/')
    }

    /// URL of the repository landing page.
    pub fn repo_url(&self, repo_id: &RepoId) -> String {
        format!("{}/{}", self.base(), repo_id)
    }

    /// URL under which an uploaded file is browsable.
    pub fn file_url(&self, repo_id: &RepoId, path_in_repo: &str) -> String {
        format!(
            "{}/{}/blob/{}/{}",
            self.base(),
            repo_id,
            self.revision,
            path_in_repo
        )
    }

    /// URL serving the raw content of a file.
    pub fn resolve_url(&self, repo_id: &RepoId, filename: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.base(),
            repo_id,
            self.revision,
            filename
        )
    }

    fn create_url(&self) -> String {
        format!("{}/api/repos/create", self.base())
    }

    fn commit_url(&self, repo_id: &RepoId) -> String {
        format!(
            "{}/api/models/{}/commit/{}",
            self.base(),
            repo_id,
            self.revision
        )
    }
}

/// Build the NDJSON body of a commit that writes a single file.
pub fn commit_payload(path_in_repo: &str, content: &[u8], summary: &str) -> HubResult<String> {
    let header = json!({
        "key": "header",
        "value": { "summary": summary, "description": "" },
    });
    let file = json!({
        "key": "file",
        "value": {
            "content": base64::engine::general_purpose::STANDARD.encode(content),
            "path": path_in_repo,
            "encoding": "base64",
        },
    });
    Ok(format!(
        "{}\n{}\n",
        serde_json::to_string(&header)?,
        serde_json::to_string(&file)?
    ))
}

/// Hub client over HTTP
///
/// Each upload is one commit carrying the file inline as base64. There is
/// no LFS pre-upload, so hubs whose `.gitattributes` track `*.safetensors`
/// or `*.mp4` through LFS may reject large weights or replays.
pub struct HttpHub {
    config: HubConfig,
    http_client: reqwest::Client,
}

impl HttpHub {
    /// Create a new hub client
    pub fn new(config: HubConfig) -> HubResult<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build()?;

        Ok(HttpHub {
            config,
            http_client,
        })
    }

    /// Create client from environment variables
    pub fn from_env() -> HubResult<Self> {
        Self::new(HubConfig::from_env())
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Map a non-success response onto the hub error taxonomy.
async fn check_status(response: reqwest::Response, what: &str) -> HubResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status.as_u16(), body, what))
}

/// Error for a non-success status; `what` names the repository or file.
pub(crate) fn status_error(status: u16, body: String, what: &str) -> HubError {
    match status {
        401 | 403 => HubError::Unauthorized(format!("{}: {}", what, body)),
        404 => HubError::NotFound(what.to_string()),
        409 => HubError::Conflict(what.to_string()),
        code => HubError::Status { status: code, body },
    }
}

#[async_trait]
impl ModelHub for HttpHub {
    async fn create_repo(&self, repo_id: &RepoId, private: bool) -> HubResult<String> {
        info!("Creating repository {}", repo_id);

        let body = json!({
            "name": repo_id.name(),
            "organization": repo_id.namespace(),
            "private": private,
            "type": "model",
        });
        let response = self
            .authorized(self.http_client.post(self.config.create_url()))
            .json(&body)
            .send()
            .await?;
        let response = check_status(response, repo_id.as_str()).await?;

        #[derive(Deserialize)]
        struct CreateResponse {
            url: Option<String>,
        }

        let created: CreateResponse = response.json().await.unwrap_or(CreateResponse { url: None });
        Ok(created
            .url
            .unwrap_or_else(|| self.config.repo_url(repo_id)))
    }

    async fn upload_file(
        &self,
        repo_id: &RepoId,
        path_in_repo: &str,
        source: &UploadSource,
    ) -> HubResult<String> {
        let content = source.read().await?;
        debug!(
            "Uploading {} ({} bytes) to {}",
            path_in_repo,
            content.len(),
            repo_id
        );

        let summary = format!("Upload {} with policy-hub", path_in_repo);
        let payload = commit_payload(path_in_repo, &content, &summary)?;
        let response = self
            .authorized(self.http_client.post(self.config.commit_url(repo_id)))
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(payload)
            .send()
            .await?;
        check_status(response, &format!("{}/{}", repo_id, path_in_repo)).await?;

        Ok(self.config.file_url(repo_id, path_in_repo))
    }

    async fn download_file(
        &self,
        repo_id: &RepoId,
        filename: &str,
        dest_dir: &Path,
    ) -> HubResult<PathBuf> {
        debug!("Downloading {} from {}", filename, repo_id);

        let response = self
            .authorized(self.http_client.get(self.config.resolve_url(repo_id, filename)))
            .send()
            .await?;
        let response = check_status(response, &format!("{}/{}", repo_id, filename)).await?;
        let bytes = response.bytes().await?;

        let dest = prepare_destination(dest_dir, filename).await?;
        tokio::fs::write(&dest, &bytes).await?;
        Ok(dest)
    }
}
