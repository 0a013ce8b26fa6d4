//! Hub trait definitions
//!
//! `ModelHub` is the narrow contract the push/pull workflows rely on:
//! - `create_repo`: create a fresh model repository
//! - `upload_file`: write one file into a repository
//! - `download_file`: fetch one file into a local directory
//!
//! `HttpHub` talks to a Hugging Face compatible endpoint; `fakes::MemoryHub`
//! keeps everything in memory for tests.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HubError;

/// Result type for hub operations
pub type HubResult<T> = std::result::Result<T, HubError>;

// ---------------------------------------------------------------------------
// RepoId
// ---------------------------------------------------------------------------

/// Repository identifier, `namespace/name` or a bare `name`.
///
/// Validated on construction: at most one `/`, non-empty segments made of
/// ASCII alphanumerics, `-`, `_` and `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId(String);

impl RepoId {
    pub fn parse(id: &str) -> HubResult<Self> {
        let segments: Vec<&str> = id.split('/').collect();
        if segments.len() > 2 {
            return Err(HubError::InvalidRepoId(id.to_string()));
        }
        for segment in &segments {
            let valid = !segment.is_empty()
                && !segment.starts_with('.')
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
            if !valid {
                return Err(HubError::InvalidRepoId(id.to_string()));
            }
        }
        Ok(RepoId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Owning user or organization, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.0.split_once('/').map(|(ns, _)| ns)
    }

    /// Repository name without the namespace.
    pub fn name(&self) -> &str {
        match self.0.split_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = HubError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        RepoId::parse(&s)
    }
}

impl From<RepoId> for String {
    fn from(id: RepoId) -> Self {
        id.0
    }
}

impl std::str::FromStr for RepoId {
    type Err = HubError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RepoId::parse(s)
    }
}

impl std::fmt::Display for RepoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// UploadSource
// ---------------------------------------------------------------------------

/// Content of a file to upload: a local file or an in-memory buffer.
#[derive(Debug, Clone)]
pub enum UploadSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl UploadSource {
    /// Load the full content to be sent.
    pub async fn read(&self) -> HubResult<Vec<u8>> {
        match self {
            UploadSource::Path(path) => Ok(tokio::fs::read(path).await?),
            UploadSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

impl From<PathBuf> for UploadSource {
    fn from(path: PathBuf) -> Self {
        UploadSource::Path(path)
    }
}

impl From<Vec<u8>> for UploadSource {
    fn from(bytes: Vec<u8>) -> Self {
        UploadSource::Bytes(bytes)
    }
}

// ---------------------------------------------------------------------------
// ModelHub
// ---------------------------------------------------------------------------

/// Remote model repository service.
///
/// Guarantees:
/// - `create_repo` fails with `HubError::Conflict` when the repository exists.
/// - `upload_file` returns the URL of the written file; writing the same path
///   twice replaces the content.
/// - `download_file` writes `<dest_dir>/<filename>` and returns that path, or
///   fails with `HubError::NotFound`.
#[async_trait]
pub trait ModelHub: Send + Sync {
    /// Create a model repository, returning its URL.
    async fn create_repo(&self, repo_id: &RepoId, private: bool) -> HubResult<String>;

    /// Upload one file to `path_in_repo`, returning the file URL.
    async fn upload_file(
        &self,
        repo_id: &RepoId,
        path_in_repo: &str,
        source: &UploadSource,
    ) -> HubResult<String>;

    /// Download `filename` from the repository into `dest_dir`.
    async fn download_file(
        &self,
        repo_id: &RepoId,
        filename: &str,
        dest_dir: &Path,
    ) -> HubResult<PathBuf>;
}

/// Destination of a downloaded file, creating parent directories as needed.
pub(crate) async fn prepare_destination(dest_dir: &Path, filename: &str) -> HubResult<PathBuf> {
    let dest = dest_dir.join(filename);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(dest)
}
