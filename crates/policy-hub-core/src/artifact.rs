//! Artifacts staged for a push and their receipts.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::Result;

/// SHA-256 of an artifact's bytes, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(String);

impl ContentDigest {
    pub fn from_bytes(data: &[u8]) -> Self {
        ContentDigest(hex::encode(Sha256::digest(data)))
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let data = tokio::fs::read(path).await?;
        Ok(Self::from_bytes(&data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars.
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a pushed file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Weights,
    Replay,
    Config,
    ModelCard,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Weights => "weights",
            ArtifactKind::Replay => "replay",
            ArtifactKind::Config => "config",
            ArtifactKind::ModelCard => "model_card",
        }
    }
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A local file waiting to be uploaded.
#[derive(Debug, Clone)]
pub struct StagedArtifact {
    pub kind: ArtifactKind,
    pub local_path: PathBuf,
    pub path_in_repo: String,
    pub digest: ContentDigest,
    pub size_bytes: u64,
}

impl StagedArtifact {
    /// Hash and measure `local_path`.
    pub async fn stage(
        kind: ArtifactKind,
        local_path: impl Into<PathBuf>,
        path_in_repo: impl Into<String>,
    ) -> Result<Self> {
        let local_path = local_path.into();
        let data = tokio::fs::read(&local_path).await?;
        let staged = StagedArtifact {
            kind,
            path_in_repo: path_in_repo.into(),
            digest: ContentDigest::from_bytes(&data),
            size_bytes: data.len() as u64,
            local_path,
        };
        crate::obs::emit_artifact_staged(kind.as_str(), &staged.path_in_repo, staged.size_bytes);
        Ok(staged)
    }

    /// Receipt for this artifact once the hub accepted it.
    pub fn uploaded(self, url: String, attempts: u32) -> UploadedArtifact {
        UploadedArtifact {
            kind: self.kind,
            path_in_repo: self.path_in_repo,
            url,
            digest: self.digest,
            size_bytes: self.size_bytes,
            attempts,
        }
    }
}

/// A file accepted by the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedArtifact {
    pub kind: ArtifactKind,
    pub path_in_repo: String,
    pub url: String,
    pub digest: ContentDigest,
    pub size_bytes: u64,
    pub attempts: u32,
}
