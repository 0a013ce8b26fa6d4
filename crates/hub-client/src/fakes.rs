//! In-memory fake hub (testing only)
//!
//! `MemoryHub` satisfies the `ModelHub` contract without any network access
//! and exposes hooks for injecting upload/download failures and inspecting
//! what was written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::HubError;
use crate::hub_traits::{prepare_destination, HubResult, ModelHub, RepoId, UploadSource};

#[derive(Debug, Default)]
struct RepoState {
    private: bool,
    /// Files in first-upload order; re-uploads replace in place.
    files: Vec<(String, Vec<u8>)>,
}

/// In-memory hub backed by a `HashMap<repo_id, RepoState>`.
#[derive(Debug, Default)]
pub struct MemoryHub {
    repos: Mutex<HashMap<String, RepoState>>,
    failing_uploads: AtomicU32,
    upload_attempts: AtomicU32,
    failing_downloads: AtomicU32,
}

impl MemoryHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing (public) repository.
    pub fn with_repo(self, repo_id: &RepoId) -> Self {
        self.repos
            .lock()
            .unwrap()
            .insert(repo_id.to_string(), RepoState::default());
        self
    }

    /// Make the next `n` upload attempts fail with a transient error.
    pub fn fail_next_uploads(&self, n: u32) {
        self.failing_uploads.store(n, Ordering::SeqCst);
    }

    /// Make the next `n` download attempts fail with a transient error.
    pub fn fail_next_downloads(&self, n: u32) {
        self.failing_downloads.store(n, Ordering::SeqCst);
    }

    /// Upload attempts seen so far, failed ones included.
    pub fn upload_attempts(&self) -> u32 {
        self.upload_attempts.load(Ordering::SeqCst)
    }

    pub fn repo_exists(&self, repo_id: &RepoId) -> bool {
        self.repos.lock().unwrap().contains_key(repo_id.as_str())
    }

    pub fn is_private(&self, repo_id: &RepoId) -> Option<bool> {
        self.repos
            .lock()
            .unwrap()
            .get(repo_id.as_str())
            .map(|repo| repo.private)
    }

    /// Paths stored in a repository, in upload order.
    pub fn file_paths(&self, repo_id: &RepoId) -> Vec<String> {
        self.repos
            .lock()
            .unwrap()
            .get(repo_id.as_str())
            .map(|repo| repo.files.iter().map(|(path, _)| path.clone()).collect())
            .unwrap_or_default()
    }

    /// Content of one stored file.
    pub fn file(&self, repo_id: &RepoId, path_in_repo: &str) -> Option<Vec<u8>> {
        self.repos
            .lock()
            .unwrap()
            .get(repo_id.as_str())
            .and_then(|repo| {
                repo.files
                    .iter()
                    .find(|(path, _)| path == path_in_repo)
                    .map(|(_, content)| content.clone())
            })
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn file_url(repo_id: &RepoId, path_in_repo: &str) -> String {
        format!("memory://{}/blob/main/{}", repo_id, path_in_repo)
    }
}

#[async_trait]
impl ModelHub for MemoryHub {
    async fn create_repo(&self, repo_id: &RepoId, private: bool) -> HubResult<String> {
        let mut repos = self.repos.lock().unwrap();
        if repos.contains_key(repo_id.as_str()) {
            return Err(HubError::Conflict(repo_id.to_string()));
        }
        repos.insert(
            repo_id.to_string(),
            RepoState {
                private,
                files: Vec::new(),
            },
        );
        Ok(format!("memory://{}", repo_id))
    }

    async fn upload_file(
        &self,
        repo_id: &RepoId,
        path_in_repo: &str,
        source: &UploadSource,
    ) -> HubResult<String> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.failing_uploads) {
            return Err(HubError::Status {
                status: 503,
                body: "injected upload failure".to_string(),
            });
        }

        let content = source.read().await?;
        let mut repos = self.repos.lock().unwrap();
        let repo = repos
            .get_mut(repo_id.as_str())
            .ok_or_else(|| HubError::NotFound(repo_id.to_string()))?;

        match repo.files.iter_mut().find(|(path, _)| path == path_in_repo) {
            Some(entry) => entry.1 = content,
            None => repo.files.push((path_in_repo.to_string(), content)),
        }
        Ok(Self::file_url(repo_id, path_in_repo))
    }

    async fn download_file(
        &self,
        repo_id: &RepoId,
        filename: &str,
        dest_dir: &Path,
    ) -> HubResult<PathBuf> {
        if Self::take_failure(&self.failing_downloads) {
            return Err(HubError::Status {
                status: 503,
                body: "injected download failure".to_string(),
            });
        }

        let content = self
            .file(repo_id, filename)
            .ok_or_else(|| HubError::NotFound(format!("{}/{}", repo_id, filename)))?;
        let dest = prepare_destination(dest_dir, filename).await?;
        tokio::fs::write(&dest, content).await?;
        Ok(dest)
    }
}
