//! Bounded, sequential retry around single hub writes.
//!
//! Uploads are retried immediately (no backoff) up to
//! [`MAX_UPLOAD_ATTEMPTS`] attempts in total. Running out of attempts is
//! terminal for the whole push.

use std::future::Future;

use hub_client::{HubError, ModelHub, RepoId, UploadSource};

use crate::error::{PolicyHubError, Result};
use crate::obs;

/// Total attempts per uploaded file.
pub const MAX_UPLOAD_ATTEMPTS: u32 = 5;

/// Every attempt failed; `last` is the final error.
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

/// Run `op` until it succeeds or `max_attempts` attempts have failed.
///
/// `op` receives the 1-based attempt number. On success returns the value
/// and the number of attempts used. `max_attempts` of zero runs once.
pub async fn retry_sequential<T, E, F, Fut>(
    max_attempts: u32,
    mut op: F,
) -> std::result::Result<(T, u32), RetryExhausted<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(last) if attempt >= max_attempts => {
                return Err(RetryExhausted {
                    attempts: attempt,
                    last,
                })
            }
            Err(_) => attempt += 1,
        }
    }
}

/// Upload one file, retrying transient failures. Returns the file URL and
/// the number of attempts it took.
pub async fn upload_with_retry(
    hub: &dyn ModelHub,
    repo_id: &RepoId,
    path_in_repo: &str,
    source: &UploadSource,
) -> Result<(String, u32)> {
    let outcome = retry_sequential(MAX_UPLOAD_ATTEMPTS, |attempt| async move {
        let result = hub.upload_file(repo_id, path_in_repo, source).await;
        if let Err(err) = &result {
            obs::emit_upload_attempt_failed(path_in_repo, attempt, err);
        }
        result
    })
    .await;

    match outcome {
        Ok((url, attempts)) => {
            obs::emit_artifact_uploaded(path_in_repo, attempts, &url);
            Ok((url, attempts))
        }
        Err(RetryExhausted { attempts, last }) => Err(upload_failed(path_in_repo, attempts, last)),
    }
}

fn upload_failed(path_in_repo: &str, attempts: u32, source: HubError) -> PolicyHubError {
    PolicyHubError::UploadFailed {
        path: path_in_repo.to_string(),
        attempts,
        source,
    }
}
