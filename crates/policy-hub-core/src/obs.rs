//! Structured observability hooks for push/pull workflows.
//!
//! This module provides:
//! - Repository-scoped tracing spans for one push or pull
//! - Emission functions for workflow milestones: start, staged artifact,
//!   upload attempt failure, upload, finish
//!
//! Milestones are emitted at `info!`, per-file staging at `debug!`, failed
//! upload attempts at `warn!`.

use tracing::{debug, info, warn, Span};

/// Span covering one push, tagged with the repository id.
///
/// Attach it to the workflow future with [`tracing::Instrument`] so every
/// event below carries `repo_id`.
pub fn push_span(repo_id: &str) -> Span {
    tracing::info_span!("policy_hub.push", repo_id = %repo_id)
}

/// Span covering one pull.
pub fn pull_span(repo_id: &str) -> Span {
    tracing::info_span!("policy_hub.pull", repo_id = %repo_id)
}

/// Emit event: push started for an algorithm on an environment task.
pub fn emit_push_started(repo_id: &str, env_name: &str, task_name: &str, algo_name: &str) {
    info!(
        event = "push.started",
        repo_id = %repo_id,
        env_name = %env_name,
        task_name = %task_name,
        algo_name = %algo_name,
    );
}

/// Emit event: an artifact was written to the scratch directory.
pub fn emit_artifact_staged(kind: &str, file_name: &str, size_bytes: u64) {
    debug!(
        event = "push.artifact_staged",
        kind = %kind,
        file = %file_name,
        size_bytes = size_bytes,
    );
}

/// Emit event: one upload attempt failed (warn level).
pub fn emit_upload_attempt_failed(path_in_repo: &str, attempt: u32, error: &dyn std::fmt::Display) {
    warn!(
        event = "push.upload_attempt_failed",
        path = %path_in_repo,
        attempt = attempt,
        error = %error,
    );
}

/// Emit event: a file landed on the hub.
pub fn emit_artifact_uploaded(path_in_repo: &str, attempts: u32, url: &str) {
    info!(
        event = "push.artifact_uploaded",
        path = %path_in_repo,
        attempts = attempts,
        url = %url,
    );
}

/// Emit event: push finished with artifact count and duration.
pub fn emit_push_finished(repo_id: &str, artifacts: usize, duration_ms: u64, success: bool) {
    info!(
        event = "push.finished",
        repo_id = %repo_id,
        artifacts = artifacts,
        duration_ms = duration_ms,
        success = success,
    );
}

/// Emit event: push aborted (warn level).
pub fn emit_push_failed(repo_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "push.failed", repo_id = %repo_id, error = %error);
}

/// Emit event: weights and configuration pulled from the hub.
pub fn emit_pull_finished(repo_id: &str, tensors: usize, config_keys: usize) {
    info!(
        event = "pull.finished",
        repo_id = %repo_id,
        tensors = tensors,
        config_keys = config_keys,
    );
}
