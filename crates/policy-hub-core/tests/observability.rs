//! Observability tests for push/pull tracing.
//!
//! These tests verify that structured events are emitted for the workflow
//! milestones: push start, per-artifact upload, failed attempts, finish,
//! and pull completion.

use hub_client::fakes::MemoryHub;
use hub_client::RepoId;
use policy_hub_core::fakes::ScriptedAgent;
use policy_hub_core::obs::{emit_artifact_uploaded, emit_push_failed, emit_push_started};
use policy_hub_core::{
    pull_model_from_hub, push_model_to_hub, PolicyConfig, PushRequest, Tensor, WeightsMapping,
};
use serde_json::json;
use tracing_test::traced_test;

fn repo() -> RepoId {
    RepoId::parse("OpenDILabCommunity/Hopper-v3-SAC").unwrap()
}

fn agent() -> ScriptedAgent {
    ScriptedAgent::new()
        .with_state_dict(WeightsMapping::new().with("q.weight", Tensor::zeros(vec![16, 16])))
        .with_config(PolicyConfig::from_value(json!({ "seed": 0 })).unwrap())
        .with_video("episode.mp4")
        .with_eval(3000.0, 25.5)
}

fn request() -> PushRequest {
    PushRequest::new(repo(), "OpenAI/Gym/MuJoCo", "Hopper-v3", "SAC", "")
}

#[traced_test]
#[test]
fn test_emit_push_started_logs_names() {
    emit_push_started("org/model", "OpenAI/Gym/MuJoCo", "Hopper-v3", "SAC");

    assert!(logs_contain("push.started"));
    assert!(logs_contain("Hopper-v3"));
}

#[traced_test]
#[test]
fn test_emit_artifact_uploaded_logs_attempts() {
    emit_artifact_uploaded("model.safetensors", 3, "memory://org/model/blob/main/model.safetensors");

    assert!(logs_contain("push.artifact_uploaded"));
    assert!(logs_contain("attempts=3"));
}

#[traced_test]
#[test]
fn test_emit_push_failed_logs_warning() {
    let error_msg = "upload of README.md failed after 5 attempt(s)";
    emit_push_failed("org/model", &error_msg);

    assert!(logs_contain("WARN"));
    assert!(logs_contain("push.failed"));
}

#[traced_test]
#[tokio::test]
async fn test_push_emits_lifecycle_events() {
    let hub = MemoryHub::new();

    push_model_to_hub(&hub, &agent(), &request()).await.unwrap();

    assert!(logs_contain("push.started"));
    assert!(logs_contain("push.artifact_uploaded"));
    assert!(logs_contain("push.finished"));
    assert!(logs_contain("success=true"));
    assert!(logs_contain("policy_hub.push"));
}

#[traced_test]
#[tokio::test]
async fn test_retried_upload_logs_each_failed_attempt() {
    let hub = MemoryHub::new();
    hub.fail_next_uploads(2);

    push_model_to_hub(&hub, &agent(), &request()).await.unwrap();

    assert!(logs_contain("push.upload_attempt_failed"));
    assert!(logs_contain("attempt=1"));
    assert!(logs_contain("attempt=2"));
    assert!(logs_contain("injected upload failure"));
}

#[traced_test]
#[tokio::test]
async fn test_failed_push_logs_failure() {
    let hub = MemoryHub::new().with_repo(&repo());

    push_model_to_hub(&hub, &agent(), &request())
        .await
        .unwrap_err();

    assert!(logs_contain("push.failed"));
    assert!(logs_contain("success=false"));
}

#[traced_test]
#[tokio::test]
async fn test_pull_emits_finished() {
    let hub = MemoryHub::new();
    push_model_to_hub(&hub, &agent(), &request()).await.unwrap();

    pull_model_from_hub(&hub, &repo()).await.unwrap();

    assert!(logs_contain("pull.finished"));
    assert!(logs_contain("tensors=1"));
}
