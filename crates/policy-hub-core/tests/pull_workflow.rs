//! Import tests: what a push stores, a pull returns.

use std::path::Path;

use hub_client::fakes::MemoryHub;
use hub_client::{HubError, ModelHub, RepoId};
use policy_hub_core::fakes::ScriptedAgent;
use policy_hub_core::{
    pull_model_from_hub, pull_model_with_options, push_model_to_hub, PolicyConfig,
    PolicyHubError, PullOptions, PushRequest, RepoLayout, Tensor, WeightsMapping,
};
use serde_json::json;

fn repo() -> RepoId {
    RepoId::parse("OpenDILabCommunity/CartPole-v0-DQN").unwrap()
}

fn weights() -> WeightsMapping {
    WeightsMapping::new()
        .with(
            "encoder.weight",
            Tensor::new(vec![2, 3], vec![0.1, -0.2, 0.3, 1.5, -2.25, 1e-7]).unwrap(),
        )
        .with("head.bias", Tensor::from_values(vec![0.0, 1.0]))
}

fn config() -> PolicyConfig {
    PolicyConfig::from_value(json!({
        "exp_config": {
            "env": { "env_id": "CartPole-v0", "stop_value": 195 },
            "policy": {
                "discount_factor": 0.97,
                "nstep": 3,
                "model": { "encoder_hidden_size_list": [128, 128, 64] }
            }
        }
    }))
    .unwrap()
}

/// Hub holding a valid weights file and a valid config.
async fn seeded_hub() -> MemoryHub {
    let hub = MemoryHub::new().with_repo(&repo());
    hub.upload_file(&repo(), "model.safetensors", &weights().to_safetensors().unwrap().into())
        .await
        .unwrap();
    hub.upload_file(&repo(), "policy_config.json", &config().to_text().unwrap().into_bytes().into())
        .await
        .unwrap();
    hub
}

fn is_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn pull_returns_what_push_stored() {
    let hub = MemoryHub::new();
    let agent = ScriptedAgent::new()
        .with_state_dict(weights())
        .with_config(config())
        .with_video("episode.mp4")
        .with_eval(195.0, 0.0);
    let request = PushRequest::new(repo(), "OpenAI/Gym/ClassicControl", "CartPole-v0", "DQN", "");

    push_model_to_hub(&hub, &agent, &request).await.unwrap();
    let (pulled_weights, pulled_config) = pull_model_from_hub(&hub, &repo()).await.unwrap();

    assert_eq!(pulled_weights, weights());
    assert_eq!(pulled_config, config());
}

#[tokio::test]
async fn pull_with_custom_layout() {
    let hub = MemoryHub::new().with_repo(&repo());
    let layout = RepoLayout {
        weights_file: "ckpt/best.safetensors".to_string(),
        config_file: "cfg.json".to_string(),
        ..RepoLayout::default()
    };
    hub.upload_file(&repo(), "ckpt/best.safetensors", &weights().to_safetensors().unwrap().into())
        .await
        .unwrap();
    hub.upload_file(&repo(), "cfg.json", &config().to_text().unwrap().into_bytes().into())
        .await
        .unwrap();

    let options = PullOptions::default().with_layout(layout);
    let (w, c) = pull_model_with_options(&hub, &repo(), &options).await.unwrap();

    assert_eq!(w, weights());
    assert_eq!(c, config());
}

#[tokio::test]
async fn pull_missing_file_is_not_found() {
    let hub = MemoryHub::new().with_repo(&repo());
    hub.upload_file(&repo(), "model.safetensors", &weights().to_safetensors().unwrap().into())
        .await
        .unwrap();

    let err = pull_model_from_hub(&hub, &repo()).await.unwrap_err();

    assert!(matches!(err, PolicyHubError::Hub(HubError::NotFound(_))));
}

#[tokio::test]
async fn pull_does_not_retry() {
    let hub = seeded_hub().await;
    hub.fail_next_downloads(1);

    let err = pull_model_from_hub(&hub, &repo()).await.unwrap_err();
    assert!(matches!(err, PolicyHubError::Hub(HubError::Status { status: 503, .. })));

    assert!(pull_model_from_hub(&hub, &repo()).await.is_ok());
}

#[tokio::test]
async fn pull_rejects_corrupt_weights() {
    let hub = MemoryHub::new().with_repo(&repo());
    hub.upload_file(&repo(), "model.safetensors", &b"not a tensor file".to_vec().into())
        .await
        .unwrap();
    hub.upload_file(&repo(), "policy_config.json", &b"{}".to_vec().into())
        .await
        .unwrap();

    let err = pull_model_from_hub(&hub, &repo()).await.unwrap_err();
    assert!(matches!(err, PolicyHubError::Weights(_)));
}

// ---------------------------------------------------------------------------
// Scratch directory lifetime
// ---------------------------------------------------------------------------

#[tokio::test]
async fn pull_scratch_removed_after_success() {
    let hub = seeded_hub().await;
    let scratch = tempfile::tempdir().unwrap();
    let options = PullOptions::default().with_scratch_root(scratch.path());

    let (w, _) = pull_model_with_options(&hub, &repo(), &options).await.unwrap();

    assert_eq!(w, weights());
    assert!(is_empty_dir(scratch.path()));
}

#[tokio::test]
async fn pull_scratch_removed_after_missing_file() {
    let hub = MemoryHub::new().with_repo(&repo());
    hub.upload_file(&repo(), "model.safetensors", &weights().to_safetensors().unwrap().into())
        .await
        .unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let options = PullOptions::default().with_scratch_root(scratch.path());

    let err = pull_model_with_options(&hub, &repo(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, PolicyHubError::Hub(HubError::NotFound(_))));
    assert!(is_empty_dir(scratch.path()));
}

#[tokio::test]
async fn pull_scratch_removed_after_corrupt_weights() {
    let hub = MemoryHub::new().with_repo(&repo());
    hub.upload_file(&repo(), "model.safetensors", &b"not a tensor file".to_vec().into())
        .await
        .unwrap();
    hub.upload_file(&repo(), "policy_config.json", &b"{}".to_vec().into())
        .await
        .unwrap();
    let scratch = tempfile::tempdir().unwrap();
    let options = PullOptions::default().with_scratch_root(scratch.path());

    let err = pull_model_with_options(&hub, &repo(), &options)
        .await
        .unwrap_err();

    assert!(matches!(err, PolicyHubError::Weights(_)));
    assert!(is_empty_dir(scratch.path()));
}

#[tokio::test]
async fn pull_scratch_removed_after_download_failure() {
    let hub = seeded_hub().await;
    hub.fail_next_downloads(1);
    let scratch = tempfile::tempdir().unwrap();
    let options = PullOptions::default().with_scratch_root(scratch.path());

    pull_model_with_options(&hub, &repo(), &options)
        .await
        .unwrap_err();

    assert!(is_empty_dir(scratch.path()));
}
