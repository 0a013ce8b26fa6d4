//! Export workflow: package a trained agent and upload it to the hub.
//!
//! Steps run strictly in order; the first failure aborts the rest. All
//! local files live in a scratch directory owned by the call, removed when
//! it returns on every path.

use std::path::{Path, PathBuf};
use std::time::Instant;

use hub_client::{ModelHub, RepoId, UploadSource};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;
use tracing::{info, Instrument};

use crate::agent::{extract_config, extract_weights, format_mean_reward, Agent};
use crate::artifact::{ArtifactKind, StagedArtifact, UploadedArtifact};
use crate::card::{
    read_snippet, render_model_card, validate_model_card, CardData, CardFields, CardOptions,
};
use crate::config::save_config;
use crate::error::{PolicyHubError, Result};
use crate::obs;
use crate::upload::upload_with_retry;
use crate::video::find_video_file;
use crate::weights::{model_size_summary, save_weights};

/// Directory under the scratch root that `Agent::deploy` renders into.
pub const REPLAY_DIR: &str = "videos";

const SCRATCH_PREFIX: &str = "policy-hub-";

/// File names of the artifacts inside the remote repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoLayout {
    pub weights_file: String,
    pub replay_file: String,
    pub config_file: String,
    pub card_file: String,
}

impl Default for RepoLayout {
    fn default() -> Self {
        Self {
            weights_file: "model.safetensors".to_string(),
            replay_file: "replay.mp4".to_string(),
            config_file: "policy_config.json".to_string(),
            card_file: "README.md".to_string(),
        }
    }
}

/// Everything one export needs besides the agent itself.
#[derive(Debug, Clone)]
pub struct PushRequest {
    pub repo_id: RepoId,
    pub env_name: String,
    pub task_name: String,
    pub algo_name: String,
    pub training_run_url: String,
    /// Create the repository (private) before uploading. Default `true`.
    pub create_repo: bool,
    /// Upload this file from the replay directory instead of guessing.
    pub replay_filename: Option<String>,
    /// Parent of the scratch directory; the system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
    pub layout: RepoLayout,
    pub card: CardOptions,
}

impl PushRequest {
    pub fn new(
        repo_id: RepoId,
        env_name: impl Into<String>,
        task_name: impl Into<String>,
        algo_name: impl Into<String>,
        training_run_url: impl Into<String>,
    ) -> Self {
        Self {
            repo_id,
            env_name: env_name.into(),
            task_name: task_name.into(),
            algo_name: algo_name.into(),
            training_run_url: training_run_url.into(),
            create_repo: true,
            replay_filename: None,
            scratch_root: None,
            layout: RepoLayout::default(),
            card: CardOptions::default(),
        }
    }

    pub fn with_create_repo(mut self, create_repo: bool) -> Self {
        self.create_repo = create_repo;
        self
    }

    pub fn with_replay_filename(mut self, name: impl Into<String>) -> Self {
        self.replay_filename = Some(name.into());
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    pub fn with_layout(mut self, layout: RepoLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_card_options(mut self, card: CardOptions) -> Self {
        self.card = card;
        self
    }

    /// Model id shown on the card: `{env}-{task}-{algo}`.
    pub fn model_id(&self) -> String {
        format!("{}-{}-{}", self.env_name, self.task_name, self.algo_name)
    }
}

/// Outcome of a successful export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushReport {
    pub repo_id: RepoId,
    /// Uploaded files, in upload order.
    pub artifacts: Vec<UploadedArtifact>,
    pub parameters_total_size: String,
    pub mean_reward: String,
    pub duration_ms: u64,
}

impl PushReport {
    pub fn artifact(&self, kind: ArtifactKind) -> Option<&UploadedArtifact> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// Upload `agent`'s weights, replay, configuration and model card.
pub async fn push_model_to_hub(
    hub: &dyn ModelHub,
    agent: &dyn Agent,
    request: &PushRequest,
) -> Result<PushReport> {
    let repo = request.repo_id.as_str();
    async move {
        let started = Instant::now();
        obs::emit_push_started(
            repo,
            &request.env_name,
            &request.task_name,
            &request.algo_name,
        );

        let outcome = run_push(hub, agent, request, started).await;
        let elapsed = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(report) => obs::emit_push_finished(repo, report.artifacts.len(), elapsed, true),
            Err(err) => {
                obs::emit_push_failed(repo, err);
                obs::emit_push_finished(repo, 0, elapsed, false);
            }
        }
        outcome
    }
    .instrument(obs::push_span(repo))
    .await
}

async fn run_push(
    hub: &dyn ModelHub,
    agent: &dyn Agent,
    request: &PushRequest,
    started: Instant,
) -> Result<PushReport> {
    let scratch = scratch_dir(request.scratch_root.as_deref())?;
    let dir = scratch.path();
    let layout = &request.layout;

    let weights = extract_weights(agent)?;
    let weights_path = staging_path(dir, &layout.weights_file)?;
    save_weights(&weights, &weights_path)?;
    let weights_file =
        StagedArtifact::stage(ArtifactKind::Weights, weights_path, &layout.weights_file).await?;

    let replay_dir = dir.join(REPLAY_DIR);
    tokio::fs::create_dir_all(&replay_dir).await?;
    agent
        .deploy(&replay_dir)
        .await
        .map_err(|e| PolicyHubError::agent("deploy", e))?;
    let video = find_video_file(&replay_dir, request.replay_filename.as_deref())?;
    info!("Selected replay {}", video.display());
    let replay_file =
        StagedArtifact::stage(ArtifactKind::Replay, video, &layout.replay_file).await?;

    let config = extract_config(agent)?;
    let config_path = staging_path(dir, &layout.config_file)?;
    let config_text = save_config(&config, &config_path)?;
    let config_file =
        StagedArtifact::stage(ArtifactKind::Config, config_path, &layout.config_file).await?;

    let usage_code = read_snippet(request.card.usage_file.as_deref());
    let train_code = read_snippet(request.card.train_file.as_deref());

    let parameters_total_size = model_size_summary(&weights);
    let eval = agent
        .batch_evaluate()
        .await
        .map_err(|e| PolicyHubError::agent("batch_evaluate", e))?;
    let mean_reward = format_mean_reward(&eval);

    if request.create_repo {
        let url = hub.create_repo(&request.repo_id, true).await?;
        info!("Created repository {}", url);
    }

    let mut artifacts = Vec::with_capacity(4);
    for staged in [weights_file, replay_file, config_file] {
        artifacts.push(upload(hub, &request.repo_id, staged).await?);
    }

    let data = CardData::for_agent(
        &request.card,
        &request.env_name,
        &request.task_name,
        &request.algo_name,
        &mean_reward,
    );
    let fields = CardFields {
        env_name: request.env_name.clone(),
        task_name: request.task_name.clone(),
        algo_name: request.algo_name.clone(),
        model_id: request.model_id(),
        mean_reward: mean_reward.clone(),
        model_description: request.card.model_description.clone(),
        platform_info: request.card.platform_info.clone(),
        installation_guide: request.card.installation_guide.clone(),
        usage_code,
        train_code,
        config_text: config_text.trim_end().to_string(),
        training_run_url: request.training_run_url.clone(),
        developers: request.card.developers.clone(),
        repo_url: request.card.repo_url.clone(),
        model_doc_url: request.card.model_doc_url.clone(),
        env_doc_url: request.card.env_doc_url.clone(),
        config_file_url: url_of(&artifacts, ArtifactKind::Config),
        video_demo_url: url_of(&artifacts, ArtifactKind::Replay),
        parameters_total_size: parameters_total_size.clone(),
        date: chrono::Utc::now().format("%Y-%m-%d").to_string(),
        tool_version: crate::VERSION.to_string(),
    };
    let card = render_model_card(request.card.template_text(), &data, &fields)?;
    validate_model_card(&card)?;

    let card_path = staging_path(dir, &layout.card_file)?;
    tokio::fs::write(&card_path, &card).await?;
    let card_file =
        StagedArtifact::stage(ArtifactKind::ModelCard, card_path, &layout.card_file).await?;
    artifacts.push(upload(hub, &request.repo_id, card_file).await?);

    Ok(PushReport {
        repo_id: request.repo_id.clone(),
        artifacts,
        parameters_total_size,
        mean_reward,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

async fn upload(
    hub: &dyn ModelHub,
    repo_id: &RepoId,
    staged: StagedArtifact,
) -> Result<UploadedArtifact> {
    let source = UploadSource::Path(staged.local_path.clone());
    let (url, attempts) = upload_with_retry(hub, repo_id, &staged.path_in_repo, &source).await?;
    Ok(staged.uploaded(url, attempts))
}

fn url_of(artifacts: &[UploadedArtifact], kind: ArtifactKind) -> String {
    artifacts
        .iter()
        .find(|a| a.kind == kind)
        .map(|a| a.url.clone())
        .unwrap_or_default()
}

pub(crate) fn scratch_dir(root: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let dir = match root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    Ok(dir)
}

/// Local path for `path_in_repo` under `dir`, with parents created.
fn staging_path(dir: &Path, path_in_repo: &str) -> Result<PathBuf> {
    let path = dir.join(path_in_repo);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let repo = RepoId::parse("org/LunarLander-v2-PPO").unwrap();
        let request = PushRequest::new(repo, "OpenAI/Gym/Box2d", "LunarLander-v2", "PPO", "");

        assert!(request.create_repo);
        assert_eq!(request.layout.weights_file, "model.safetensors");
        assert_eq!(request.layout.card_file, "README.md");
        assert_eq!(request.model_id(), "OpenAI/Gym/Box2d-LunarLander-v2-PPO");
    }

    #[test]
    fn test_layout_partial_override() {
        let layout: RepoLayout = serde_json::from_str(r#"{"replay_file": "demo.mp4"}"#).unwrap();
        assert_eq!(layout.replay_file, "demo.mp4");
        assert_eq!(layout.config_file, "policy_config.json");
    }

    #[test]
    fn test_scratch_dir_under_root() {
        let root = tempfile::tempdir().unwrap();
        let scratch = scratch_dir(Some(root.path())).unwrap();
        assert!(scratch.path().starts_with(root.path()));

        let path = scratch.path().to_path_buf();
        drop(scratch);
        assert!(!path.exists());
    }

    #[test]
    fn test_staging_path_creates_parents() {
        let root = tempfile::tempdir().unwrap();
        let path = staging_path(root.path(), "weights/model.safetensors").unwrap();
        assert!(path.parent().unwrap().is_dir());
    }
}
