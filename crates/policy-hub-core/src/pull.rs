//! Import workflow: fetch weights and configuration back from the hub.

use std::path::PathBuf;

use hub_client::{ModelHub, RepoId};
use tracing::Instrument;

use crate::config::{load_config, PolicyConfig};
use crate::error::Result;
use crate::obs;
use crate::push::{scratch_dir, RepoLayout};
use crate::weights::{load_weights, WeightsMapping};

/// Knobs for one import.
#[derive(Debug, Clone, Default)]
pub struct PullOptions {
    pub layout: RepoLayout,
    /// Parent of the scratch directory; the system temp dir when unset.
    pub scratch_root: Option<PathBuf>,
}

impl PullOptions {
    pub fn with_layout(mut self, layout: RepoLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }
}

/// Download and deserialize the weights and configuration of `repo_id`,
/// using the default file names.
pub async fn pull_model_from_hub(
    hub: &dyn ModelHub,
    repo_id: &RepoId,
) -> Result<(WeightsMapping, PolicyConfig)> {
    pull_model_with_options(hub, repo_id, &PullOptions::default()).await
}

/// Like [`pull_model_from_hub`] with custom remote file names or scratch
/// location. The scratch directory is removed before returning.
///
/// Failures are not retried.
pub async fn pull_model_with_options(
    hub: &dyn ModelHub,
    repo_id: &RepoId,
    options: &PullOptions,
) -> Result<(WeightsMapping, PolicyConfig)> {
    async move {
        let scratch = scratch_dir(options.scratch_root.as_deref())?;
        let layout = &options.layout;

        let weights_path = hub
            .download_file(repo_id, &layout.weights_file, scratch.path())
            .await?;
        let config_path = hub
            .download_file(repo_id, &layout.config_file, scratch.path())
            .await?;

        let weights = load_weights(&weights_path)?;
        let config = load_config(&config_path)?;
        obs::emit_pull_finished(repo_id.as_str(), weights.len(), config.as_map().len());
        Ok((weights, config))
    }
    .instrument(obs::pull_span(repo_id.as_str()))
    .await
}
