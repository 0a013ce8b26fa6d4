//! The agent capability the export workflow depends on.
//!
//! Any training framework object can be pushed once it is wrapped in an
//! adapter implementing [`Agent`]: expose weights and configuration, render
//! one evaluation episode to a video directory, and evaluate.

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::PolicyConfig;
use crate::error::{PolicyHubError, Result};
use crate::weights::WeightsMapping;

/// Return of an evaluation: mean episode reward and its standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalReturn {
    pub eval_value: f64,
    pub eval_value_std: f64,
}

/// A trained policy plus the code to run and evaluate it.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Weights of the deployed policy, if the policy exposes them.
    fn state_dict(&self) -> Option<WeightsMapping>;

    /// Weights of the learner-side policy; consulted when `state_dict` is absent.
    fn learn_state_dict(&self) -> Option<WeightsMapping> {
        None
    }

    /// Configuration the agent was built with.
    fn config(&self) -> Option<PolicyConfig>;

    /// Run one evaluation episode, recording video file(s) into `replay_dir`.
    async fn deploy(&self, replay_dir: &Path) -> anyhow::Result<EvalReturn>;

    /// Evaluate over a batch of episodes.
    async fn batch_evaluate(&self) -> anyhow::Result<EvalReturn>;
}

/// Pull the policy weights out of an agent.
pub fn extract_weights(agent: &dyn Agent) -> Result<WeightsMapping> {
    agent
        .state_dict()
        .or_else(|| agent.learn_state_dict())
        .ok_or_else(|| {
            PolicyHubError::UnsupportedAgent("no state_dict available for this policy".to_string())
        })
}

/// Pull the configuration out of an agent.
pub fn extract_config(agent: &dyn Agent) -> Result<PolicyConfig> {
    agent.config().ok_or_else(|| {
        PolicyHubError::UnsupportedAgent("agent does not expose its configuration".to_string())
    })
}

/// `"<mean> +/- <std>"` with both values rounded to two decimals.
pub fn format_mean_reward(eval: &EvalReturn) -> String {
    format!(
        "{} +/- {}",
        crate::weights::format_rounded(eval.eval_value),
        crate::weights::format_rounded(eval.eval_value_std)
    )
}
