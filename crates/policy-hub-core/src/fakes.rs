//! Scripted agent (testing only)
//!
//! `ScriptedAgent` satisfies the `Agent` contract with canned weights,
//! configuration and evaluation results. `deploy` writes the configured
//! video files into the replay directory with strictly increasing mtimes,
//! in the order given.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, SystemTime};

use anyhow::bail;
use async_trait::async_trait;

use crate::agent::{Agent, EvalReturn};
use crate::config::PolicyConfig;
use crate::weights::WeightsMapping;

#[derive(Debug)]
pub struct ScriptedAgent {
    state_dict: Option<WeightsMapping>,
    learn_state_dict: Option<WeightsMapping>,
    config: Option<PolicyConfig>,
    videos: Vec<(String, Vec<u8>)>,
    eval: EvalReturn,
    fail_deploy: bool,
    fail_evaluate: bool,
    deploy_calls: AtomicU32,
    evaluate_calls: AtomicU32,
}

impl Default for ScriptedAgent {
    fn default() -> Self {
        Self {
            state_dict: None,
            learn_state_dict: None,
            config: None,
            videos: Vec::new(),
            eval: EvalReturn {
                eval_value: 0.0,
                eval_value_std: 0.0,
            },
            fail_deploy: false,
            fail_evaluate: false,
            deploy_calls: AtomicU32::new(0),
            evaluate_calls: AtomicU32::new(0),
        }
    }
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state_dict(mut self, weights: WeightsMapping) -> Self {
        self.state_dict = Some(weights);
        self
    }

    pub fn with_learn_state_dict(mut self, weights: WeightsMapping) -> Self {
        self.learn_state_dict = Some(weights);
        self
    }

    pub fn with_config(mut self, config: PolicyConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Add a video that `deploy` writes; content is derived from the name.
    pub fn with_video(mut self, name: &str) -> Self {
        let content = format!("video:{}", name).into_bytes();
        self.videos.push((name.to_string(), content));
        self
    }

    pub fn with_eval(mut self, eval_value: f64, eval_value_std: f64) -> Self {
        self.eval = EvalReturn {
            eval_value,
            eval_value_std,
        };
        self
    }

    pub fn failing_deploy(mut self) -> Self {
        self.fail_deploy = true;
        self
    }

    pub fn failing_evaluate(mut self) -> Self {
        self.fail_evaluate = true;
        self
    }

    pub fn deploy_calls(&self) -> u32 {
        self.deploy_calls.load(Ordering::SeqCst)
    }

    pub fn evaluate_calls(&self) -> u32 {
        self.evaluate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Agent for ScriptedAgent {
    fn state_dict(&self) -> Option<WeightsMapping> {
        self.state_dict.clone()
    }

    fn learn_state_dict(&self) -> Option<WeightsMapping> {
        self.learn_state_dict.clone()
    }

    fn config(&self) -> Option<PolicyConfig> {
        self.config.clone()
    }

    async fn deploy(&self, replay_dir: &Path) -> anyhow::Result<EvalReturn> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_deploy {
            bail!("renderer crashed");
        }

        std::fs::create_dir_all(replay_dir)?;
        let base = SystemTime::now() - Duration::from_secs(3600);
        for (i, (name, content)) in self.videos.iter().enumerate() {
            let path = replay_dir.join(name);
            std::fs::write(&path, content)?;
            let file = std::fs::File::options().write(true).open(&path)?;
            file.set_modified(base + Duration::from_secs(10 * i as u64))?;
        }
        Ok(self.eval)
    }

    async fn batch_evaluate(&self) -> anyhow::Result<EvalReturn> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_evaluate {
            bail!("evaluator unavailable");
        }
        Ok(self.eval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deploy_orders_videos_by_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ScriptedAgent::new()
            .with_video("first.mp4")
            .with_video("second.mp4");

        agent.deploy(dir.path()).await.unwrap();

        let videos = crate::video::list_videos(dir.path()).unwrap();
        let names: Vec<_> = videos
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["first.mp4", "second.mp4"]);
        assert_eq!(agent.deploy_calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let agent = ScriptedAgent::new().failing_deploy().failing_evaluate();
        assert!(agent.deploy(dir.path()).await.is_err());
        assert!(agent.batch_evaluate().await.is_err());
        assert_eq!(agent.evaluate_calls(), 1);
    }
}
