//! Structured metadata carried in the model card header.

use serde::{Deserialize, Serialize};

/// Task of an evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Dataset (environment) of an evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One reported metric, e.g. `mean_reward = "245.3 +/- 12.0"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalResult {
    pub task: TaskRef,
    pub dataset: DatasetRef,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelIndexEntry {
    pub name: String,
    pub results: Vec<EvalResult>,
}

/// Card header metadata, serialized between the `---` fences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardData {
    pub language: String,
    pub license: String,
    pub library_name: String,
    pub benchmark_name: String,
    pub task_name: String,
    pub tags: Vec<String>,
    pub pipeline_tag: String,
    #[serde(rename = "model-index")]
    pub model_index: Vec<ModelIndexEntry>,
}

pub const PIPELINE_TAG: &str = "reinforcement-learning";

impl CardData {
    /// Header for an agent evaluated on `env_name`/`task_name`.
    pub fn for_agent(
        options: &super::CardOptions,
        env_name: &str,
        task_name: &str,
        algo_name: &str,
        mean_reward: &str,
    ) -> Self {
        let dataset = format!("{}-{}", env_name, task_name);
        CardData {
            language: options.language.clone(),
            license: options.license.clone(),
            library_name: options.library_name.clone(),
            benchmark_name: env_name.to_string(),
            task_name: task_name.to_string(),
            tags: vec![
                "deep-reinforcement-learning".to_string(),
                "reinforcement-learning".to_string(),
                options.library_tag.clone(),
                task_name.to_string(),
            ],
            pipeline_tag: PIPELINE_TAG.to_string(),
            model_index: vec![ModelIndexEntry {
                name: algo_name.to_string(),
                results: vec![EvalResult {
                    task: TaskRef {
                        name: PIPELINE_TAG.to_string(),
                        kind: PIPELINE_TAG.to_string(),
                    },
                    dataset: DatasetRef {
                        name: dataset.clone(),
                        kind: dataset,
                    },
                    metrics: vec![Metric {
                        name: "mean_reward".to_string(),
                        value: mean_reward.to_string(),
                        kind: "mean_reward".to_string(),
                    }],
                }],
            }],
        }
    }

    /// The `mean_reward` metric of the first result, if present.
    pub fn mean_reward(&self) -> Option<&str> {
        self.model_index
            .first()?
            .results
            .first()?
            .metrics
            .iter()
            .find(|m| m.name == "mean_reward")
            .map(|m| m.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardOptions;

    #[test]
    fn test_for_agent_shape() {
        let data = CardData::for_agent(
            &CardOptions::default(),
            "OpenAI/Gym/Box2d",
            "LunarLander-v2",
            "PPO",
            "245.35 +/- 12.0",
        );

        assert_eq!(data.license, "apache-2.0");
        assert_eq!(data.language, "en");
        assert_eq!(data.tags.last().map(String::as_str), Some("LunarLander-v2"));
        assert_eq!(data.model_index[0].name, "PPO");
        assert_eq!(
            data.model_index[0].results[0].dataset.name,
            "OpenAI/Gym/Box2d-LunarLander-v2"
        );
        assert_eq!(data.mean_reward(), Some("245.35 +/- 12.0"));
    }

    #[test]
    fn test_serialized_keys() {
        let data = CardData::for_agent(&CardOptions::default(), "env", "task", "DQN", "1.0 +/- 0.0");
        let raw = serde_json::to_value(&data).unwrap();

        assert!(raw.get("model-index").is_some());
        assert!(raw.get("model_index").is_none());
        assert_eq!(raw["model-index"][0]["results"][0]["task"]["type"], "reinforcement-learning");
        assert_eq!(raw["pipeline_tag"], "reinforcement-learning");
    }
}
