//! Model card rendering and validation.
//!
//! A card is a markdown document with a metadata header fenced by `---`
//! lines. The body is rendered from a minijinja template; the header is
//! [`CardData`] serialized as JSON.

mod data;
mod validate;

use std::path::{Path, PathBuf};

use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

pub use data::{CardData, DatasetRef, EvalResult, Metric, ModelIndexEntry, TaskRef, PIPELINE_TAG};
pub use validate::{front_matter, validate_model_card};

use crate::error::Result;

/// Template used when [`CardOptions::template`] is unset.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/model_card.md");

const TEMPLATE_NAME: &str = "model_card.md";

/// Reasons a rendered card fails the header schema.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    #[error("card has no front matter block")]
    MissingFrontMatter,

    #[error("front matter is not valid: {0}")]
    MalformedFrontMatter(#[source] serde_json::Error),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("field {field} must be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("field {0} must not be empty")]
    EmptyField(String),
}

/// Caller-tunable card content. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardOptions {
    pub license: String,
    pub language: String,
    pub library_name: String,
    /// Extra tag naming the training framework.
    pub library_tag: String,
    pub developers: String,
    pub repo_url: String,
    pub model_doc_url: String,
    pub env_doc_url: String,
    pub model_description: String,
    pub installation_guide: String,
    pub platform_info: String,
    /// Source file inlined as the usage example.
    pub usage_file: Option<PathBuf>,
    /// Source file inlined as the training example.
    pub train_file: Option<PathBuf>,
    /// Template text replacing [`DEFAULT_TEMPLATE`].
    pub template: Option<String>,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            license: "apache-2.0".to_string(),
            language: "en".to_string(),
            library_name: "pytorch".to_string(),
            library_tag: "DI-engine".to_string(),
            developers: "OpenDILab".to_string(),
            repo_url: "https://github.com/opendilab/DI-engine".to_string(),
            model_doc_url: "https://di-engine-docs.readthedocs.io".to_string(),
            env_doc_url: "https://di-engine-docs.readthedocs.io".to_string(),
            model_description: String::new(),
            installation_guide: String::new(),
            platform_info: String::new(),
            usage_file: None,
            train_file: None,
            template: None,
        }
    }
}

impl CardOptions {
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_usage_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.usage_file = Some(path.into());
        self
    }

    pub fn with_train_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.train_file = Some(path.into());
        self
    }

    /// The template to render with.
    pub fn template_text(&self) -> &str {
        self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE)
    }
}

/// Body values substituted into the card template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardFields {
    pub env_name: String,
    pub task_name: String,
    pub algo_name: String,
    pub model_id: String,
    pub mean_reward: String,
    pub model_description: String,
    pub platform_info: String,
    pub installation_guide: String,
    pub usage_code: String,
    pub train_code: String,
    pub config_text: String,
    pub training_run_url: String,
    pub developers: String,
    pub repo_url: String,
    pub model_doc_url: String,
    pub env_doc_url: String,
    pub config_file_url: String,
    pub video_demo_url: String,
    pub parameters_total_size: String,
    pub date: String,
    pub tool_version: String,
}

#[derive(Serialize)]
struct RenderContext<'a> {
    card_data: String,
    #[serde(flatten)]
    fields: &'a CardFields,
}

/// Contents of an optional source snippet; empty when unset or unreadable.
pub fn read_snippet(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return String::new();
    };
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "snippet not readable, leaving it out");
            String::new()
        }
    }
}

/// Render a card from `template`.
///
/// Unknown template variables are an error rather than blank output.
pub fn render_model_card(template: &str, data: &CardData, fields: &CardFields) -> Result<String> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.add_template(TEMPLATE_NAME, template)?;

    let ctx = RenderContext {
        card_data: serde_json::to_string_pretty(data)?,
        fields,
    };
    let rendered = env.get_template(TEMPLATE_NAME)?.render(&ctx)?;
    Ok(rendered)
}
