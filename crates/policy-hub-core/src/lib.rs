//! Policy-Hub-Core: Share Reinforcement-Learning Agents on a Model Hub
//!
//! This crate packages a trained agent (weights, configuration, a rendered
//! replay and a model card) and uploads it to a Hugging Face compatible
//! hub, and pulls weights and configuration back for reuse.
//!
//! ## Key Components
//!
//! - `Agent`: the capability a training framework adapter implements
//! - `push_model_to_hub` / `pull_model_from_hub`: the two workflows
//! - `WeightsMapping` / `PolicyConfig`: artifacts, stored as safetensors and JSON
//! - `card`: model card rendering (minijinja) and header validation
//! - `obs` / `telemetry`: structured tracing events and subscriber setup

pub mod agent;
pub mod artifact;
pub mod card;
pub mod config;
mod error;
pub mod fakes;
pub mod obs;
pub mod pull;
pub mod push;
pub mod telemetry;
pub mod upload;
pub mod video;
pub mod weights;

pub use agent::{extract_config, extract_weights, format_mean_reward, Agent, EvalReturn};
pub use artifact::{ArtifactKind, ContentDigest, StagedArtifact, UploadedArtifact};
pub use card::{
    render_model_card, validate_model_card, CardData, CardError, CardFields, CardOptions,
};
pub use config::{load_config, save_config, PolicyConfig};
pub use error::{PolicyHubError, Result};
pub use pull::{pull_model_from_hub, pull_model_with_options, PullOptions};
pub use push::{push_model_to_hub, PushReport, PushRequest, RepoLayout};
pub use upload::{upload_with_retry, MAX_UPLOAD_ATTEMPTS};
pub use video::find_video_file;
pub use weights::{
    load_weights, model_size_summary, save_weights, total_elements, Tensor, WeightsError,
    WeightsMapping,
};

pub use hub_client::{HttpHub, HubConfig, HubError, ModelHub, RepoId};

/// Version recorded on pushed model cards.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
