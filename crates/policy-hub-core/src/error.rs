//! Error taxonomy for the push/pull workflows.

use hub_client::HubError;

use crate::card::CardError;
use crate::weights::WeightsError;

/// policy-hub errors. Every variant is terminal for the enclosing operation.
#[derive(Debug, thiserror::Error)]
pub enum PolicyHubError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported agent: {0}")]
    UnsupportedAgent(String),

    #[error("invalid policy config: {0}")]
    InvalidConfig(String),

    #[error("agent {stage} failed: {source}")]
    Agent {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("upload of {path} failed after {attempts} attempt(s): {source}")]
    UploadFailed {
        path: String,
        attempts: u32,
        #[source]
        source: HubError,
    },

    #[error("model card info is invalid: {source}")]
    InvalidCard {
        #[from]
        source: CardError,
    },

    #[error("hub error: {0}")]
    Hub(#[from] HubError),

    #[error("weights error: {0}")]
    Weights(#[from] WeightsError),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PolicyHubError {
    /// Wrap a failure reported by the agent capability.
    pub fn agent(stage: &'static str, err: anyhow::Error) -> Self {
        PolicyHubError::Agent {
            stage,
            source: err.into(),
        }
    }
}

/// Result type for policy-hub operations.
pub type Result<T> = std::result::Result<T, PolicyHubError>;
