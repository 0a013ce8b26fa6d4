//! Hub-Client: Model Hub Access for policy-hub
//!
//! This crate provides the remote storage layer for policy-hub. It creates
//! model repositories, uploads files into them and downloads files back out
//! of a Hugging Face compatible hub.
//!
//! ## Key Components
//!
//! - `ModelHub`: the backend-agnostic trait the workflows are written against
//! - `HttpHub` / `HubConfig`: reqwest-backed client configured from the environment
//! - `fakes::MemoryHub`: in-memory implementation with failure injection

mod error;
pub mod fakes;
pub mod http;
pub mod hub_traits;

pub use error::HubError;
pub use http::{commit_payload, HttpHub, HubConfig, DEFAULT_ENDPOINT};
pub use hub_traits::{HubResult, ModelHub, RepoId, UploadSource};
