//! Prompt-to-image client for OpenAI-compatible image generation APIs.
//!
//! Prompts that are not plain English are translated through a
//! chat-completion endpoint first; generated image links are kept in a
//! versioned link store and pruned when they stop loading.

pub mod config;
pub mod controller;
pub mod error;
pub mod gallery;
pub mod logger;
pub mod models;
pub mod openai;
pub mod storage;
pub mod validator;

pub use config::{ApiConfig, Config, StorageBackend, StorageConfig, ValidatorConfig};
pub use controller::{Controller, Phase, Transition, UiState};
pub use error::{Error, Result};
pub use gallery::Gallery;
pub use models::*;
pub use openai::{is_english, ApiClient, ImageClient, TranslationClient};
pub use storage::{FileLinkStore, LinkRepository, LinkStore, MemoryLinkStore};
pub use validator::{HttpImageProbe, ImageProbe, LinkValidator};
