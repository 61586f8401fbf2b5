//! Completion service integration.
//!
//! The explorer only needs single-shot text completions that are expected to
//! return a JSON object. [`CompletionService`] is the seam; [`RigAdapter`]
//! bridges rig-core's `CompletionModel` to it.

pub mod json;
mod rig_adapter;

pub use json::extract_json_object;
pub use rig_adapter::RigAdapter;

use std::sync::Arc;

use async_trait::async_trait;
use rig::client::CompletionClient;
use secrecy::ExposeSecret;

use crate::error::LlmError;

/// A single system + user prompt exchange.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: Option<f64>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Text-completion backend used by the tree builder.
#[async_trait]
pub trait CompletionService: Send + Sync {
    fn model_name(&self) -> &str;

    /// Run one completion and return the raw response text.
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;
}

/// Configuration for creating a completion provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create the OpenAI-backed completion provider.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn CompletionService>, LlmError> {
    use rig::providers::openai;

    let client: rig::client::Client<openai::client::OpenAIResponsesExt> =
        openai::Client::new(config.api_key.expose_secret()).map_err(|e| {
            LlmError::RequestFailed {
                provider: "openai".to_string(),
                reason: format!("Failed to create OpenAI client: {}", e),
            }
        })?;

    let model = client.completion_model(&config.model);
    tracing::info!("Using OpenAI (model: {})", config.model);
    Ok(Arc::new(RigAdapter::new(model, &config.model)))
}
