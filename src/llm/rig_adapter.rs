//! Adapter from rig-core's `CompletionModel` to [`CompletionService`].

use async_trait::async_trait;
use rig::completion::CompletionModel;
use rig::message::AssistantContent;

use super::{CompletionRequest, CompletionService};
use crate::error::LlmError;

pub struct RigAdapter<M> {
    model: M,
    model_name: String,
}

impl<M> RigAdapter<M> {
    pub fn new(model: M, model_name: &str) -> Self {
        Self {
            model,
            model_name: model_name.to_string(),
        }
    }
}

#[async_trait]
impl<M> CompletionService for RigAdapter<M>
where
    M: CompletionModel + Send + Sync + 'static,
{
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let mut builder = self
            .model
            .completion_request(request.prompt)
            .preamble(request.system);
        if let Some(temperature) = request.temperature {
            builder = builder.temperature(temperature);
        }

        let response = builder.send().await.map_err(|e| LlmError::RequestFailed {
            provider: self.model_name.clone(),
            reason: e.to_string(),
        })?;

        let text: String = response
            .choice
            .iter()
            .filter_map(|content| match content {
                AssistantContent::Text(text) => Some(text.text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("");

        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse {
                provider: self.model_name.clone(),
                reason: "response contained no text".to_string(),
            });
        }

        Ok(text)
    }
}
