//! Speech-to-text for call recordings (OpenAI Whisper API).

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use crate::error::TranscriptionError;

pub const WHISPER_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Audio bytes in, transcript text out.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError>;
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

pub struct WhisperTranscriber {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

impl WhisperTranscriber {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model: model.into(),
            endpoint: WHISPER_ENDPOINT.to_string(),
        }
    }

    /// Point at a different OpenAI-compatible transcription endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, TranscriptionError> {
        if audio.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        debug!(size = audio.len(), model = %self.model, "Transcribing recording");

        // Recordings are served as mp3.
        let part = Part::bytes(audio.to_vec())
            .file_name("recording.mp3")
            .mime_str("audio/mpeg")?;
        let form = Form::new()
            .text("model", self.model.clone())
            .text("response_format", "json")
            .part("file", part);

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranscriptionError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: TranscriptionResponse = resp.json().await?;
        Ok(body.text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_audio_is_rejected_without_request() {
        let transcriber = WhisperTranscriber::new(SecretString::from("sk-test"), "whisper-1")
            .with_endpoint("http://127.0.0.1:9/unreachable");
        let err = transcriber.transcribe(&[]).await.unwrap_err();
        assert!(matches!(err, TranscriptionError::EmptyAudio));
    }
}
