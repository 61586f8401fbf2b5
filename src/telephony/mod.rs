//! Telephony service — places test calls and fetches their recordings.
//!
//! Completion is reported asynchronously to the inbound listener in
//! [`webhook`]; this module only covers the outbound requests.

pub mod webhook;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::TelephonyError;

/// Body of a start-call request.
#[derive(Debug, Clone, Serialize)]
pub struct StartCallRequest {
    pub phone_number: String,
    /// Agent script the simulated caller follows.
    pub prompt: String,
    pub webhook_url: String,
}

#[derive(Debug, Deserialize)]
struct StartCallResponse {
    id: String,
}

/// Outbound half of the telephony service.
#[async_trait]
pub trait Telephony: Send + Sync {
    /// Place a call. Returns the service-assigned call identifier.
    async fn start_call(&self, request: &StartCallRequest) -> Result<String, TelephonyError>;

    /// Fetch the recorded audio for a completed call.
    async fn fetch_recording(&self, call_id: &str) -> Result<Vec<u8>, TelephonyError>;

    /// Stable reference to a call's recording, listed in the final summary.
    fn recording_reference(&self, call_id: &str) -> String;
}

/// HTTP client for the telephony REST API (bearer-token auth).
pub struct HttpTelephony {
    client: reqwest::Client,
    api_token: SecretString,
    start_call_url: String,
    recording_url: String,
}

impl HttpTelephony {
    pub fn new(api_token: SecretString, start_call_url: String, recording_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_token,
            start_call_url,
            recording_url,
        }
    }
}

#[async_trait]
impl Telephony for HttpTelephony {
    async fn start_call(&self, request: &StartCallRequest) -> Result<String, TelephonyError> {
        debug!(webhook_url = %request.webhook_url, "Requesting call placement");

        let resp = self
            .client
            .post(&self.start_call_url)
            .bearer_auth(self.api_token.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelephonyError::PlacementFailed {
                status: status.as_u16(),
                body,
            });
        }

        let body: StartCallResponse = resp
            .json()
            .await
            .map_err(|e| TelephonyError::InvalidResponse(e.to_string()))?;
        info!(call_id = %body.id, "Call accepted by telephony service");
        Ok(body.id)
    }

    async fn fetch_recording(&self, call_id: &str) -> Result<Vec<u8>, TelephonyError> {
        let resp = self
            .client
            .get(&self.recording_url)
            .bearer_auth(self.api_token.expose_secret())
            .query(&[("id", call_id)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelephonyError::RetrievalFailed {
                call_id: call_id.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = resp.bytes().await?;
        debug!(call_id = call_id, size = bytes.len(), "Recording downloaded");
        Ok(bytes.to_vec())
    }

    fn recording_reference(&self, call_id: &str) -> String {
        format!("{}?id={}", self.recording_url, call_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_reference_appends_call_id() {
        let telephony = HttpTelephony::new(
            SecretString::from("token"),
            "https://example.test/start-call".into(),
            "https://example.test/media/exercise".into(),
        );
        assert_eq!(
            telephony.recording_reference("abc-123"),
            "https://example.test/media/exercise?id=abc-123"
        );
    }

    #[test]
    fn start_call_request_wire_format() {
        let request = StartCallRequest {
            phone_number: "+15550100".into(),
            prompt: "be polite".into(),
            webhook_url: "https://tunnel.test/webhook".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "phone_number": "+15550100",
                "prompt": "be polite",
                "webhook_url": "https://tunnel.test/webhook"
            })
        );
    }
}
