//! Configuration types, read from the environment.

use std::path::PathBuf;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::explorer::ExplorerSettings;
use crate::transcribe::WHISPER_ENDPOINT;

pub const DEFAULT_START_CALL_URL: &str = "https://app.hamming.ai/api/rest/exercise/start-call";
pub const DEFAULT_RECORDING_URL: &str = "https://app.hamming.ai/api/media/exercise";

/// Full process configuration.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Bearer token for the telephony service.
    pub api_token: SecretString,
    /// Key for the completion and speech-to-text services.
    pub openai_api_key: SecretString,
    /// Number of the voice agent under test.
    pub phone_number: String,
    /// Publicly reachable base URL forwarding to the local listener.
    pub public_url: String,
    /// Local listener port.
    pub port: u16,
    pub start_call_url: String,
    pub recording_url: String,
    /// Completion model used for extraction and merging.
    pub model: String,
    pub stt_model: String,
    /// OpenAI-compatible transcription endpoint.
    pub stt_url: String,
    /// Directory for call artifacts, tree snapshots, summary and logs.
    pub output_dir: PathBuf,
    /// Previously persisted cumulative tree to continue from.
    pub seed_tree: Option<PathBuf>,
    /// Maximum calls to place. `None` means unbounded.
    pub max_calls: Option<usize>,
}

impl ExplorerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let port: u16 = match lookup("EXPLORER_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "EXPLORER_PORT".to_string(),
                message: format!("'{raw}' is not a port number"),
            })?,
            None => 5000,
        };

        let max_calls = match lookup("EXPLORER_MAX_CALLS") {
            Some(raw) => raw.parse::<usize>().map_err(|_| ConfigError::InvalidValue {
                key: "EXPLORER_MAX_CALLS".to_string(),
                message: format!("'{raw}' is not a non-negative integer"),
            })?,
            None => 25,
        };

        Ok(Self {
            api_token: SecretString::from(required("EXPLORER_API_TOKEN")?),
            openai_api_key: SecretString::from(required("OPENAI_API_KEY")?),
            phone_number: required("EXPLORER_PHONE_NUMBER")?,
            public_url: required("EXPLORER_PUBLIC_URL")?,
            port,
            start_call_url: lookup("EXPLORER_START_CALL_URL")
                .unwrap_or_else(|| DEFAULT_START_CALL_URL.to_string()),
            recording_url: lookup("EXPLORER_RECORDING_URL")
                .unwrap_or_else(|| DEFAULT_RECORDING_URL.to_string()),
            model: lookup("EXPLORER_MODEL").unwrap_or_else(|| "gpt-4o".to_string()),
            stt_model: lookup("EXPLORER_STT_MODEL").unwrap_or_else(|| "whisper-1".to_string()),
            stt_url: lookup("EXPLORER_STT_URL").unwrap_or_else(|| WHISPER_ENDPOINT.to_string()),
            output_dir: lookup("EXPLORER_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./dt_json")),
            seed_tree: lookup("EXPLORER_SEED_TREE")
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            max_calls: (max_calls > 0).then_some(max_calls),
        })
    }

    /// Callback address handed to the telephony service.
    pub fn webhook_url(&self) -> String {
        format!("{}/webhook", self.public_url.trim_end_matches('/'))
    }

    pub fn explorer_settings(&self) -> ExplorerSettings {
        ExplorerSettings {
            phone_number: self.phone_number.clone(),
            webhook_url: self.webhook_url(),
            max_calls: self.max_calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("EXPLORER_API_TOKEN", "tok"),
        ("OPENAI_API_KEY", "sk-test"),
        ("EXPLORER_PHONE_NUMBER", "+15550100"),
        ("EXPLORER_PUBLIC_URL", "https://abc.tunnel.test/"),
    ];

    #[test]
    fn defaults_apply() {
        let config = ExplorerConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.api_token.expose_secret(), "tok");
        assert_eq!(config.port, 5000);
        assert_eq!(config.start_call_url, DEFAULT_START_CALL_URL);
        assert_eq!(config.recording_url, DEFAULT_RECORDING_URL);
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.stt_model, "whisper-1");
        assert_eq!(config.stt_url, WHISPER_ENDPOINT);
        assert_eq!(config.output_dir, PathBuf::from("./dt_json"));
        assert_eq!(config.seed_tree, None);
        assert_eq!(config.max_calls, Some(25));
        assert_eq!(config.webhook_url(), "https://abc.tunnel.test/webhook");
    }

    #[test]
    fn missing_required_value_is_reported() {
        let err = ExplorerConfig::from_lookup(lookup(&REQUIRED[1..])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "EXPLORER_API_TOKEN"));
    }

    #[test]
    fn zero_max_calls_means_unbounded() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPLORER_MAX_CALLS", "0"));
        pairs.push(("EXPLORER_SEED_TREE", "./dt_json/cumulative_tree.json"));
        let config = ExplorerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.max_calls, None);
        assert_eq!(
            config.seed_tree,
            Some(PathBuf::from("./dt_json/cumulative_tree.json"))
        );
        assert_eq!(config.explorer_settings().max_calls, None);
    }

    #[test]
    fn transcription_endpoint_can_be_overridden() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPLORER_STT_URL", "http://localhost:8000/v1/audio/transcriptions"));
        let config = ExplorerConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.stt_url, "http://localhost:8000/v1/audio/transcriptions");
    }

    #[test]
    fn bad_port_is_invalid() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("EXPLORER_PORT", "http"));
        let err = ExplorerConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key, .. } if key == "EXPLORER_PORT"));
    }
}
