//! Speech synthesis
//!
//! `SpeechSynthesizer` turns reply text into audio bytes; the production
//! implementation talks to ElevenLabs. Callers degrade to empty audio with
//! an estimated duration when synthesis is unavailable or fails.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use call_agent_config::ElevenLabsConfig;

use crate::SpeechError;

/// Backend that turns text into audio bytes
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize the text to audio bytes
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;

    /// List the voices available to this account (diagnostic surface)
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError>;
}

/// One available voice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceInfo {
    pub voice_id: String,
    pub name: String,
    #[serde(default)]
    pub labels: Value,
}

/// Estimated spoken duration in whole seconds, as a linear function of text
/// length. Synthesized audio runs slightly longer than the skipped estimate.
pub fn estimated_duration_secs(text: &str, synthesized: bool) -> u64 {
    let factor = if synthesized { 0.06 } else { 0.05 };
    (text.len() as f64 * factor).floor() as u64
}

/// ElevenLabs text-to-speech client
pub struct ElevenLabsTts {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    voice_id: String,
    model_id: String,
    stability: f32,
    similarity_boost: f32,
}

impl ElevenLabsTts {
    /// Build from configuration; `None` when no usable key is present,
    /// in which case responses carry empty audio.
    pub fn from_config(config: &ElevenLabsConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }

        Some(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone()?,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            stability: config.stability,
            similarity_boost: config.similarity_boost,
        })
    }

    fn classify_status(status: reqwest::StatusCode) -> SpeechError {
        match status.as_u16() {
            401 => SpeechError::InvalidKey,
            429 => SpeechError::RateLimited,
            422 => SpeechError::InvalidRequest,
            _ => SpeechError::Api(format!("speech endpoint returned {status}")),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        tracing::debug!(chars = text.len(), voice = %self.voice_id, "synthesizing speech");

        let body = json!({
            "text": text,
            "model_id": self.model_id,
            "voice_settings": {
                "stability": self.stability,
                "similarity_boost": self.similarity_boost,
            },
        });

        let response = self
            .client
            .post(format!(
                "{}/text-to-speech/{}",
                self.base_url, self.voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_status(response.status()));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
        #[derive(Deserialize)]
        struct VoicesPayload {
            voices: Vec<VoiceInfo>,
        }

        let response = self
            .client
            .get(format!("{}/voices", self.base_url))
            .header("xi-api-key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::classify_status(response.status()));
        }

        let payload: VoicesPayload = response.json().await?;
        Ok(payload.voices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_estimate_factors() {
        // 100 characters: 6 seconds synthesized, 5 when skipped.
        let text = "x".repeat(100);

        assert_eq!(estimated_duration_secs(&text, true), 6);
        assert_eq!(estimated_duration_secs(&text, false), 5);
        assert_eq!(estimated_duration_secs("", false), 0);
    }

    #[test]
    fn test_from_config_requires_real_key() {
        let mut config = ElevenLabsConfig::default();
        assert!(ElevenLabsTts::from_config(&config).is_none());

        config.api_key = Some("test-key".to_string());
        assert!(ElevenLabsTts::from_config(&config).is_none());

        config.api_key = Some("el-live".to_string());
        assert!(ElevenLabsTts::from_config(&config).is_some());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ElevenLabsTts::classify_status(reqwest::StatusCode::UNAUTHORIZED),
            SpeechError::InvalidKey
        ));
        assert!(matches!(
            ElevenLabsTts::classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS),
            SpeechError::RateLimited
        ));
        assert!(matches!(
            ElevenLabsTts::classify_status(reqwest::StatusCode::UNPROCESSABLE_ENTITY),
            SpeechError::InvalidRequest
        ));
    }
}
