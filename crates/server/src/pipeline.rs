//! Request pipeline
//!
//! Normalizes inbound text/voice payloads into one plain message before turn
//! processing, and assembles the outbound payload (reply text, synthesized
//! audio, call bookkeeping) after.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use call_agent_speech::{estimated_duration_secs, SpeechDecoder, SpeechSynthesizer};

/// Inbound turn request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCallRequest {
    /// "text" or "vocal"; anything else is rejected as bad input
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub call_id: Option<String>,

    /// Plain text message (text requests)
    #[serde(default)]
    pub message: Option<String>,

    /// Base64 audio payload (vocal requests)
    #[serde(default)]
    pub vocal: Option<String>,
}

/// Outbound turn payload; field names match the wire format exactly
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCallResponse {
    pub success: bool,
    pub response: String,
    pub audio: String,
    pub duration: u64,
    pub tool_executed: Option<String>,
    pub tool_result: Option<Value>,
    pub should_end_call: bool,
    pub call_ended: bool,
    pub call_id: String,
    pub conversation_length: usize,
    pub call_duration: i64,
}

/// Why normalization refused a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeError {
    /// Neither a valid text nor a valid vocal payload
    BadInput,
    /// The voice payload could not be decoded
    Decode,
}

/// Reduce an inbound request to the plain message text
pub async fn normalize(
    request: &ProcessCallRequest,
    decoder: &dyn SpeechDecoder,
) -> Result<String, NormalizeError> {
    match (request.kind.as_str(), &request.message, &request.vocal) {
        ("vocal", _, Some(vocal)) => {
            tracing::debug!("decoding inbound audio");
            decoder.transcribe(vocal).await.map_err(|err| {
                tracing::warn!(%err, "voice decoding failed");
                NormalizeError::Decode
            })
        }
        ("text", Some(message), _) => Ok(message.clone()),
        _ => Err(NormalizeError::BadInput),
    }
}

/// The spoken form of a reply
#[derive(Debug, Clone)]
pub struct SpokenReply {
    /// Base64 audio, empty when synthesis was skipped or failed
    pub audio: String,
    /// Playback duration estimate in seconds
    pub duration: u64,
}

/// Synthesize the reply text, degrading to empty audio on any failure
pub async fn render_speech(
    synthesizer: Option<&Arc<dyn SpeechSynthesizer>>,
    text: &str,
) -> SpokenReply {
    let Some(synthesizer) = synthesizer else {
        tracing::debug!("speech synthesis not configured, skipping");
        return SpokenReply {
            audio: String::new(),
            duration: estimated_duration_secs(text, false),
        };
    };

    match synthesizer.synthesize(text).await {
        Ok(bytes) => {
            tracing::debug!(kb = bytes.len() / 1024, "synthesized reply audio");
            SpokenReply {
                audio: BASE64.encode(bytes),
                duration: estimated_duration_secs(text, true),
            }
        }
        Err(err) => {
            tracing::warn!(%err, "speech synthesis failed, returning empty audio");
            SpokenReply {
                audio: String::new(),
                duration: estimated_duration_secs(text, false),
            }
        }
    }
}
