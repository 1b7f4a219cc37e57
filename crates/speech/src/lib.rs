//! Speech provider interfaces
//!
//! Text-to-speech via ElevenLabs behind the `SpeechSynthesizer` seam, and
//! the placeholder speech decoder for inbound voice payloads.

pub mod stt;
pub mod tts;

pub use stt::{Base64Decoder, SpeechDecoder};
pub use tts::{estimated_duration_secs, ElevenLabsTts, SpeechSynthesizer, VoiceInfo};

use thiserror::Error;

/// Speech provider errors
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid API key")]
    InvalidKey,

    #[error("Rate limit or quota exceeded")]
    RateLimited,

    #[error("Invalid request (text might be too long)")]
    InvalidRequest,

    #[error("API error: {0}")]
    Api(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<SpeechError> for call_agent_core::Error {
    fn from(err: SpeechError) -> Self {
        call_agent_core::Error::Provider(err.to_string())
    }
}
