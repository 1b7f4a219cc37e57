//! Speech decoding
//!
//! Inbound voice payloads are decoded to text through the `SpeechDecoder`
//! seam. The shipped implementation is a base64 passthrough placeholder,
//! not a real speech-to-text integration.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::SpeechError;

/// Decode an inbound audio payload into text
#[async_trait]
pub trait SpeechDecoder: Send + Sync {
    /// Transcribe a base64 audio payload
    async fn transcribe(&self, audio_base64: &str) -> Result<String, SpeechError>;
}

/// Placeholder decoder: treats the payload as base64-encoded UTF-8 text.
///
/// A production deployment would swap in a real speech-to-text service here.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Decoder;

#[async_trait]
impl SpeechDecoder for Base64Decoder {
    async fn transcribe(&self, audio_base64: &str) -> Result<String, SpeechError> {
        let bytes = BASE64
            .decode(audio_base64)
            .map_err(|err| SpeechError::Decode(err.to_string()))?;

        let text =
            String::from_utf8(bytes).map_err(|err| SpeechError::Decode(err.to_string()))?;

        tracing::debug!(chars = text.len(), "transcribed inbound audio");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decodes_base64_text() {
        let decoder = Base64Decoder;
        let payload = BASE64.encode("book me a flight");

        let text = decoder.transcribe(&payload).await.unwrap();
        assert_eq!(text, "book me a flight");
    }

    #[tokio::test]
    async fn test_rejects_invalid_payload() {
        let decoder = Base64Decoder;

        assert!(decoder.transcribe("not-base64!!!").await.is_err());
    }
}
