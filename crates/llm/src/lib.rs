//! Completion provider interface
//!
//! Chat message types, the structured turn plan the provider must return,
//! prompt construction for the travel receptionist persona, and the
//! OpenAI-compatible HTTP client behind the `CompletionBackend` seam.

pub mod client;
pub mod plan;
pub mod prompt;

pub use client::{CompletionBackend, OpenAiChat};
pub use plan::TurnPlan;
pub use prompt::{Message, Role};

use thiserror::Error;

/// Completion provider errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Malformed reply: {0}")]
    MalformedReply(String),
}

impl From<LlmError> for call_agent_core::Error {
    fn from(err: LlmError) -> Self {
        call_agent_core::Error::Provider(err.to_string())
    }
}
