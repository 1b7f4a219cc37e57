//! Completion provider client
//!
//! `CompletionBackend` is the seam the turn processor drives; `OpenAiChat`
//! is the production implementation against an OpenAI-compatible
//! chat-completions endpoint.

use async_trait::async_trait;
use serde_json::json;

use call_agent_config::OpenAiConfig;

use crate::{LlmError, Message, TurnPlan};

/// One structured completion round-trip
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run the system instruction plus ordered dialogue through the provider
    /// and parse the structured reply.
    async fn plan_turn(&self, system: &str, history: &[Message]) -> Result<TurnPlan, LlmError>;
}

/// OpenAI-compatible chat client
pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    /// Build from configuration; `None` when no usable key is present,
    /// which selects the scripted fallback mode upstream.
    pub fn from_config(config: &OpenAiConfig) -> Option<Self> {
        if !config.is_configured() {
            return None;
        }

        Some(Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone()?,
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAiChat {
    async fn plan_turn(&self, system: &str, history: &[Message]) -> Result<TurnPlan, LlmError> {
        let mut messages = vec![json!({ "role": "system", "content": system })];
        for message in history {
            messages.push(json!({
                "role": message.role.to_string(),
                "content": message.content,
            }));
        }

        let body = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "response_format": { "type": "json_object" },
        });

        tracing::debug!(model = %self.model, turns = history.len(), "calling completion endpoint");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Api(format!(
                "completion endpoint returned {}",
                response.status()
            )));
        }

        let payload: serde_json::Value = response.json().await?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| LlmError::MalformedReply("missing message content".to_string()))?;

        TurnPlan::parse(content).map_err(|err| LlmError::MalformedReply(err.to_string()))
    }
}
