//! Application state
//!
//! Shared state across all handlers.

use std::sync::Arc;
use std::time::Instant;

use call_agent_agent::TurnProcessor;
use call_agent_config::Settings;
use call_agent_core::{Clock, SystemClock};
use call_agent_llm::{CompletionBackend, OpenAiChat};
use call_agent_speech::{Base64Decoder, ElevenLabsTts, SpeechDecoder, SpeechSynthesizer};
use call_agent_tools::create_default_registry;

use crate::store::CallStore;

/// Application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Settings>,
    /// Session store
    pub calls: Arc<CallStore>,
    /// Turn processor
    pub processor: Arc<TurnProcessor>,
    /// Speech synthesis, when configured
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
    /// Inbound voice decoder
    pub decoder: Arc<dyn SpeechDecoder>,
    /// Time source
    pub clock: Arc<dyn Clock>,
    /// Process start, for the health uptime figure
    pub started_at: Instant,
}

impl AppState {
    /// Create application state on the system clock
    pub fn new(config: Settings) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create application state with an injected clock (tests drive expiry
    /// deterministically through this)
    pub fn with_clock(config: Settings, clock: Arc<dyn Clock>) -> Self {
        let tools = Arc::new(create_default_registry());

        let backend: Option<Arc<dyn CompletionBackend>> = OpenAiChat::from_config(&config.openai)
            .map(|client| Arc::new(client) as Arc<dyn CompletionBackend>);

        let synthesizer: Option<Arc<dyn SpeechSynthesizer>> =
            ElevenLabsTts::from_config(&config.elevenlabs)
                .map(|client| Arc::new(client) as Arc<dyn SpeechSynthesizer>);

        let calls = Arc::new(CallStore::new(
            clock.clone(),
            config.session.cleanup_grace_secs,
        ));

        let processor = Arc::new(TurnProcessor::new(backend, tools, clock.clone()));

        Self {
            config: Arc::new(config),
            calls,
            processor,
            synthesizer,
            decoder: Arc::new(Base64Decoder),
            clock,
            started_at: Instant::now(),
        }
    }
}
