//! HTTP endpoints
//!
//! REST surface for the call orchestrator: turn processing, forced hangup,
//! health, and the speech-provider diagnostic.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use call_agent_core::Error as CoreError;
use call_agent_speech::SpeechError;

use crate::pipeline::{self, NormalizeError, ProcessCallRequest, ProcessCallResponse};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/process-call", post(process_call))
        .route("/end-call/:call_id", post(end_call))
        .route("/health", get(health))
        .route("/test-tts", get(test_tts))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// One conversational turn: normalize input, run the processor, synthesize
/// the reply, assemble the payload
async fn process_call(
    State(state): State<AppState>,
    Json(request): Json<ProcessCallRequest>,
) -> Response {
    tracing::info!(kind = %request.kind, call_id = ?request.call_id, "incoming call message");

    let message = match pipeline::normalize(&request, state.decoder.as_ref()).await {
        Ok(message) => message,
        Err(NormalizeError::BadInput) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid input format" })),
            )
                .into_response()
        }
        Err(NormalizeError::Decode) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process voice input" })),
            )
                .into_response()
        }
    };

    let Some(call_id) = request.call_id.clone().filter(|id| !id.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Call ID is required" })),
        )
            .into_response();
    };

    let (handle, created) = state.calls.resolve(&call_id);
    if created {
        tracing::info!(%call_id, active = state.calls.count(), "new call connected");
    }

    // Per-call serialization point: turns for this id queue here.
    let mut session = handle.lock().await;

    if !session.is_active() {
        return call_ended_response(&call_id);
    }

    let outcome = match state.processor.process(&mut session, &message).await {
        Ok(outcome) => outcome,
        Err(CoreError::CallEnded(_)) => return call_ended_response(&call_id),
        Err(err) => {
            tracing::error!(%call_id, %err, "turn processing failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process call", "details": err.to_string() })),
            )
                .into_response();
        }
    };

    let spoken = pipeline::render_speech(state.synthesizer.as_ref(), &outcome.response).await;

    if outcome.should_end_call {
        state.calls.schedule_removal(&call_id);
    }

    Json(ProcessCallResponse {
        success: true,
        audio: spoken.audio,
        duration: spoken.duration,
        tool_executed: outcome.tool_executed,
        tool_result: outcome.tool_result,
        should_end_call: outcome.should_end_call,
        call_ended: outcome.should_end_call,
        call_id: outcome.call_id,
        conversation_length: session.history().len(),
        call_duration: session.elapsed_secs(state.clock.now()),
        response: outcome.response,
    })
    .into_response()
}

fn call_ended_response(call_id: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Call has already ended", "callId": call_id })),
    )
        .into_response()
}

/// Force termination of a session
async fn end_call(State(state): State<AppState>, Path(call_id): Path<String>) -> Response {
    tracing::info!(%call_id, "hangup request");

    let Some(handle) = state.calls.get(&call_id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Call not found", "callId": call_id })),
        )
            .into_response();
    };

    let mut session = handle.lock().await;
    session.end(state.clock.now());
    let duration = session.call_duration();
    drop(session);

    state.calls.schedule_removal(&call_id);

    Json(json!({
        "success": true,
        "message": "Call ended",
        "callId": call_id,
        "duration": duration,
    }))
    .into_response()
}

/// Health check
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "openAIConfigured": state.config.openai.is_configured(),
        "elevenLabsConfigured": state.config.elevenlabs.is_configured(),
        "activeCalls": state.calls.count(),
        "uptime": state.started_at.elapsed().as_secs(),
        "memory": format!("{}MB", resident_memory_mb()),
        "timestamp": state.clock.now().to_rfc3339(),
    }))
}

/// Resident memory of this process in megabytes
fn resident_memory_mb() -> u64 {
    use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System};

    let system = System::new_with_specifics(
        RefreshKind::new().with_processes(ProcessRefreshKind::new().with_memory()),
    );
    system
        .process(Pid::from_u32(std::process::id()))
        .map(|process| process.memory() / 1024 / 1024)
        .unwrap_or(0)
}

/// Speech-provider diagnostic: validate credentials and run one sample
/// synthesis. Always replies 200; failures are reported in the body.
async fn test_tts(State(state): State<AppState>) -> Json<Value> {
    tracing::info!("testing speech synthesis credentials");

    if state.config.elevenlabs.api_key.is_none() {
        return Json(json!({
            "success": false,
            "error": "No ELEVENLABS_API_KEY found in .env file",
        }));
    }

    let Some(synthesizer) = &state.synthesizer else {
        return Json(json!({
            "success": false,
            "error": "ElevenLabs client not initialized - check your API key",
        }));
    };

    match synthesizer.list_voices().await {
        Ok(voices) => {
            let sample = pipeline::render_speech(Some(synthesizer), "Hello, this is a test.").await;

            Json(json!({
                "success": true,
                "message": "ElevenLabs API is working!",
                "voicesAvailable": voices.len(),
                "audioGenerated": !sample.audio.is_empty(),
                "voices": voices
                    .iter()
                    .take(5)
                    .map(|voice| json!({
                        "voice_id": voice.voice_id,
                        "name": voice.name,
                        "labels": voice.labels,
                    }))
                    .collect::<Vec<_>>(),
            }))
        }
        Err(err) => {
            let details = err.to_string();
            let error = match &err {
                SpeechError::InvalidKey => "Invalid API key".to_string(),
                SpeechError::RateLimited => "Rate limit or quota exceeded".to_string(),
                _ => details.clone(),
            };

            Json(json!({ "success": false, "error": error, "details": details }))
        }
    }
}
