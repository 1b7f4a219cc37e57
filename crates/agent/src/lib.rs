//! Turn processing for call sessions
//!
//! The orchestration core: given a session and an inbound utterance, drives
//! the completion provider, optional tool invocation, and a wrap-up provider
//! pass, mutating the session and detecting termination. A scripted fallback
//! keeps the service demoable when no provider is configured.

pub mod fallback;
pub mod turn;

pub use turn::{TurnOutcome, TurnProcessor, APOLOGY};
