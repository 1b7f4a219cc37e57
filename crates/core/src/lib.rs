//! Core types for the call agent
//!
//! This crate provides foundational types used across all other crates:
//! - Call session state machine
//! - Error taxonomy
//! - Time source abstraction

pub mod clock;
pub mod error;
pub mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use session::{CallSession, CallStatus, ToolRecord, Turn, TurnRole, TOOL_MEMORY_WINDOW};
