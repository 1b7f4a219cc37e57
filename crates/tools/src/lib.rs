//! Mock travel-agency tools
//!
//! Simulated backend operations behind a common `Tool` interface: flight
//! search, hotel availability, booking, and call termination. Each returns
//! randomized domain data after an artificial delay — the field shapes are
//! stable, the values are not. Deterministic substitutes can be registered
//! in their place for testing.

pub mod registry;
pub mod travel;

pub use registry::{create_default_registry, ToolRegistry};
pub use travel::{BookingTool, EndCallTool, FlightSearchTool, HotelSearchTool};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Tool execution errors
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl From<ToolError> for call_agent_core::Error {
    fn from(err: ToolError) -> Self {
        call_agent_core::Error::Tool(err.to_string())
    }
}

/// Simulated backend reply: success flag plus domain payload
#[derive(Debug, Clone, Serialize)]
pub struct ToolReply {
    pub success: bool,
    pub data: Value,
}

impl ToolReply {
    /// Successful reply wrapping the given payload
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
        }
    }

    /// The wire form recorded into tool memory and surfaced to callers
    pub fn into_value(self) -> Value {
        json!({ "success": self.success, "data": self.data })
    }
}

/// A simulated backend operation
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the provider addresses this tool by
    fn name(&self) -> &str;

    /// What the tool does
    fn description(&self) -> &str;

    /// Parameter shape shown in the provider's tool catalog,
    /// e.g. `{origin, destination, date}`
    fn params_hint(&self) -> &str;

    /// Run the operation with a loosely-typed parameter mapping
    async fn invoke(&self, params: Value) -> Result<ToolReply, ToolError>;
}
