//! Tool registry
//!
//! Maps tool names to implementations and renders the catalog block for the
//! provider's system instruction. Registration order is preserved so the
//! catalog is stable.

use std::sync::Arc;

use serde_json::Value;

use crate::travel::{BookingTool, EndCallTool, FlightSearchTool, HotelSearchTool};
use crate::{Tool, ToolError, ToolReply};

/// Registered tools, looked up by name
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. A tool with the same name replaces the earlier one,
    /// which is how tests swap in deterministic implementations.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        if let Some(existing) = self
            .tools
            .iter_mut()
            .find(|existing| existing.name() == tool.name())
        {
            *existing = tool;
        } else {
            self.tools.push(tool);
        }
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|tool| tool.name() == name).cloned()
    }

    /// Is a tool with this name registered?
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|tool| tool.name() == name)
    }

    /// Invoke a registered tool
    pub async fn invoke(&self, name: &str, params: Value) -> Result<ToolReply, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::NotFound(name.to_string()))?;

        tracing::info!(tool = name, "executing tool");
        tool.invoke(params).await
    }

    /// Catalog block for the provider's system instruction,
    /// one `- name: params {...}` line per tool
    pub fn catalog(&self) -> String {
        self.tools
            .iter()
            .map(|tool| format!("- {}: params {}", tool.name(), tool.params_hint()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Is the registry empty?
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Registry with the four travel-agency tools
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(FlightSearchTool));
    registry.register(Arc::new(HotelSearchTool));
    registry.register(Arc::new(BookingTool));
    registry.register(Arc::new(EndCallTool));
    registry
}
