//! Structured turn plan
//!
//! The completion provider is instructed to reply with a JSON object; this is
//! its parsed form. Every field is defaulted so a minimal `{"response": ...}`
//! reply still parses.

use serde::Deserialize;
use serde_json::{Map, Value};

/// One structured reply from the completion provider
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TurnPlan {
    /// The spoken response text
    pub response: String,

    /// Tool the provider wants invoked, if any
    pub tool: Option<String>,

    /// Parameters for that tool
    #[serde(default = "empty_object")]
    pub tool_params: Value,

    /// Caller facts the provider extracted this turn
    pub collect_info: Map<String, Value>,

    /// Whether the call should terminate after this reply
    pub should_end_call: bool,
}

impl TurnPlan {
    /// Parse a raw provider reply
    pub fn parse(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Tool named by the plan, with textual nulls filtered out.
    ///
    /// Providers occasionally emit `"tool": "null"` instead of a JSON null;
    /// neither names a real tool.
    pub fn tool_name(&self) -> Option<&str> {
        match self.tool.as_deref() {
            None | Some("") | Some("null") | Some("none") => None,
            Some(name) => Some(name),
        }
    }
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
