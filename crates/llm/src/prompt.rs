//! Prompt construction
//!
//! Builds the system and follow-up instructions for the travel receptionist
//! persona, and maps conversation turns into provider chat messages.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use call_agent_core::{ToolRecord, Turn, TurnRole};

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Customer turns are replayed to the provider under the generic user role.
impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        Self {
            role: match turn.role {
                TurnRole::Customer => Role::User,
                TurnRole::Assistant => Role::Assistant,
            },
            content: turn.content.clone(),
        }
    }
}

/// JSON reply contract for the first provider pass
const REPLY_CONTRACT: &str = r#"Respond in JSON:
{
    "response": "Your spoken response",
    "tool": "toolName or null",
    "toolParams": {},
    "collectInfo": {},
    "shouldEndCall": false
}"#;

/// JSON reply contract for the tool wrap-up pass
const FOLLOW_UP_CONTRACT: &str = r#"Respond in JSON:
{
    "response": "Your brief spoken response with the specific results",
    "tool": null,
    "toolParams": {},
    "collectInfo": {},
    "shouldEndCall": false
}"#;

/// Build the system instruction for the first provider pass.
///
/// `tool_catalog` is the registry's catalog block, one `- name: params {...}`
/// line per tool. Only the trailing tool records and the accumulated customer
/// facts make it into context.
pub fn system_instruction(
    tool_catalog: &str,
    recent_tools: &[ToolRecord],
    customer_info: &Map<String, Value>,
) -> String {
    let recent_block = if recent_tools.is_empty() {
        String::new()
    } else {
        let lines = recent_tools
            .iter()
            .map(|record| format!("Tool {} returned: {}", record.tool, record.result))
            .collect::<Vec<_>>()
            .join("\n");
        format!("Recent tool results:\n{lines}\n\n")
    };

    let customer_info = Value::Object(customer_info.clone());

    format!(
        "You are a helpful travel agency receptionist on a phone call. \
         Keep responses concise and natural for phone conversation.\n\n\
         Available tools:\n{tool_catalog}\n\n\
         {recent_block}\
         Customer info: {customer_info}\n\n\
         IMPORTANT:\n\
         - Keep responses short and conversational (1-2 sentences ideal)\n\
         - When you use a tool, incorporate its results naturally\n\
         - Set shouldEndCall to true when the customer says goodbye or the booking is complete\n\n\
         {REPLY_CONTRACT}"
    )
}

/// Build the instruction for the second pass that folds a tool result into a
/// short spoken reply.
pub fn follow_up_instruction(tool: &str, result: &Value) -> String {
    format!(
        "The tool {tool} returned: {result}\n\n\
         Now incorporate this information into a SHORT, NATURAL phone response to the customer.\n\n\
         {FOLLOW_UP_CONTRACT}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_customer_turns_map_to_user_role() {
        let turn = Turn {
            role: TurnRole::Customer,
            content: "hello".to_string(),
            timestamp: Utc::now(),
        };

        let message = Message::from(&turn);
        assert_eq!(message.role, Role::User);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_system_instruction_without_tool_history() {
        let instruction = system_instruction(
            "- checkFlightPrices: params {origin, destination, date}",
            &[],
            &Map::new(),
        );

        assert!(instruction.contains("travel agency receptionist"));
        assert!(instruction.contains("- checkFlightPrices: params {origin, destination, date}"));
        assert!(instruction.contains("Customer info: {}"));
        assert!(instruction.contains("shouldEndCall"));
        assert!(!instruction.contains("Recent tool results:"));
    }

    #[test]
    fn test_system_instruction_surfaces_recent_tools_and_info() {
        let records = vec![ToolRecord {
            tool: "checkFlightPrices".to_string(),
            result: json!({"success": true}),
            timestamp: Utc::now(),
        }];
        let mut info = Map::new();
        info.insert("name".to_string(), json!("Ada"));

        let instruction = system_instruction("- endCall: params {summary}", &records, &info);

        assert!(instruction.contains("Recent tool results:"));
        assert!(instruction.contains(r#"Tool checkFlightPrices returned: {"success":true}"#));
        assert!(instruction.contains(r#"Customer info: {"name":"Ada"}"#));
    }

    #[test]
    fn test_follow_up_instruction_carries_result() {
        let instruction = follow_up_instruction("makeBooking", &json!({"bookingId": "BK1"}));

        assert!(instruction.contains(r#"The tool makeBooking returned: {"bookingId":"BK1"}"#));
        assert!(instruction.contains("SHORT, NATURAL phone response"));
    }
}
