//! Call session state
//!
//! One `CallSession` per in-progress phone call: conversation history, tool
//! memory, accumulated caller facts, and the active/ended lifecycle. All
//! fields are private so the append-only and one-way-transition invariants
//! hold at the type level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Number of trailing tool records surfaced back into provider context
pub const TOOL_MEMORY_WINDOW: usize = 3;

/// Lifecycle of a call. Transitions one way, active to ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    Active,
    Ended,
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Customer,
    Assistant,
}

/// One entry in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One recorded tool invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    pub tool: String,
    pub result: Value,
    pub timestamp: DateTime<Utc>,
}

/// Per-call conversation state
#[derive(Debug, Clone)]
pub struct CallSession {
    call_id: String,
    status: CallStatus,
    conversation_history: Vec<Turn>,
    tool_memory: Vec<ToolRecord>,
    customer_info: Map<String, Value>,
    booking_details: Map<String, Value>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    call_duration: i64,
}

impl CallSession {
    /// Create a fresh active session
    pub fn new(call_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            call_id: call_id.into(),
            status: CallStatus::Active,
            conversation_history: Vec::new(),
            tool_memory: Vec::new(),
            customer_info: Map::new(),
            booking_details: Map::new(),
            created_at: now,
            last_activity: now,
            ended_at: None,
            call_duration: 0,
        }
    }

    /// Call identifier
    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Current lifecycle status
    pub fn status(&self) -> CallStatus {
        self.status
    }

    /// Is the call still active?
    pub fn is_active(&self) -> bool {
        self.status == CallStatus::Active
    }

    /// Append a turn to the conversation history
    pub fn add_turn(&mut self, role: TurnRole, content: impl Into<String>, now: DateTime<Utc>) {
        self.conversation_history.push(Turn {
            role,
            content: content.into(),
            timestamp: now,
        });
        self.last_activity = now;
    }

    /// Full conversation history, in insertion order
    pub fn history(&self) -> &[Turn] {
        &self.conversation_history
    }

    /// Record a tool invocation result
    pub fn record_tool(&mut self, tool: impl Into<String>, result: Value, now: DateTime<Utc>) {
        self.tool_memory.push(ToolRecord {
            tool: tool.into(),
            result,
            timestamp: now,
        });
    }

    /// The trailing tool records surfaced back into provider context
    pub fn recent_tool_records(&self) -> &[ToolRecord] {
        let skip = self.tool_memory.len().saturating_sub(TOOL_MEMORY_WINDOW);
        &self.tool_memory[skip..]
    }

    /// Accumulated caller facts
    pub fn customer_info(&self) -> &Map<String, Value> {
        &self.customer_info
    }

    /// Merge new caller facts; existing keys are overwritten, never cleared
    pub fn merge_customer_info(&mut self, info: Map<String, Value>) {
        for (key, value) in info {
            self.customer_info.insert(key, value);
        }
    }

    /// Accumulated booking details (collected but not consumed by core logic)
    pub fn booking_details(&self) -> &Map<String, Value> {
        &self.booking_details
    }

    /// Merge booking details, same semantics as `merge_customer_info`
    pub fn merge_booking_details(&mut self, details: Map<String, Value>) {
        for (key, value) in details {
            self.booking_details.insert(key, value);
        }
    }

    /// Transition to ended. Returns false if the call had already ended;
    /// the recorded duration is only computed on the first transition.
    pub fn end(&mut self, now: DateTime<Utc>) -> bool {
        if self.status == CallStatus::Ended {
            return false;
        }
        self.status = CallStatus::Ended;
        self.ended_at = Some(now);
        self.call_duration = (now - self.created_at).num_seconds();
        true
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last time a turn was appended
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// When the call ended, if it has
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Call duration in seconds, fixed at end-call time
    pub fn call_duration(&self) -> i64 {
        self.call_duration
    }

    /// Seconds since the call was created
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn info(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_session_creation() {
        let now = Utc::now();
        let session = CallSession::new("c1", now);

        assert_eq!(session.call_id(), "c1");
        assert!(session.is_active());
        assert!(session.history().is_empty());
        assert_eq!(session.created_at(), now);
    }

    #[test]
    fn test_turns_append_in_order() {
        let now = Utc::now();
        let mut session = CallSession::new("c1", now);

        session.add_turn(TurnRole::Customer, "hello", now);
        session.add_turn(TurnRole::Assistant, "hi there", now);
        session.add_turn(TurnRole::Customer, "flights please", now);

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].role, TurnRole::Customer);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, TurnRole::Assistant);
        assert_eq!(history[2].content, "flights please");
    }

    #[test]
    fn test_end_is_one_way_and_idempotent() {
        let start = Utc::now();
        let mut session = CallSession::new("c1", start);

        assert!(session.end(start + Duration::seconds(42)));
        assert_eq!(session.status(), CallStatus::Ended);
        assert_eq!(session.call_duration(), 42);

        // A later end must not reopen the call or recompute the duration.
        assert!(!session.end(start + Duration::seconds(100)));
        assert_eq!(session.call_duration(), 42);
        assert_eq!(session.ended_at(), Some(start + Duration::seconds(42)));
    }

    #[test]
    fn test_customer_info_merge_is_idempotent() {
        let now = Utc::now();
        let mut session = CallSession::new("c1", now);

        session.merge_customer_info(info(&[("name", json!("Ada"))]));
        session.merge_customer_info(info(&[("name", json!("Ada"))]));

        assert_eq!(session.customer_info().len(), 1);
        assert_eq!(session.customer_info()["name"], json!("Ada"));
    }

    #[test]
    fn test_customer_info_merge_extends_and_overwrites() {
        let now = Utc::now();
        let mut session = CallSession::new("c1", now);

        session.merge_customer_info(info(&[("name", json!("Ada")), ("city", json!("NYC"))]));
        session.merge_customer_info(info(&[("city", json!("LAX"))]));

        assert_eq!(session.customer_info().len(), 2);
        assert_eq!(session.customer_info()["name"], json!("Ada"));
        assert_eq!(session.customer_info()["city"], json!("LAX"));
    }

    #[test]
    fn test_booking_details_merge() {
        let now = Utc::now();
        let mut session = CallSession::new("c1", now);

        session.merge_booking_details(info(&[("hotel", json!("Hilton"))]));
        session.merge_booking_details(info(&[("nights", json!(3))]));

        assert_eq!(session.booking_details().len(), 2);
    }

    #[test]
    fn test_recent_tool_records_window() {
        let now = Utc::now();
        let mut session = CallSession::new("c1", now);

        for i in 0..5 {
            session.record_tool(format!("tool{i}"), json!({ "i": i }), now);
        }

        let recent = session.recent_tool_records();
        assert_eq!(recent.len(), TOOL_MEMORY_WINDOW);
        assert_eq!(recent[0].tool, "tool2");
        assert_eq!(recent[2].tool, "tool4");
    }

    #[test]
    fn test_elapsed_secs() {
        let start = Utc::now();
        let session = CallSession::new("c1", start);

        assert_eq!(session.elapsed_secs(start + Duration::seconds(17)), 17);
    }
}
